//! Integration tests for the direct fetch client
//!
//! A wiremock server stands in for the target site.

use std::sync::Arc;
use std::time::{Duration, Instant};
use sumi_harvest::config::ClientConfig;
use sumi_harvest::fetch::{ClientSettings, DirectClient, FetchRequest, RequestHook};
use sumi_harvest::FetchClient;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_config(concurrency: usize, retries: u32) -> ClientConfig {
    ClientConfig {
        concurrent_requests: concurrency,
        retries,
        retry_delay: 0.0,
        delay_between_requests: 0.0,
        timeout_seconds: 5,
        user_agent: "HarvestTest/1.0".to_string(),
        ..ClientConfig::default()
    }
}

fn client(config: &ClientConfig, hook: Option<RequestHook>) -> DirectClient {
    DirectClient::new(ClientSettings::from_config(config, hook)).unwrap()
}

#[tokio::test]
async fn test_retries_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&client_config(1, 2), None);
    client.initialize().await.unwrap();
    let url = format!("{}/flaky", server.uri());
    let results = client.get(&[url.clone()]).await;
    client.shutdown().await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].url, url);
    let page = results[0].page.as_ref().unwrap();
    assert_eq!(page.status, 200);
    assert_eq!(page.body, "finally");
}

#[tokio::test]
async fn test_gives_up_after_all_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&client_config(1, 2), None);
    let url = format!("{}/down", server.uri());
    let results = client.get(&[url.clone()]).await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert!(results[0].page.is_none());
    assert_eq!(results[0].url, url);
}

#[tokio::test]
async fn test_results_follow_input_order() {
    let server = MockServer::start().await;

    for i in 0..7 {
        Mock::given(method("GET"))
            .and(path(format!("/page/{}", i)))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("page {}", i)))
            .mount(&server)
            .await;
    }

    let urls: Vec<String> = (0..7)
        .map(|i| format!("{}/page/{}", server.uri(), i))
        .collect();
    let mut with_missing = urls.clone();
    with_missing.push(format!("{}/missing", server.uri()));

    let client = client(&client_config(3, 0), None);
    let results = client.get(&with_missing).await;

    assert_eq!(results.len(), 8);
    for (i, result) in results.iter().take(7).enumerate() {
        assert_eq!(result.url, urls[i]);
        assert_eq!(result.page.as_ref().unwrap().body, format!("page {}", i));
    }
    assert!(!results[7].success);
}

#[tokio::test]
async fn test_empty_batch() {
    let client = client(&client_config(2, 0), None);
    assert!(client.get(&[]).await.is_empty());
}

#[tokio::test]
async fn test_sends_configured_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", "HarvestTest/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&client_config(1, 0), None);
    let results = client.get(&[format!("{}/ua", server.uri())]).await;
    assert!(results[0].success);
}

#[tokio::test]
async fn test_before_request_hook_rewrites_each_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rewritten"))
        .and(header("x-token", "secret"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rewritten"))
        .and(header("x-token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("rewritten"))
        .expect(1)
        .mount(&server)
        .await;

    let hook: RequestHook = Arc::new(|mut request: FetchRequest| {
        request.url = request.url.replace("/original", "/rewritten");
        request
            .headers
            .insert("X-Token".to_string(), "secret".to_string());
        request
    });

    let client = client(&client_config(1, 1), Some(hook));
    let url = format!("{}/original", server.uri());
    let results = client.get(&[url.clone()]).await;

    // The result is keyed by the requested URL, not the rewritten one
    assert!(results[0].success);
    assert_eq!(results[0].url, url);
    assert_eq!(results[0].page.as_ref().unwrap().body, "rewritten");

    let hits = server.received_requests().await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|r| r.url.path() == "/rewritten"));
}

async fn mount_slow_pages(server: &MockServer, count: usize, delay: Duration) -> Vec<String> {
    for i in 0..count {
        Mock::given(method("GET"))
            .and(path(format!("/slow/{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(delay),
            )
            .expect(1)
            .mount(server)
            .await;
    }
    (0..count)
        .map(|i| format!("{}/slow/{}", server.uri(), i))
        .collect()
}

#[tokio::test]
async fn test_at_most_concurrency_requests_in_flight() {
    let server = MockServer::start().await;
    let urls = mount_slow_pages(&server, 4, Duration::from_millis(300)).await;

    let client = client(&client_config(2, 0), None);
    let started = Instant::now();
    let results = client.get(&urls).await;
    let elapsed = started.elapsed();

    assert!(results.iter().all(|r| r.success));
    // Two lanes of two slow pages each: never all four at once, never serial
    assert!(elapsed >= Duration::from_millis(580), "took {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1100), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_lane_spaces_successive_requests() {
    let server = MockServer::start().await;
    let urls = mount_slow_pages(&server, 2, Duration::ZERO).await;

    let mut config = client_config(1, 0);
    config.delay_between_requests = 0.4;
    let client = client(&config, None);

    let started = Instant::now();
    let results = client.get(&urls).await;
    let elapsed = started.elapsed();

    assert!(results.iter().all(|r| r.success));
    assert!(elapsed >= Duration::from_millis(400), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_separate_lanes_are_not_throttled_together() {
    let server = MockServer::start().await;
    let urls = mount_slow_pages(&server, 2, Duration::ZERO).await;

    let mut config = client_config(2, 0);
    config.delay_between_requests = 2.0;
    let client = client(&config, None);

    let started = Instant::now();
    let results = client.get(&urls).await;

    assert!(results.iter().all(|r| r.success));
    assert!(started.elapsed() < Duration::from_secs(1));
}
