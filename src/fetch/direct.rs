//! Direct HTTP backend
//!
//! URLs are spread over C lanes by index (`i % C`). Each lane owns its own
//! reqwest client and throttle and works through its queue sequentially;
//! lanes run concurrently.

use crate::fetch::{ClientSettings, FetchClient, FetchError, FetchRequest, FetchResult, Throttle};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;

/// Fetch client issuing plain HTTP GET requests
#[derive(Debug)]
pub struct DirectClient {
    lanes: Vec<Lane>,
    settings: ClientSettings,
}

#[derive(Debug)]
struct Lane {
    id: usize,
    client: Client,
    throttle: Throttle,
}

impl DirectClient {
    /// Builds one HTTP client and throttle per lane
    ///
    /// # Returns
    ///
    /// * `Ok(DirectClient)` - Client ready to fetch
    /// * `Err(FetchError::Launch)` - An HTTP client could not be built
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let lanes = (0..settings.concurrency.max(1))
            .map(|id| -> Result<Lane, FetchError> {
                Ok(Lane {
                    id,
                    client: build_http_client(&settings)?,
                    throttle: Throttle::new(settings.delay_between_requests),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { lanes, settings })
    }
}

/// Builds an HTTP client with the configured timeout
///
/// The user agent is sent per request so the `before_request` hook can
/// change it.
fn build_http_client(settings: &ClientSettings) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(settings.timeout)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| FetchError::Launch(e.to_string()))
}

/// Splits `count` input positions over `lanes` lanes by `i % lanes`
fn lane_assignments(count: usize, lanes: usize) -> Vec<Vec<usize>> {
    let lanes = lanes.max(1);
    let mut assignments = vec![Vec::new(); lanes];
    for i in 0..count {
        assignments[i % lanes].push(i);
    }
    assignments
}

impl Lane {
    /// Fetches one URL with retries, always yielding a result
    async fn fetch(&self, url: &str, settings: &ClientSettings) -> FetchResult {
        let outcome = settings
            .retry
            .run(url, |attempt| async move {
                let request = settings.prepare_request(url);
                self.throttle.wait().await;
                tracing::debug!(lane = self.id, attempt, "GET {}", request.url);
                self.send(request).await
            })
            .await;

        match outcome {
            Ok((status, body)) => FetchResult::succeeded(url, status, body),
            Err(_) => FetchResult::failed(url),
        }
    }

    async fn send(&self, request: FetchRequest) -> Result<(u16, String), FetchError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl FetchClient for DirectClient {
    async fn initialize(&self) -> Result<(), FetchError> {
        tracing::debug!("Direct client ready with {} lanes", self.lanes.len());
        Ok(())
    }

    async fn get(&self, urls: &[String]) -> Vec<FetchResult> {
        let settings = &self.settings;
        let work = lane_assignments(urls.len(), self.lanes.len())
            .into_iter()
            .zip(&self.lanes)
            .map(|(positions, lane)| async move {
                let mut results = Vec::with_capacity(positions.len());
                for i in positions {
                    results.push((i, lane.fetch(&urls[i], settings).await));
                }
                results
            });

        let mut slots: Vec<Option<FetchResult>> = (0..urls.len()).map(|_| None).collect();
        for (i, result) in join_all(work).await.into_iter().flatten() {
            slots[i] = Some(result);
        }

        slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| slot.unwrap_or_else(|| FetchResult::failed(url.as_str())))
            .collect()
    }

    async fn shutdown(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
