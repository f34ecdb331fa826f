use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces out successive requests on one lane
///
/// Each call to [`Throttle::wait`] reserves the next start slot under a short
/// lock and sleeps outside it, so callers on other lanes never block.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits until this lane may start its next request
    pub async fn wait(&self) {
        let start = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let start = match *next_slot {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next_slot = Some(start + self.interval);
            start
        };

        tokio::time::sleep_until(start).await;
    }
}
