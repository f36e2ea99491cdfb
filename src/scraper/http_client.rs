use anyhow::{Context, Result};
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::FetchError;

pub struct HttpClient {
    inner: reqwest::Client,
    config: ScraperConfig,
    pacer: Pacer,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            pacer: Pacer::new(config.min_request_interval_ms, config.jitter_ms),
            config: config.clone(),
        })
    }

    /// Fetch a URL as text, retrying transient failures with backoff.
    /// Every attempt, retries included, goes through the pacer.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let strategy = ExponentialBackoff::from_millis(50)
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(self.config.max_retries as usize);

        RetryIf::spawn(strategy, || self.fetch_once(url), FetchError::is_retryable).await
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        self.pacer.wait_turn().await;
        debug!(%url, "GET");

        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%url, %status, "non-success response");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        resp.text().await.map_err(FetchError::from_reqwest)
    }

    /// Single unretried probe; returns the bare status code.
    pub async fn get_status(&self, url: &str) -> Result<u16, FetchError> {
        self.pacer.wait_turn().await;
        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        Ok(resp.status().as_u16())
    }
}

// ── Pacer ─────────────────────────────────────────────────────────────────────

/// Minimum spacing between outbound requests, shared by every lookup in the
/// process. Claiming a slot and advancing the schedule happen under one
/// lock, so two requests can never take the same slot.
pub(crate) struct Pacer {
    min_interval: Duration,
    jitter_ms: u64,
    next_slot: Mutex<Instant>,
}

impl Pacer {
    pub(crate) fn new(min_interval_ms: u64, jitter_ms: u64) -> Self {
        Self {
            min_interval: Duration::from_millis(min_interval_ms),
            jitter_ms,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    pub(crate) async fn wait_turn(&self) {
        let wait = {
            let mut slot = self.next_slot.lock().await;
            let now = Instant::now();
            let start = if *slot > now { *slot } else { now };
            let jitter = Duration::from_millis(rand::rng().random_range(0..=self.jitter_ms));
            *slot = start + self.min_interval + jitter;
            start.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn pacer_spaces_consecutive_turns() {
        let pacer = Pacer::new(50, 0);
        let started = Instant::now();

        pacer.wait_turn().await; // first turn is immediate
        pacer.wait_turn().await;
        pacer.wait_turn().await;

        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn concurrent_turns_never_share_a_slot() {
        let pacer = Pacer::new(40, 0);
        let started = Instant::now();

        tokio::join!(pacer.wait_turn(), pacer.wait_turn(), pacer.wait_turn());

        // Three turns: 0ms, 40ms, 80ms at the earliest.
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn client_builds_from_default_config() {
        let client = HttpClient::new(&ScraperConfig::default());
        assert_ok!(client);
    }
}
