//! Scrape observability counters.
//!
//! Owned by the facade instance rather than living as process globals, so
//! tests can assert against a private instance and embedders can export the
//! snapshot wherever they report stats.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ScrapeMetrics {
    fetch_attempts: AtomicU64,
    fetch_errors: AtomicU64,
    cache_hits: AtomicU64,
    dedup_joins: AtomicU64,
    parse_failures: AtomicU64,
    not_found: AtomicU64,
}

impl ScrapeMetrics {
    pub fn record_fetch_attempt(&self) {
        self.fetch_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dedup_join(&self) {
        self.dedup_joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_attempts(&self) -> u64 {
        self.fetch_attempts.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fetch_attempts: self.fetch_attempts.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            dedup_joins: self.dedup_joins.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub fetch_attempts: u64,
    pub fetch_errors: u64,
    pub cache_hits: u64,
    pub dedup_joins: u64,
    pub parse_failures: u64,
    pub not_found: u64,
}

impl MetricsSnapshot {
    /// Fraction of fetch attempts that neither errored nor failed to parse.
    /// Not-found lookups count as successes; the scrape itself worked.
    pub fn success_rate(&self) -> f64 {
        if self.fetch_attempts == 0 {
            return 0.0;
        }
        let failed = self.fetch_errors + self.parse_failures;
        (self.fetch_attempts.saturating_sub(failed)) as f64 / self.fetch_attempts as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = ScrapeMetrics::default();
        metrics.record_fetch_attempt();
        metrics.record_fetch_attempt();
        metrics.record_fetch_error();
        metrics.record_cache_hit();
        metrics.record_not_found();

        let snap = metrics.snapshot();
        assert_eq!(snap.fetch_attempts, 2);
        assert_eq!(snap.fetch_errors, 1);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.not_found, 1);
        assert_eq!(snap.dedup_joins, 0);
    }

    #[test]
    fn success_rate_bounds() {
        let metrics = ScrapeMetrics::default();
        assert_eq!(metrics.snapshot().success_rate(), 0.0);

        metrics.record_fetch_attempt();
        metrics.record_fetch_attempt();
        metrics.record_fetch_error();
        let rate = metrics.snapshot().success_rate();
        assert!((rate - 0.5).abs() < f64::EPSILON);
    }
}
