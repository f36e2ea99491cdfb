pub mod cleaner;
pub mod http_client;
pub mod parsers;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cache::PlayerCache;
use crate::config::AppConfig;
use crate::error::{ParseError, ScrapeError};
use crate::metrics::ScrapeMetrics;
use crate::models::PlayerRecord;

use self::http_client::HttpClient;

/// Longest username the ratings site accepts.
pub const MAX_USERNAME_LEN: usize = 32;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable player-data source abstraction.
#[async_trait]
pub trait PlayerDataSource: Send + Sync {
    async fn get_player_data(&self, username: &str) -> Option<Arc<PlayerRecord>>;
}

// ── Ratings-site scraper ──────────────────────────────────────────────────────

pub struct RatingsScraper {
    client: HttpClient,
    base_url: String,
    cache: PlayerCache,
    metrics: Arc<ScrapeMetrics>,
}

impl RatingsScraper {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(&config.scraper).context("Failed to build scraper")?,
            base_url: config.scraper.base_url.trim_end_matches('/').to_string(),
            cache: PlayerCache::new(&config.cache),
            metrics: Arc::new(ScrapeMetrics::default()),
        })
    }

    /// URL for a player's profile page.
    fn profile_url(&self, username: &str) -> String {
        format!("{}/user/{}", self.base_url, username)
    }

    /// Look up one player. Returns `None` for invalid input, unknown
    /// players, and any upstream failure alike; the distinctions live in
    /// the logs and counters, not the return type.
    pub async fn get_player_data(&self, username: &str) -> Option<Arc<PlayerRecord>> {
        let name = match validate_username(username) {
            Some(name) => name,
            None => {
                debug!(input = username, "rejected username without fetching");
                return None;
            }
        };
        let key = lookup_key(name);

        if let Some(hit) = self.cache.get(&key).await {
            self.metrics.record_cache_hit();
            debug!(player = %key, "cache hit");
            return Some(hit);
        }

        let ran_fetch = AtomicBool::new(false);
        let result = self
            .cache
            .get_or_fetch(&key, async {
                ran_fetch.store(true, Ordering::Relaxed);
                self.fetch_profile(name).await.map(Arc::new)
            })
            .await;

        match result {
            Ok(record) => {
                if !ran_fetch.load(Ordering::Relaxed) {
                    // Joined a fetch some concurrent lookup already started.
                    self.metrics.record_dedup_join();
                }
                Some(record)
            }
            Err(err) => {
                self.log_failure(&key, &err);
                None
            }
        }
    }

    async fn fetch_profile(&self, username: &str) -> Result<PlayerRecord, ScrapeError> {
        self.metrics.record_fetch_attempt();
        let url = self.profile_url(username);
        debug!(%url, "fetching profile page");

        let html = self.client.get_text(&url).await?;
        Ok(profile_from_html(username, &html)?)
    }

    fn log_failure(&self, key: &str, err: &ScrapeError) {
        match err {
            ScrapeError::Parse(ParseError::NotFound) => {
                self.metrics.record_not_found();
                info!(player = %key, "player not found");
            }
            ScrapeError::Parse(parse_err) => {
                self.metrics.record_parse_failure();
                warn!(player = %key, error = %parse_err, "profile page did not parse");
            }
            ScrapeError::Fetch(fetch_err) => {
                self.metrics.record_fetch_error();
                warn!(player = %key, error = %fetch_err, "fetch failed");
            }
        }
    }

    /// Reachability probe against the site root.
    pub async fn website_status(&self) -> WebsiteStatus {
        let started = Instant::now();
        match self.client.get_status(&self.base_url).await {
            Ok(code) if (200..300).contains(&code) => WebsiteStatus::Online {
                latency: started.elapsed(),
            },
            Ok(code) => WebsiteStatus::Degraded { status: code },
            Err(_) => WebsiteStatus::Offline,
        }
    }

    pub fn metrics(&self) -> Arc<ScrapeMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Release lookup state. The pooled connection goes down with the
    /// client on drop; safe to call whether or not any request was made.
    pub async fn close(&self) {
        self.cache.clear();
        info!("scraper shut down");
    }
}

#[async_trait]
impl PlayerDataSource for RatingsScraper {
    async fn get_player_data(&self, username: &str) -> Option<Arc<PlayerRecord>> {
        RatingsScraper::get_player_data(self, username).await
    }
}

// ── Pure helpers ──────────────────────────────────────────────────────────────

/// Trimmed username if it is worth a network request: non-empty, bounded
/// length, and site-legal characters only.
pub fn validate_username(raw: &str) -> Option<&str> {
    let name = raw.trim();
    if name.is_empty() || name.len() > MAX_USERNAME_LEN {
        return None;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .then_some(name)
}

/// Lookups are case-insensitive upstream; the cache key folds case so
/// "Alpha" and "ALPHA" share one entry.
pub(crate) fn lookup_key(name: &str) -> String {
    name.to_lowercase()
}

/// Parse a fetched profile page into a record. The site may spell the
/// username with different casing than the query; its spelling wins, with
/// the query as fallback when the header is missing.
pub fn profile_from_html(username: &str, html: &str) -> Result<PlayerRecord, ParseError> {
    let raw = parsers::extract(html)?;
    let mut record = cleaner::build_record(raw, Utc::now().naive_utc());
    if record.username.is_empty() {
        record.username = username.to_string();
    }
    Ok(record)
}

// ── Status ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebsiteStatus {
    Online { latency: Duration },
    Degraded { status: u16 },
    Offline,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rank;

    #[test]
    fn username_validation() {
        assert_eq!(validate_username("  Alpha  "), Some("Alpha"));
        assert_eq!(validate_username("a_b-c.d"), Some("a_b-c.d"));
        assert_eq!(validate_username(""), None);
        assert_eq!(validate_username("   "), None);
        assert_eq!(validate_username("has space"), None);
        assert_eq!(validate_username("ха-рошо"), None);
        assert_eq!(validate_username(&"x".repeat(MAX_USERNAME_LEN + 1)), None);
    }

    #[test]
    fn lookup_keys_fold_case() {
        assert_eq!(lookup_key("Alpha"), lookup_key("ALPHA"));
        assert_eq!(lookup_key("Alpha"), "alpha");
    }

    #[tokio::test]
    async fn invalid_usernames_never_reach_the_network() {
        let scraper = RatingsScraper::new(&AppConfig::default()).unwrap();

        assert!(scraper.get_player_data("").await.is_none());
        assert!(scraper.get_player_data("   ").await.is_none());
        assert!(scraper.get_player_data("bad name!").await.is_none());
        assert!(
            scraper
                .get_player_data(&"y".repeat(MAX_USERNAME_LEN + 1))
                .await
                .is_none()
        );

        assert_eq!(scraper.metrics().fetch_attempts(), 0);
    }

    #[tokio::test]
    async fn close_is_safe_without_any_request() {
        let scraper = RatingsScraper::new(&AppConfig::default()).unwrap();
        scraper.close().await;
        scraper.close().await;
    }

    #[test]
    fn profile_url_shape() {
        let scraper = RatingsScraper::new(&AppConfig::default()).unwrap();
        assert!(scraper.profile_url("Alpha").ends_with("/user/Alpha"));
    }

    #[test]
    fn fixture_round_trip_matches_known_player() {
        let record = profile_from_html("alpha", parsers::tests::ALPHA_PROFILE).unwrap();

        assert_eq!(record.username, "Alpha"); // site casing wins
        assert_eq!(record.rank, Rank::Sergeant);
        assert_eq!(record.experience, 105_613);
        assert_eq!(record.max_experience, Some(125_000));
        assert_eq!(record.kills, 500);
        assert_eq!(record.deaths, 250);
        assert_eq!(record.kd_display(), "2.00");
        assert!(record.premium);
        assert_eq!(record.gold_boxes, 12);
        assert_eq!(record.group, "Night Watch");
        assert_eq!(record.equipment.turrets, vec!["Smoky M2", "Twins"]);
        assert_eq!(record.equipment.hulls, vec!["Hornet"]);
        assert!(record.is_online);
    }

    #[test]
    fn not_found_classifies_as_parse_outcome() {
        let page = r#"<html><body>Player not found</body></html>"#;
        assert_eq!(
            profile_from_html("ghost", page).unwrap_err(),
            ParseError::NotFound
        );
    }

    #[test]
    fn query_name_fills_in_when_header_is_missing() {
        let page = r#"<div class="profile"><table>
            <tr><td>Kills</td><td>1</td></tr></table></div>"#;
        let record = profile_from_html("Fallback", page).unwrap();
        assert_eq!(record.username, "Fallback");
    }
}
