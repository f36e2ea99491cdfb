//! Player statistics scraping for an online tank game's public ratings site.
//!
//! Given a username, the crate fetches the player's profile page, parses it
//! into a typed [`models::PlayerRecord`], and returns it — or `None` when
//! the player does not exist or the site is unreachable. Lookups for the
//! same player coalesce into one upstream request, results are cached for a
//! short TTL, and all outbound traffic is paced so bursts of commands do
//! not hammer the site.
//!
//! The entry point is [`scraper::RatingsScraper`]; the binary target is a
//! thin CLI consumer over it.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scraper;
pub mod utils;

pub use crate::error::{FetchError, ParseError, ScrapeError};
pub use crate::models::{Equipment, PlayerRecord, Rank};
pub use crate::scraper::{PlayerDataSource, RatingsScraper, WebsiteStatus};
