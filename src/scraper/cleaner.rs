use chrono::NaiveDateTime;

use crate::models::{Equipment, PlayerRecord, Rank, RawProfile};

// ── Parsers ───────────────────────────────────────────────────────────────────

/// Digits-only integer parse: thousands separators and stray punctuation
/// are dropped. "105 613" → 105613 | "1,234" → 1234 | "—" → 0
pub fn parse_count(s: &str) -> u64 {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Experience cells read "current / next-rank threshold" below the top rank
/// and a bare number at the top.
pub fn parse_experience(s: &str) -> (u64, Option<u64>) {
    match s.split_once('/') {
        Some((current, threshold)) => {
            let threshold = parse_count(threshold);
            (parse_count(current), (threshold > 0).then_some(threshold))
        }
        None => (parse_count(s), None),
    }
}

/// Site-reported ratio. The site uses a comma decimal separator on some
/// locales. Negative or non-finite values are treated as absent.
pub fn parse_ratio(s: &str) -> Option<f64> {
    let s = s.trim().replace(',', ".");
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// K/D: the page's own ratio wins when present; otherwise kills over
/// deaths, with zero deaths divided as one so the kill count still shows.
pub fn kd_ratio(reported: Option<&str>, kills: u64, deaths: u64) -> f64 {
    if let Some(v) = reported.and_then(parse_ratio) {
        return round2(v);
    }
    round2(kills as f64 / deaths.max(1) as f64)
}

// ── Raw profile → record ──────────────────────────────────────────────────────

pub fn build_record(raw: RawProfile, fetched_at: NaiveDateTime) -> PlayerRecord {
    let (experience, max_experience) = raw
        .experience
        .as_deref()
        .map(parse_experience)
        .unwrap_or((0, None));

    let kills = raw.kills.as_deref().map(parse_count).unwrap_or(0);
    let deaths = raw.deaths.as_deref().map(parse_count).unwrap_or(0);

    PlayerRecord {
        username: raw.username.unwrap_or_default(),
        rank: raw
            .rank_name
            .as_deref()
            .map(Rank::from_name)
            .unwrap_or(Rank::Unknown),
        experience,
        max_experience,
        kills,
        deaths,
        kd_ratio: kd_ratio(raw.kd.as_deref(), kills, deaths),
        premium: raw.premium,
        gold_boxes: raw.gold_boxes.as_deref().map(parse_count).unwrap_or(0),
        group: raw.group.unwrap_or_default(),
        equipment: Equipment {
            turrets: raw.turrets,
            hulls: raw.hulls,
        },
        is_online: raw.online,
        fetched_at,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
