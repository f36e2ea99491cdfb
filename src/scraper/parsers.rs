use scraper::{ElementRef, Html, Selector};

use crate::error::ParseError;
use crate::models::RawProfile;

// ── Page-level markers ────────────────────────────────────────────────────────

/// Text the ratings site renders instead of a profile when the username does
/// not exist. The site answers these with HTTP 200, so the body is the only
/// signal.
const NOT_FOUND_MARKERS: &[&str] = &["Player not found", "User not found", "Игрок не найден"];

/// Candidate selectors for the profile container, most specific first. The
/// upstream layout is not contractually stable; these are best-effort.
const PROFILE_CONTAINERS: &[&str] = &["div.profile", "div.user-profile", "#profile"];

// ── Field extraction rules ────────────────────────────────────────────────────
//
// Stats are label/value rows; each field is "first row whose label mentions
// one of these aliases". Adding or dropping a tolerated field is an edit
// here, not new control flow.

const EXPERIENCE_LABELS: &[&str] = &["experience", "опыт"];
const KILLS_LABELS: &[&str] = &["kills", "destroyed", "уничтожил"];
const DEATHS_LABELS: &[&str] = &["deaths", "подбит"];
const KD_LABELS: &[&str] = &["k/d", "kd", "у/п"];
const GOLD_BOX_LABELS: &[&str] = &["gold", "золот"];
const GROUP_LABELS: &[&str] = &["group", "clan", "группа"];

const PREMIUM_MARKERS: &[&str] = &["span.premium-icon", ".premium-badge"];
const TURRET_SELECTORS: &[&str] = &["ul.turrets li", ".equipment .turrets li"];
const HULL_SELECTORS: &[&str] = &["ul.hulls li", ".equipment .hulls li"];

// ── Entry point ───────────────────────────────────────────────────────────────

/// Pull the raw field set out of a profile page.
///
/// Extraction is best-effort per field: a missing stat leaves its slot
/// `None` and never fails the parse. Errors mean the page as a whole is not
/// a profile — either the site's "no such player" page (`NotFound`) or
/// something unrecognizable (`UnrecognizedPage`).
pub fn extract(html: &str) -> Result<RawProfile, ParseError> {
    if NOT_FOUND_MARKERS.iter().any(|m| html.contains(m)) {
        return Err(ParseError::NotFound);
    }

    let doc = Html::parse_document(html);
    let root = find_profile_root(&doc).ok_or(ParseError::UnrecognizedPage)?;

    let stats = stat_rows(&root);

    Ok(RawProfile {
        username: header_username(&root),
        rank_name: rank_name(&root),
        experience: stat_value(&stats, EXPERIENCE_LABELS),
        kills: stat_value(&stats, KILLS_LABELS),
        deaths: stat_value(&stats, DEATHS_LABELS),
        kd: stat_value(&stats, KD_LABELS),
        gold_boxes: stat_value(&stats, GOLD_BOX_LABELS),
        group: stat_value(&stats, GROUP_LABELS),
        premium: has_any(&root, PREMIUM_MARKERS),
        online: is_online(&root),
        turrets: equipment_entries(&root, TURRET_SELECTORS),
        hulls: equipment_entries(&root, HULL_SELECTORS),
    })
}

// ── Section locators ──────────────────────────────────────────────────────────

fn find_profile_root<'a>(doc: &'a Html) -> Option<ElementRef<'a>> {
    for sel_str in PROFILE_CONTAINERS {
        let Ok(sel) = Selector::parse(sel_str) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next() {
            return Some(el);
        }
    }
    None
}

/// Display name from the profile header. The header also carries icon and
/// status spans, so only the element's own text nodes count.
fn header_username(root: &ElementRef) -> Option<String> {
    for sel_str in &["h1.profile-header", "div.profile-header h1", "h1"] {
        let Ok(sel) = Selector::parse(sel_str) else {
            continue;
        };
        if let Some(el) = root.select(&sel).next() {
            let name = own_text(&el);
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}

/// Rank comes off the icon's title/alt attribute, with a text fallback for
/// layouts that spell it out.
fn rank_name(root: &ElementRef) -> Option<String> {
    for sel_str in &["span.rank-icon", "img.rank-icon", ".rank img"] {
        let Ok(sel) = Selector::parse(sel_str) else {
            continue;
        };
        if let Some(el) = root.select(&sel).next() {
            let name = el
                .value()
                .attr("title")
                .or_else(|| el.value().attr("alt"))
                .map(str::trim)
                .unwrap_or_default();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }

    let Ok(sel) = Selector::parse("span.rank-name, div.rank-name") else {
        return None;
    };
    root.select(&sel)
        .next()
        .map(|el| full_text(&el))
        .filter(|t| !t.is_empty())
}

fn is_online(root: &ElementRef) -> bool {
    if has_any(root, &["span.status.online", ".online-indicator"]) {
        return true;
    }
    let Ok(sel) = Selector::parse("span.status") else {
        return false;
    };
    root.select(&sel)
        .next()
        .map(|el| full_text(&el).eq_ignore_ascii_case("online"))
        .unwrap_or(false)
}

fn has_any(root: &ElementRef, selectors: &[&str]) -> bool {
    selectors.iter().any(|sel_str| {
        Selector::parse(sel_str)
            .map(|sel| root.select(&sel).next().is_some())
            .unwrap_or(false)
    })
}

// ── Stats table ───────────────────────────────────────────────────────────────

/// Label/value pairs from any two-cell rows under the profile container.
/// Row order on the page is irrelevant; fields are matched by label.
fn stat_rows(root: &ElementRef) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    let (Ok(tr_sel), Ok(cell_sel)) = (Selector::parse("tr"), Selector::parse("td, th")) else {
        return rows;
    };

    for tr in root.select(&tr_sel) {
        let cells: Vec<String> = tr.select(&cell_sel).map(|td| full_text(&td)).collect();
        if cells.len() >= 2 && !cells[0].is_empty() {
            rows.push((cells[0].to_lowercase(), cells[1].clone()));
        }
    }
    rows
}

fn stat_value(rows: &[(String, String)], aliases: &[&str]) -> Option<String> {
    rows.iter()
        .find(|(label, _)| aliases.iter().any(|a| label.contains(a)))
        .map(|(_, value)| value.clone())
        .filter(|v| !v.is_empty())
}

// ── Equipment ─────────────────────────────────────────────────────────────────

/// Equipment entries in site order. Tolerates zero, one, or many entries;
/// the first selector that yields anything wins.
fn equipment_entries(root: &ElementRef, selectors: &[&str]) -> Vec<String> {
    for sel_str in selectors {
        let Ok(sel) = Selector::parse(sel_str) else {
            continue;
        };
        let entries: Vec<String> = root
            .select(&sel)
            .map(|li| full_text(&li))
            .filter(|t| !t.is_empty())
            .collect();
        if !entries.is_empty() {
            return entries;
        }
    }
    Vec::new()
}

// ── Text helpers ──────────────────────────────────────────────────────────────

/// All text under an element, whitespace-normalized.
fn full_text(el: &ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text nodes belonging to the element itself, excluding child elements.
fn own_text(el: &ElementRef) -> String {
    el.children()
        .filter_map(|node| node.value().as_text())
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const ALPHA_PROFILE: &str = r#"
    <html><body>
      <div class="profile">
        <h1 class="profile-header">
          <span class="rank-icon" title="Sergeant"></span>
          Alpha
          <span class="premium-icon"></span>
          <span class="status">Online</span>
        </h1>
        <table class="summary">
          <tr><td>Experience</td><td>105 613 / 125 000</td></tr>
          <tr><td>Kills</td><td>500</td></tr>
          <tr><td>Deaths</td><td>250</td></tr>
          <tr><td>K/D</td><td>2.00</td></tr>
          <tr><td>Gold boxes caught</td><td>12</td></tr>
          <tr><td>Group</td><td>Night Watch</td></tr>
        </table>
        <div class="equipment">
          <ul class="turrets"><li>Smoky M2</li><li>Twins</li></ul>
          <ul class="hulls"><li>Hornet</li></ul>
        </div>
      </div>
    </body></html>
    "#;

    const NOT_FOUND_PAGE: &str = r#"
    <html><body><div class="error">Player not found</div></body></html>
    "#;

    #[test]
    fn extracts_all_fields_from_full_profile() {
        let raw = extract(ALPHA_PROFILE).unwrap();

        assert_eq!(raw.username.as_deref(), Some("Alpha"));
        assert_eq!(raw.rank_name.as_deref(), Some("Sergeant"));
        assert_eq!(raw.experience.as_deref(), Some("105 613 / 125 000"));
        assert_eq!(raw.kills.as_deref(), Some("500"));
        assert_eq!(raw.deaths.as_deref(), Some("250"));
        assert_eq!(raw.kd.as_deref(), Some("2.00"));
        assert_eq!(raw.gold_boxes.as_deref(), Some("12"));
        assert_eq!(raw.group.as_deref(), Some("Night Watch"));
        assert!(raw.premium);
        assert!(raw.online);
    }

    #[test]
    fn equipment_preserves_site_order() {
        let raw = extract(ALPHA_PROFILE).unwrap();
        assert_eq!(raw.turrets, vec!["Smoky M2", "Twins"]);
        assert_eq!(raw.hulls, vec!["Hornet"]);
    }

    #[test]
    fn not_found_marker_wins() {
        assert_eq!(extract(NOT_FOUND_PAGE).unwrap_err(), ParseError::NotFound);
    }

    #[test]
    fn unrecognizable_page_is_distinguished_from_not_found() {
        let err = extract("<html><body><p>maintenance</p></body></html>").unwrap_err();
        assert_eq!(err, ParseError::UnrecognizedPage);
    }

    #[test]
    fn missing_fields_degrade_to_none_not_errors() {
        let sparse = r#"
        <div class="profile">
          <h1 class="profile-header">Beta</h1>
          <table><tr><td>Kills</td><td>7</td></tr></table>
        </div>
        "#;
        let raw = extract(sparse).unwrap();
        assert_eq!(raw.username.as_deref(), Some("Beta"));
        assert_eq!(raw.kills.as_deref(), Some("7"));
        assert!(raw.rank_name.is_none());
        assert!(raw.experience.is_none());
        assert!(raw.deaths.is_none());
        assert!(!raw.premium);
        assert!(!raw.online);
        assert!(raw.turrets.is_empty());
        assert!(raw.hulls.is_empty());
    }

    #[test]
    fn offline_status_text() {
        let page = r#"
        <div class="profile">
          <h1 class="profile-header">Gamma <span class="status">Offline</span></h1>
        </div>
        "#;
        let raw = extract(page).unwrap();
        assert!(!raw.online);
    }

    #[test]
    fn stat_rows_tolerate_arbitrary_order_and_extras() {
        let page = r#"
        <div class="profile">
          <h1 class="profile-header">Delta</h1>
          <table>
            <tr><td>Group</td><td>Raiders</td></tr>
            <tr><td>Something new</td><td>whatever</td></tr>
            <tr><td>Deaths</td><td>3</td></tr>
            <tr><td>Kills</td><td>9</td></tr>
          </table>
        </div>
        "#;
        let raw = extract(page).unwrap();
        assert_eq!(raw.kills.as_deref(), Some("9"));
        assert_eq!(raw.deaths.as_deref(), Some("3"));
        assert_eq!(raw.group.as_deref(), Some("Raiders"));
    }
}
