use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Rank ──────────────────────────────────────────────────────────────────────

/// In-game ranks in ladder order, lowest first. `Unknown` sits below the
/// ladder so comparisons against unrecognized ranks stay well-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Unknown,
    Recruit,
    Private,
    Gefreiter,
    Corporal,
    MasterCorporal,
    Sergeant,
    StaffSergeant,
    MasterSergeant,
    FirstSergeant,
    SergeantMajor,
    WarrantOfficer1,
    WarrantOfficer2,
    WarrantOfficer3,
    WarrantOfficer4,
    WarrantOfficer5,
    ThirdLieutenant,
    SecondLieutenant,
    FirstLieutenant,
    Captain,
    Major,
    LieutenantColonel,
    Colonel,
    Brigadier,
    MajorGeneral,
    LieutenantGeneral,
    General,
    Marshal,
    FieldMarshal,
    Commander,
    Generalissimo,
    Legend,
}

impl Rank {
    /// Every rank the ratings site can show, in ascending order.
    pub const LADDER: [Rank; 31] = [
        Rank::Recruit,
        Rank::Private,
        Rank::Gefreiter,
        Rank::Corporal,
        Rank::MasterCorporal,
        Rank::Sergeant,
        Rank::StaffSergeant,
        Rank::MasterSergeant,
        Rank::FirstSergeant,
        Rank::SergeantMajor,
        Rank::WarrantOfficer1,
        Rank::WarrantOfficer2,
        Rank::WarrantOfficer3,
        Rank::WarrantOfficer4,
        Rank::WarrantOfficer5,
        Rank::ThirdLieutenant,
        Rank::SecondLieutenant,
        Rank::FirstLieutenant,
        Rank::Captain,
        Rank::Major,
        Rank::LieutenantColonel,
        Rank::Colonel,
        Rank::Brigadier,
        Rank::MajorGeneral,
        Rank::LieutenantGeneral,
        Rank::General,
        Rank::Marshal,
        Rank::FieldMarshal,
        Rank::Commander,
        Rank::Generalissimo,
        Rank::Legend,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rank::Unknown => "Unknown",
            Rank::Recruit => "Recruit",
            Rank::Private => "Private",
            Rank::Gefreiter => "Gefreiter",
            Rank::Corporal => "Corporal",
            Rank::MasterCorporal => "Master Corporal",
            Rank::Sergeant => "Sergeant",
            Rank::StaffSergeant => "Staff Sergeant",
            Rank::MasterSergeant => "Master Sergeant",
            Rank::FirstSergeant => "First Sergeant",
            Rank::SergeantMajor => "Sergeant-Major",
            Rank::WarrantOfficer1 => "Warrant Officer 1",
            Rank::WarrantOfficer2 => "Warrant Officer 2",
            Rank::WarrantOfficer3 => "Warrant Officer 3",
            Rank::WarrantOfficer4 => "Warrant Officer 4",
            Rank::WarrantOfficer5 => "Warrant Officer 5",
            Rank::ThirdLieutenant => "Third Lieutenant",
            Rank::SecondLieutenant => "Second Lieutenant",
            Rank::FirstLieutenant => "First Lieutenant",
            Rank::Captain => "Captain",
            Rank::Major => "Major",
            Rank::LieutenantColonel => "Lieutenant Colonel",
            Rank::Colonel => "Colonel",
            Rank::Brigadier => "Brigadier",
            Rank::MajorGeneral => "Major General",
            Rank::LieutenantGeneral => "Lieutenant General",
            Rank::General => "General",
            Rank::Marshal => "Marshal",
            Rank::FieldMarshal => "Field Marshal",
            Rank::Commander => "Commander",
            Rank::Generalissimo => "Generalissimo",
            Rank::Legend => "Legend",
        }
    }

    /// Case-insensitive match against the ladder. Anything the site renders
    /// that we don't recognize maps to `Unknown` instead of failing.
    pub fn from_name(name: &str) -> Rank {
        let needle = name.trim();
        Self::LADDER
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(needle))
            .unwrap_or(Rank::Unknown)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Equipment ─────────────────────────────────────────────────────────────────

/// Turret and hull lists in the order the site shows them. Entries carry the
/// site's own annotation, e.g. "Smoky M2".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub turrets: Vec<String>,
    pub hulls: Vec<String>,
}

impl Equipment {
    pub fn is_empty(&self) -> bool {
        self.turrets.is_empty() && self.hulls.is_empty()
    }

    /// Highest modification tier (the trailing "M0".."M3" marker) across all
    /// entries, if any entry carries one.
    pub fn best_modification(&self) -> Option<u8> {
        self.turrets
            .iter()
            .chain(self.hulls.iter())
            .filter_map(|entry| modification_tier(entry))
            .max()
    }
}

/// Modification tier from a trailing "M0".."M3" token, e.g. "Smoky M2" → 2.
pub fn modification_tier(entry: &str) -> Option<u8> {
    let last = entry.trim().rsplit(' ').next()?;
    let tier = last.strip_prefix('M')?.parse::<u8>().ok()?;
    (tier <= 3).then_some(tier)
}

// ── Player record ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub username: String,
    pub rank: Rank,
    pub experience: u64,
    /// Next-rank threshold; absent for players at the top of the ladder.
    pub max_experience: Option<u64>,
    pub kills: u64,
    pub deaths: u64,
    /// Rounded to two decimals, the precision the site itself reports.
    pub kd_ratio: f64,
    pub premium: bool,
    pub gold_boxes: u64,
    pub group: String,
    pub equipment: Equipment,
    pub is_online: bool,
    pub fetched_at: NaiveDateTime,
}

impl PlayerRecord {
    /// K/D as the two-decimal display string.
    pub fn kd_display(&self) -> String {
        format!("{:.2}", self.kd_ratio)
    }
}

// ── Raw scrape ────────────────────────────────────────────────────────────────

/// Field texts exactly as pulled off the profile page, before normalization.
/// Missing fields stay `None` and normalize to defaults downstream.
#[derive(Debug, Clone, Default)]
pub struct RawProfile {
    pub username: Option<String>,
    pub rank_name: Option<String>,
    pub experience: Option<String>,
    pub kills: Option<String>,
    pub deaths: Option<String>,
    pub kd: Option<String>,
    pub gold_boxes: Option<String>,
    pub group: Option<String>,
    pub premium: bool,
    pub online: bool,
    pub turrets: Vec<String>,
    pub hulls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_from_name_is_case_insensitive() {
        assert_eq!(Rank::from_name("sergeant"), Rank::Sergeant);
        assert_eq!(Rank::from_name("  GENERALISSIMO "), Rank::Generalissimo);
        assert_eq!(Rank::from_name("Warrant officer 3"), Rank::WarrantOfficer3);
    }

    #[test]
    fn unrecognized_rank_maps_to_unknown() {
        assert_eq!(Rank::from_name("Space Cadet"), Rank::Unknown);
        assert_eq!(Rank::from_name(""), Rank::Unknown);
    }

    #[test]
    fn ladder_is_ordered() {
        assert!(Rank::Recruit < Rank::Sergeant);
        assert!(Rank::Generalissimo < Rank::Legend);
        // The sentinel sorts below every real rank.
        assert!(Rank::Unknown < Rank::Recruit);
        for pair in Rank::LADDER.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn modification_tiers() {
        assert_eq!(modification_tier("Smoky M2"), Some(2));
        assert_eq!(modification_tier("Twins M0"), Some(0));
        assert_eq!(modification_tier("Hornet"), None);
        assert_eq!(modification_tier("Mammoth M9"), None);
    }

    #[test]
    fn best_modification_spans_both_lists() {
        let eq = Equipment {
            turrets: vec!["Smoky M1".into(), "Twins".into()],
            hulls: vec!["Hornet M3".into()],
        };
        assert_eq!(eq.best_modification(), Some(3));
        assert!(Equipment::default().best_modification().is_none());
        assert!(Equipment::default().is_empty());
    }
}
