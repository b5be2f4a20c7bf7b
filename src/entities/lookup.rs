// 🗂️ Lookup Entities - leagues, seasons, divisions, teams
//
// Read-only to the import pipeline. Spreadsheets name divisions and teams in
// free text, so matching is trimmed and case-insensitive.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: i64,
    pub name: String,

    /// Association code written into the affinity export
    #[serde(default)]
    pub sid_code: Option<String>,

    #[serde(default)]
    pub current_season_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: i64,
    pub league_id: i64,
    pub name: String,

    /// TN Soccer's code for this season (the export's SeasonID column)
    #[serde(default)]
    pub tnsoccer_season_id: Option<String>,

    #[serde(default)]
    pub tnsoccer_season_name: Option<String>,

    #[serde(default)]
    pub tnsoccer_year: Option<i64>,
}

impl Season {
    /// Match on TN Soccer's season code.
    pub fn has_code(&self, code: &str) -> bool {
        self.tnsoccer_season_id
            .as_deref()
            .is_some_and(|own| names_match(own, code))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Division {
    pub id: i64,
    pub name: String,

    /// How MTSA spells this division in its exports
    #[serde(default)]
    pub mtsa_name: Option<String>,
}

impl Division {
    pub fn matches_mtsa_name(&self, wanted: &str) -> bool {
        self.mtsa_name
            .as_deref()
            .is_some_and(|own| names_match(own, wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

impl Team {
    pub fn matches_name(&self, wanted: &str) -> bool {
        names_match(&self.name, wanted)
    }
}

/// Trimmed, case-insensitive equality. Empty strings never match.
pub fn names_match(stored: &str, wanted: &str) -> bool {
    let stored = stored.trim();
    let wanted = wanted.trim();
    !stored.is_empty() && stored.to_lowercase() == wanted.to_lowercase()
}

/// The four lookup tables, as supplied by the association (e.g. a JSON file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupTables {
    #[serde(default)]
    pub leagues: Vec<League>,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub divisions: Vec<Division>,
    #[serde(default)]
    pub teams: Vec<Team>,
}
