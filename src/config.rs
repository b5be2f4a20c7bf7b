// ⚙️ Configuration - defaults, then RosterSync.toml, then ROSTER_* variables

use crate::parser::{MTSA_MIN_POPULATED_CELLS, TN_SOCCER_MIN_POPULATED_CELLS};
use crate::snapshot::SeasonSelector;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "RosterSync.toml";
pub const ENV_PREFIX: &str = "ROSTER_";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RosterConfig {
    pub database_path: PathBuf,

    /// Recorded as the actor of every audit event
    pub actor: String,

    pub tn_min_populated_cells: usize,
    pub mtsa_min_populated_cells: usize,

    /// TN Soccer season code to use when none is given; empty → current season
    pub season_code: Option<String>,

    pub export_file_name: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("roster.db"),
            actor: "roster_sync".to_string(),
            tn_min_populated_cells: TN_SOCCER_MIN_POPULATED_CELLS,
            mtsa_min_populated_cells: MTSA_MIN_POPULATED_CELLS,
            season_code: None,
            export_file_name: "filtered_new_records.xlsx".to_string(),
        }
    }
}

impl RosterConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> anyhow::Result<Self> {
        Ok(Self::figment().extract()?)
    }

    /// A season code given on the command line wins over the configured one.
    pub fn season_selector(&self, code: Option<&str>) -> SeasonSelector {
        code.or(self.season_code.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| SeasonSelector::Code(c.to_string()))
            .unwrap_or(SeasonSelector::Current)
    }
}
