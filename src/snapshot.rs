// 🗃️ Snapshot - versioned in-memory view of the players database
//
// Holds players (indexed by unique key), the four lookup tables and the
// existing membership tuples. The reconciliation engine borrows it `&mut` for
// the length of one upload, so only one import can mutate it at a time.
// Every merge of gateway-confirmed records bumps `version`.

use crate::entities::{
    Division, League, LookupTables, MembershipKey, MtsaMembership, Player, Season, Team,
    TnMembership,
};
use crate::identity::{Keyed, UniqueKey};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// SEASON SELECTOR
// ============================================================================

/// Which season an upload's memberships belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonSelector {
    /// The first league's current season
    #[default]
    Current,

    /// A seasons.id
    Id(i64),

    /// TN Soccer's season code (`tnsoccer_season_id`)
    Code(String),
}

// ============================================================================
// SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    version: u64,

    players: Vec<Player>,
    by_key: HashMap<UniqueKey, usize>,
    by_id: HashMap<i64, usize>,

    pub leagues: Vec<League>,
    pub seasons: Vec<Season>,
    pub divisions: Vec<Division>,
    pub teams: Vec<Team>,

    tn_memberships: Vec<TnMembership>,
    mtsa_memberships: Vec<MtsaMembership>,
    membership_keys: HashSet<MembershipKey>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: seed players
    pub fn with_players(mut self, players: Vec<Player>) -> Self {
        self.index_players(players);
        self
    }

    /// Builder pattern: seed all four lookup tables
    pub fn with_lookups(mut self, lookups: LookupTables) -> Self {
        self.leagues = lookups.leagues;
        self.seasons = lookups.seasons;
        self.divisions = lookups.divisions;
        self.teams = lookups.teams;
        self
    }

    /// Builder pattern: seed existing TN Soccer memberships
    pub fn with_tn_memberships(mut self, memberships: Vec<TnMembership>) -> Self {
        self.index_tn(memberships);
        self
    }

    /// Builder pattern: seed existing MTSA memberships
    pub fn with_mtsa_memberships(mut self, memberships: Vec<MtsaMembership>) -> Self {
        self.index_mtsa(memberships);
        self
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn tn_memberships(&self) -> &[TnMembership] {
        &self.tn_memberships
    }

    pub fn mtsa_memberships(&self) -> &[MtsaMembership] {
        &self.mtsa_memberships
    }

    // ------------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------------

    pub fn player_by_key(&self, key: &UniqueKey) -> Option<&Player> {
        self.by_key.get(key).map(|&i| &self.players[i])
    }

    pub fn player_by_id(&self, id: i64) -> Option<&Player> {
        self.by_id.get(&id).map(|&i| &self.players[i])
    }

    /// Merge players the gateway created or updated. A known id replaces the
    /// stored entry, an unknown one is appended.
    pub fn merge_players(&mut self, players: Vec<Player>) {
        if players.is_empty() {
            return;
        }
        self.index_players(players);
        self.version += 1;
    }

    fn index_players(&mut self, players: Vec<Player>) {
        for player in players {
            let slot = match self.by_id.get(&player.id) {
                Some(&i) => {
                    if let Some(old_key) = self.players[i].unique_key() {
                        if self.by_key.get(&old_key) == Some(&i) {
                            self.by_key.remove(&old_key);
                        }
                    }
                    self.players[i] = player;
                    i
                }
                None => {
                    self.players.push(player);
                    let i = self.players.len() - 1;
                    self.by_id.insert(self.players[i].id, i);
                    i
                }
            };

            if let Some(key) = self.players[slot].unique_key() {
                match self.by_key.get(&key) {
                    Some(&other) if other != slot => warn!(
                        "Players {} and {} share key '{}'; keeping {}",
                        self.players[other].id, self.players[slot].id, key, self.players[other].id
                    ),
                    _ => {
                        self.by_key.insert(key, slot);
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Memberships
    // ------------------------------------------------------------------------

    pub fn has_membership(&self, key: &MembershipKey) -> bool {
        self.membership_keys.contains(key)
    }

    pub fn merge_tn_memberships(&mut self, memberships: Vec<TnMembership>) {
        if memberships.is_empty() {
            return;
        }
        self.index_tn(memberships);
        self.version += 1;
    }

    pub fn merge_mtsa_memberships(&mut self, memberships: Vec<MtsaMembership>) {
        if memberships.is_empty() {
            return;
        }
        self.index_mtsa(memberships);
        self.version += 1;
    }

    fn index_tn(&mut self, memberships: Vec<TnMembership>) {
        for membership in memberships {
            self.membership_keys.insert(membership.key());
            self.tn_memberships.push(membership);
        }
    }

    fn index_mtsa(&mut self, memberships: Vec<MtsaMembership>) {
        for membership in memberships {
            self.membership_keys.insert(membership.key());
            self.mtsa_memberships.push(membership);
        }
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    /// The first league's current season.
    pub fn current_season(&self) -> Option<&Season> {
        let id = self.leagues.first()?.current_season_id?;
        self.seasons.iter().find(|s| s.id == id)
    }

    pub fn resolve_season(&self, selector: &SeasonSelector) -> Option<&Season> {
        match selector {
            SeasonSelector::Current => self.current_season(),
            SeasonSelector::Id(id) => self.seasons.iter().find(|s| s.id == *id),
            SeasonSelector::Code(code) => self.seasons.iter().find(|s| s.has_code(code)),
        }
    }

    pub fn find_division(&self, mtsa_name: &str) -> Option<&Division> {
        self.divisions.iter().find(|d| d.matches_mtsa_name(mtsa_name))
    }

    pub fn find_team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.matches_name(name))
    }

    pub fn league_for(&self, season: &Season) -> Option<&League> {
        self.leagues.iter().find(|l| l.id == season.league_id)
    }
}

// ============================================================================
// TESTS
// ============================================================================
