// ⚖️ Reconciliation Engine - upload rows vs the players database
//
// Six steps, in this order:
//   1. de-duplicate rows by unique key (first occurrence creates)
//   2. partition: key unknown → new player, key known → update candidate
//   3. create new players, merge them into the snapshot
//   4. diff update candidates against the players that existed before 3
//   5. resolve every row's membership (player, season, division, team)
//   6. create the memberships that are neither stored nor already produced
//
// Each gateway batch fails on its own: a failed batch is reported and the
// others still run. Only records the gateway confirmed reach the snapshot.

use crate::deduplication::{DeduplicationEngine, DuplicateMatch, MembershipCheck, MembershipLedger};
use crate::entities::{
    MembershipFields, NewMtsaMembership, NewPlayer, NewTnMembership, Player, PlayerChanges,
    PlayerUpdate,
};
use crate::gateway::Gateway;
use crate::identity::Keyed;
use crate::parser::UploadRow;
use crate::snapshot::{SeasonSelector, Snapshot};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// COUNTS & FAILURES
// ============================================================================

/// Membership rows skipped, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    /// Player not in the snapshot (e.g. its creation failed)
    pub player: usize,
    pub season: usize,
    pub division: usize,
    pub team: usize,

    /// Tuple already stored, or produced by an earlier row
    pub duplicate: usize,
}

impl SkipCounts {
    pub fn lookup_unresolved(&self) -> usize {
        self.player + self.season + self.division + self.team
    }

    pub fn total(&self) -> usize {
        self.lookup_unresolved() + self.duplicate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchKind {
    CreatePlayers,
    UpdatePlayers,
    CreateMemberships,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatchKind::CreatePlayers => "create players",
            BatchKind::UpdatePlayers => "update players",
            BatchKind::CreateMemberships => "create memberships",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub batch: BatchKind,
    pub records: usize,
    pub error: String,
}

// ============================================================================
// PLANS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerPlan {
    pub new_players: Vec<NewPlayer>,
    pub updates: Vec<PlayerUpdate>,

    /// Rows whose key repeats an earlier row
    pub duplicate_rows: usize,
    pub duplicates: Vec<DuplicateMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipPlan {
    pub tn: Vec<NewTnMembership>,
    pub mtsa: Vec<NewMtsaMembership>,
    pub skipped: SkipCounts,
}

impl MembershipPlan {
    pub fn len(&self) -> usize {
        self.tn.len() + self.mtsa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What an upload would do, without touching the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DryRunSummary {
    pub players_to_create: usize,
    pub players_to_update: usize,
    pub memberships_to_create: usize,
    pub skipped: SkipCounts,
    pub duplicate_rows: usize,

    /// Player label and the fields each update would change
    pub updated_fields: Vec<(String, PlayerChanges)>,

    /// Why each repeated row was ignored
    pub duplicate_reasons: Vec<String>,
}

impl DryRunSummary {
    pub fn summary(&self) -> String {
        format!(
            "Dry run: would create {} players, update {}, create {} memberships ({} skipped, {} duplicate rows)",
            self.players_to_create,
            self.players_to_update,
            self.memberships_to_create,
            self.skipped.total(),
            self.duplicate_rows
        )
    }
}

// ============================================================================
// RECONCILE SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub players_created: usize,
    pub players_updated: usize,
    pub memberships_created: usize,
    pub skipped: SkipCounts,
    pub duplicate_rows: usize,
    pub failures: Vec<BatchFailure>,
    pub snapshot_version: u64,
}

impl ReconcileSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} players created, {} updated, {} memberships created, {} skipped",
            self.players_created,
            self.players_updated,
            self.memberships_created,
            self.skipped.total()
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    /// Season the upload's memberships belong to (default: current season)
    pub season: SeasonSelector,

    dedup: DeduplicationEngine,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            season: SeasonSelector::Current,
            dedup: DeduplicationEngine::new(),
        }
    }

    pub fn for_season(season: SeasonSelector) -> Self {
        ReconciliationEngine {
            season,
            dedup: DeduplicationEngine::new(),
        }
    }

    /// Steps 1, 2 and 4: new players and field diffs against `snapshot`.
    pub fn plan_players(&self, rows: &[UploadRow], snapshot: &Snapshot) -> PlayerPlan {
        let duplicates = self.dedup.find_duplicates(rows);

        let new_players: Vec<NewPlayer> = self
            .dedup
            .first_occurrences(rows)
            .into_iter()
            .filter(|row| snapshot.player_by_key(&row.unique_key).is_none())
            .filter_map(|row| row.player.to_new_player())
            .collect();

        // one update per stored player, later rows laid over earlier ones
        let mut updates: Vec<PlayerUpdate> = Vec::new();
        let mut slots: HashMap<i64, usize> = HashMap::new();
        for row in rows {
            let Some(stored) = snapshot.player_by_key(&row.unique_key) else {
                continue;
            };
            let changes = row.player.diff(stored);
            if changes.is_empty() {
                continue;
            }

            match slots.get(&stored.id) {
                Some(&slot) => updates[slot].changes.merge(changes),
                None => {
                    slots.insert(stored.id, updates.len());
                    updates.push(PlayerUpdate {
                        id: stored.id,
                        changes,
                    });
                }
            }
        }

        PlayerPlan {
            new_players,
            updates,
            duplicate_rows: duplicates.len(),
            duplicates,
        }
    }

    /// Step 5: one membership per row whose player and lookups resolve.
    pub fn plan_memberships(&self, rows: &[UploadRow], snapshot: &Snapshot) -> MembershipPlan {
        let mut plan = MembershipPlan::default();
        let mut ledger = MembershipLedger::new();

        let season = snapshot.resolve_season(&self.season);
        if season.is_none() && !rows.is_empty() {
            warn!("Season {:?} not found; no memberships will be created", self.season);
        }

        for row in rows {
            let Some(player) = snapshot.player_by_key(&row.unique_key) else {
                plan.skipped.player += 1;
                continue;
            };
            let Some(season) = season else {
                plan.skipped.season += 1;
                continue;
            };

            match &row.membership {
                MembershipFields::TnSoccer(fields) => {
                    let record = NewTnMembership::new(player.id, season.id, fields);
                    match ledger.claim(snapshot, record.key()) {
                        MembershipCheck::New => plan.tn.push(record),
                        _ => plan.skipped.duplicate += 1,
                    }
                }
                MembershipFields::Mtsa(fields) => {
                    let division = fields
                        .division_name
                        .as_deref()
                        .and_then(|name| snapshot.find_division(name));
                    let Some(division) = division else {
                        debug!("Line {}: division {:?} not found", row.line, fields.division_name);
                        plan.skipped.division += 1;
                        continue;
                    };

                    let team = fields
                        .team_name
                        .as_deref()
                        .and_then(|name| snapshot.find_team(name));
                    let Some(team) = team else {
                        debug!("Line {}: team {:?} not found", row.line, fields.team_name);
                        plan.skipped.team += 1;
                        continue;
                    };

                    let record =
                        NewMtsaMembership::new(player.id, season.id, team.id, division.id, fields);
                    match ledger.claim(snapshot, record.key()) {
                        MembershipCheck::New => plan.mtsa.push(record),
                        _ => plan.skipped.duplicate += 1,
                    }
                }
            }
        }

        plan
    }

    /// Plan the whole upload without a gateway. New players get provisional
    /// ids in a scratch copy so their memberships are counted too.
    pub fn plan(&self, rows: &[UploadRow], snapshot: &Snapshot) -> DryRunSummary {
        let players = self.plan_players(rows, snapshot);

        let mut scratch = snapshot.clone();
        let provisional: Vec<Player> = players
            .new_players
            .iter()
            .enumerate()
            .map(|(i, p)| Player::from_new(-(i as i64) - 1, p.clone()))
            .collect();
        scratch.merge_players(provisional);

        let memberships = self.plan_memberships(rows, &scratch);

        DryRunSummary {
            players_to_create: players.new_players.len(),
            players_to_update: players.updates.len(),
            memberships_to_create: memberships.len(),
            skipped: memberships.skipped,
            duplicate_rows: players.duplicate_rows,
            updated_fields: updated_fields(&players, snapshot),
            duplicate_reasons: players.duplicates.into_iter().map(|d| d.reason).collect(),
        }
    }

    /// Run all six steps against the gateway, mutating `snapshot`.
    pub fn reconcile(
        &self,
        rows: &[UploadRow],
        snapshot: &mut Snapshot,
        gateway: &mut dyn Gateway,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        // Steps 1, 2, 4 are planned before any player is created
        let plan = self.plan_players(rows, snapshot);
        summary.duplicate_rows = plan.duplicate_rows;

        // Step 3
        if !plan.new_players.is_empty() {
            match gateway.create_players(&plan.new_players) {
                Ok(created) => {
                    summary.players_created = created.len();
                    snapshot.merge_players(created);
                }
                Err(e) => record_failure(
                    &mut summary,
                    BatchKind::CreatePlayers,
                    plan.new_players.len(),
                    e,
                ),
            }
        }

        // Step 4
        if !plan.updates.is_empty() {
            match gateway.update_players(&plan.updates) {
                Ok(updated) => {
                    summary.players_updated = updated.len();
                    snapshot.merge_players(updated);
                }
                Err(e) => record_failure(
                    &mut summary,
                    BatchKind::UpdatePlayers,
                    plan.updates.len(),
                    e,
                ),
            }
        }

        // Steps 5, 6
        let memberships = self.plan_memberships(rows, snapshot);
        summary.skipped = memberships.skipped;

        if !memberships.tn.is_empty() {
            match gateway.create_tn_memberships(&memberships.tn) {
                Ok(created) => {
                    summary.memberships_created += created.len();
                    snapshot.merge_tn_memberships(created);
                }
                Err(e) => record_failure(
                    &mut summary,
                    BatchKind::CreateMemberships,
                    memberships.tn.len(),
                    e,
                ),
            }
        }

        if !memberships.mtsa.is_empty() {
            match gateway.create_mtsa_memberships(&memberships.mtsa) {
                Ok(created) => {
                    summary.memberships_created += created.len();
                    snapshot.merge_mtsa_memberships(created);
                }
                Err(e) => record_failure(
                    &mut summary,
                    BatchKind::CreateMemberships,
                    memberships.mtsa.len(),
                    e,
                ),
            }
        }

        summary.snapshot_version = snapshot.version();
        info!("Reconciled {} rows: {}", rows.len(), summary.summary());
        summary
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn record_failure(
    summary: &mut ReconcileSummary,
    batch: BatchKind,
    records: usize,
    e: impl fmt::Display,
) {
    error!("Batch '{}' of {} records failed: {}", batch, records, e);
    summary.failures.push(BatchFailure {
        batch,
        records,
        error: e.to_string(),
    });
}

/// Stored players an upload would touch, for reviewing a plan.
pub fn updated_fields(plan: &PlayerPlan, snapshot: &Snapshot) -> Vec<(String, PlayerChanges)> {
    plan.updates
        .iter()
        .filter_map(|u| {
            let player = snapshot.player_by_id(u.id)?;
            let label = player
                .unique_key()
                .map(|k| k.to_string())
                .unwrap_or_else(|| player.full_name());
            Some((label, u.changes.clone()))
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MtsaMembership, NewMtsaMembership, PlayerField};
    use crate::gateway::memory::MemoryGateway;
    use crate::parser::{MtsaFormat, TnSoccerFormat, UploadFormat};
    use crate::sheet::{Cell, Sheet};
    use crate::snapshot::tests::{lookups, player};

    fn sheet(rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            "Upload",
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|c| if c.is_empty() { Cell::Empty } else { Cell::text(*c) })
                        .collect()
                })
                .collect(),
        )
    }

    const TN_HEADER: &[&str] = &["Last Name", "First Name", "DOB", "City", "Home Ph#", "Play Level"];

    fn tn_rows(data: &[&[&str]]) -> Vec<UploadRow> {
        let mut all: Vec<&[&str]> = vec![TN_HEADER];
        all.extend_from_slice(data);
        TnSoccerFormat::new().parse(&sheet(&all)).unwrap().rows
    }

    fn existing_jane() -> Player {
        let mut jane = player(1, "Doe", "Jane", Some(40180.0));
        jane.city = Some("Nashville".to_string());
        jane.phone = Some("615-555-0100".to_string());
        jane
    }

    fn snapshot() -> Snapshot {
        Snapshot::new()
            .with_players(vec![existing_jane()])
            .with_lookups(lookups())
    }

    #[test]
    fn test_duplicate_keys_create_once_from_first_row() {
        let rows = tn_rows(&[
            &["Roe", "Rick", "03/04/2011", "Nashville", "615-555-0101", "Rec"],
            &["ROE", " Rick", "03/04/2011", "Franklin", "615-555-0102", "Rec"],
        ]);
        let engine = ReconciliationEngine::new();
        let plan = engine.plan_players(&rows, &snapshot());

        assert_eq!(plan.new_players.len(), 1);
        assert_eq!(plan.new_players[0].city.as_deref(), Some("Nashville"));
        assert_eq!(plan.duplicate_rows, 1);
        assert!(plan.updates.is_empty());
    }

    #[test]
    fn test_update_carries_only_changed_field() {
        let rows = tn_rows(&[&["Doe", "Jane", "01/02/2010", "Franklin", "615-555-0100", "Rec"]]);
        let engine = ReconciliationEngine::new();
        let plan = engine.plan_players(&rows, &snapshot());

        assert!(plan.new_players.is_empty());
        assert_eq!(plan.updates.len(), 1);

        let json = serde_json::to_value(&plan.updates[0]).unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "city": "Franklin"}));
    }

    #[test]
    fn test_unchanged_row_produces_no_update() {
        let rows = tn_rows(&[&["Doe", "Jane", "40180", "Nashville", "615-555-0100", "Rec"]]);
        let plan = ReconciliationEngine::new().plan_players(&rows, &snapshot());
        assert!(plan.updates.is_empty());
    }

    #[test]
    fn test_updates_merge_per_player() {
        let rows = tn_rows(&[
            &["Doe", "Jane", "01/02/2010", "Franklin", "615-555-0100", "Rec"],
            &["Doe", "Jane", "01/02/2010", "Franklin", "615-555-0199", "Rec"],
        ]);
        let plan = ReconciliationEngine::new().plan_players(&rows, &snapshot());

        assert_eq!(plan.updates.len(), 1);
        assert_eq!(
            plan.updates[0].changes.fields(),
            vec![PlayerField::City, PlayerField::Phone]
        );
        assert_eq!(plan.updates[0].changes.phone.as_deref(), Some("615-555-0199"));

        let labels = updated_fields(&plan, &snapshot());
        assert_eq!(labels[0].0, "doe_jane_40180");
    }

    #[test]
    fn test_dry_run_lists_changes_and_repeats() {
        let rows = tn_rows(&[
            &["Doe", "Jane", "01/02/2010", "Franklin", "615-555-0100", "Rec"],
            &["Roe", "Rick", "03/04/2011", "Nashville", "615-555-0101", "Rec"],
            &["Roe", "Rick", "03/04/2011", "Franklin", "615-555-0101", "Rec"],
        ]);
        let dry = ReconciliationEngine::new().plan(&rows, &snapshot());

        assert_eq!(dry.players_to_create, 1);
        assert_eq!(dry.updated_fields.len(), 1);
        assert_eq!(dry.updated_fields[0].0, "doe_jane_40180");
        assert_eq!(dry.updated_fields[0].1.fields(), vec![PlayerField::City]);

        assert_eq!(dry.duplicate_reasons.len(), 1);
        assert!(dry.duplicate_reasons[0].contains("roe_rick_"));
        assert!(dry.duplicate_reasons[0].starts_with("Line 4 "));
    }

    #[test]
    fn test_end_to_end_tn_upload() {
        let rows = tn_rows(&[
            &["Doe", "Jane", "01/02/2010", "Nashville", "615-555-0199", "Rec"],
            &["Roe", "Rick", "03/04/2011", "Franklin", "615-555-0101", "Rec"],
            &["Roe", "Rick", "03/04/2011", "Franklin", "615-555-0101", "Select"],
        ]);
        let mut snapshot = snapshot();
        let mut gateway = MemoryGateway::new();
        gateway.players.push(existing_jane());

        let summary = ReconciliationEngine::new().reconcile(&rows, &mut snapshot, &mut gateway);

        assert_eq!(summary.players_created, 1);
        assert_eq!(summary.players_updated, 1);
        assert_eq!(summary.memberships_created, 2);
        assert_eq!(summary.skipped.duplicate, 1);
        assert_eq!(summary.skipped.total(), 1);
        assert!(summary.is_clean());

        assert_eq!(gateway.tn.len(), 2);
        assert!(gateway.tn.iter().all(|m| m.record.season_id == 10));
        assert_eq!(
            snapshot.player_by_id(1).unwrap().phone.as_deref(),
            Some("615-555-0199")
        );
        assert_eq!(snapshot.players().len(), 2);
        assert_eq!(summary.snapshot_version, snapshot.version());
        assert_eq!(snapshot.version(), 3);

        println!("✅ End-to-end: {}", summary.summary());
    }

    #[test]
    fn test_unresolvable_season_creates_no_memberships() {
        let rows = tn_rows(&[
            &["Doe", "Jane", "01/02/2010", "Nashville", "615-555-0100", "Rec"],
            &["Roe", "Rick", "03/04/2011", "Franklin", "615-555-0101", "Rec"],
        ]);
        let mut snapshot = snapshot();
        let mut gateway = MemoryGateway::new();

        let engine = ReconciliationEngine::for_season(SeasonSelector::Code("W99".to_string()));
        let summary = engine.reconcile(&rows, &mut snapshot, &mut gateway);

        assert_eq!(summary.players_created, 1);
        assert_eq!(summary.memberships_created, 0);
        assert_eq!(summary.skipped.season, 2);
        assert!(gateway.tn.is_empty());
    }

    #[test]
    fn test_repeat_upload_is_idempotent() {
        let rows = tn_rows(&[&["Roe", "Rick", "03/04/2011", "Franklin", "615-555-0101", "Rec"]]);
        let mut snapshot = snapshot();
        let mut gateway = MemoryGateway::new();
        let engine = ReconciliationEngine::new();

        let first = engine.reconcile(&rows, &mut snapshot, &mut gateway);
        let second = engine.reconcile(&rows, &mut snapshot, &mut gateway);

        assert_eq!((first.players_created, first.memberships_created), (1, 1));
        assert_eq!((second.players_created, second.memberships_created), (0, 0));
        assert_eq!(second.players_updated, 0);
        assert_eq!(second.skipped.duplicate, 1);
    }

    const MTSA_HEADER: &[&str] = &[
        "Player Last Name",
        "Player First Name",
        "Player Birth Date",
        "Division Name",
        "Team Name",
        "Order No",
    ];

    fn mtsa_rows(data: &[&[&str]]) -> Vec<UploadRow> {
        let mut all: Vec<&[&str]> = vec![MTSA_HEADER];
        all.extend_from_slice(data);
        MtsaFormat::new().parse(&sheet(&all)).unwrap().rows
    }

    #[test]
    fn test_existing_mtsa_tuple_is_skipped() {
        let rows = mtsa_rows(&[&["Doe", "Jane", "01/02/2010", "G U10", "Strikers", "A-1"]]);
        let stored = MtsaMembership {
            id: 9,
            record: NewMtsaMembership::new(1, 10, 30, 20, &Default::default()),
        };
        let mut snapshot = snapshot().with_mtsa_memberships(vec![stored]);
        let mut gateway = MemoryGateway::new();

        let summary = ReconciliationEngine::new().reconcile(&rows, &mut snapshot, &mut gateway);

        assert_eq!(summary.memberships_created, 0);
        assert_eq!(summary.skipped.duplicate, 1);
        assert!(gateway.mtsa.is_empty());
    }

    #[test]
    fn test_mtsa_lookups_resolved_case_insensitively() {
        let rows = mtsa_rows(&[
            &["Doe", "Jane", "01/02/2010", " g u10 ", "STRIKERS", "A-1"],
            &["Roe", "Rick", "03/04/2011", "B U12", "Strikers", "A-2"],
            &["Poe", "Ann", "05/06/2012", "G U10", "Rockets", "A-3"],
        ]);
        let plan = ReconciliationEngine::new().plan_memberships(&rows, &snapshot());

        assert_eq!(plan.mtsa.len(), 1);
        assert_eq!(plan.mtsa[0].team_id, 30);
        assert_eq!(plan.mtsa[0].division_id, 20);
        assert_eq!(plan.mtsa[0].order_no.as_deref(), Some("A-1"));
        // Rick and Ann are not stored yet
        assert_eq!(plan.skipped.player, 2);

        let dry = ReconciliationEngine::new().plan(&rows, &snapshot());
        assert_eq!(dry.players_to_create, 2);
        assert_eq!(dry.memberships_to_create, 1);
        assert_eq!(dry.skipped.division, 1);
        assert_eq!(dry.skipped.team, 1);
    }

    #[test]
    fn test_failed_player_batch_leaves_snapshot_alone() {
        let rows = tn_rows(&[
            &["Doe", "Jane", "01/02/2010", "Franklin", "615-555-0100", "Rec"],
            &["Roe", "Rick", "03/04/2011", "Franklin", "615-555-0101", "Rec"],
        ]);
        let mut snapshot = snapshot();
        let mut gateway = MemoryGateway::new().failing("players");
        gateway.players.push(existing_jane());

        let summary = ReconciliationEngine::new().reconcile(&rows, &mut snapshot, &mut gateway);

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].batch, BatchKind::CreatePlayers);
        assert_eq!(summary.players_created, 0);
        // the other batches still ran
        assert_eq!(summary.players_updated, 1);
        assert_eq!(summary.memberships_created, 1);
        assert_eq!(summary.skipped.player, 1);
        assert_eq!(snapshot.players().len(), 1);
    }

    #[test]
    fn test_failed_update_batch_keeps_stored_player() {
        let rows = tn_rows(&[
            &["Doe", "Jane", "01/02/2010", "Franklin", "615-555-0100", "Rec"],
            &["Roe", "Rick", "03/04/2011", "Franklin", "615-555-0101", "Rec"],
        ]);
        let mut snapshot = snapshot();
        let mut gateway = MemoryGateway::new().failing("player updates");
        gateway.players.push(existing_jane());

        let summary = ReconciliationEngine::new().reconcile(&rows, &mut snapshot, &mut gateway);

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].batch, BatchKind::UpdatePlayers);
        assert_eq!(summary.failures[0].records, 1);
        assert_eq!(summary.players_updated, 0);
        assert_eq!(snapshot.player_by_id(1), Some(&existing_jane()));

        // creates and memberships still ran
        assert_eq!(summary.players_created, 1);
        assert_eq!(summary.memberships_created, 2);
        assert_eq!(gateway.tn.len(), 2);
    }

    #[test]
    fn test_failed_membership_batch_is_reported() {
        let rows = tn_rows(&[&["Roe", "Rick", "03/04/2011", "Franklin", "615-555-0101", "Rec"]]);
        let mut snapshot = snapshot();
        let mut gateway = MemoryGateway::new().failing("memberships");

        let summary = ReconciliationEngine::new().reconcile(&rows, &mut snapshot, &mut gateway);

        assert_eq!(summary.players_created, 1);
        assert_eq!(summary.memberships_created, 0);
        assert_eq!(summary.failures[0].batch, BatchKind::CreateMemberships);
        assert!(snapshot.tn_memberships().is_empty());
        assert!(!summary.is_clean());
    }
}
