// 🚪 Persistence Gateway - the reconciliation engine's only way to the store
//
// Batch-oriented: every call takes a whole write-set and either returns the
// confirmed records (with ids) or fails as a unit.

use crate::entities::{
    NewMtsaMembership, NewPlayer, NewTnMembership, MtsaMembership, Player, PlayerUpdate,
    TnMembership,
};
use crate::import::ImportReport;
use crate::snapshot::Snapshot;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity} rejected: {reason}")]
    Rejected { entity: &'static str, reason: String },
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

pub trait Gateway {
    /// Load players, lookups and existing memberships.
    fn read_snapshot(&self) -> GatewayResult<Snapshot>;

    fn create_players(&mut self, players: &[NewPlayer]) -> GatewayResult<Vec<Player>>;

    /// Returns the full rows after the update.
    fn update_players(&mut self, updates: &[PlayerUpdate]) -> GatewayResult<Vec<Player>>;

    fn create_tn_memberships(
        &mut self,
        memberships: &[NewTnMembership],
    ) -> GatewayResult<Vec<TnMembership>>;

    fn create_mtsa_memberships(
        &mut self,
        memberships: &[NewMtsaMembership],
    ) -> GatewayResult<Vec<MtsaMembership>>;

    /// Audit trail of an applied upload. Stores without one ignore it.
    fn record_upload(&mut self, _report: &ImportReport) -> GatewayResult<()> {
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY GATEWAY (tests)
// ============================================================================

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashSet;

    /// Gateway double holding records in vectors; any batch can be made to fail.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryGateway {
        pub players: Vec<Player>,
        pub tn: Vec<TnMembership>,
        pub mtsa: Vec<MtsaMembership>,
        pub uploads: Vec<String>,
        pub fail: HashSet<&'static str>,
        next_id: i64,
    }

    impl MemoryGateway {
        pub fn new() -> Self {
            MemoryGateway {
                next_id: 100,
                ..Default::default()
            }
        }

        pub fn failing(mut self, batch: &'static str) -> Self {
            self.fail.insert(batch);
            self
        }

        fn check(&self, batch: &'static str) -> GatewayResult<()> {
            if self.fail.contains(batch) {
                return Err(GatewayError::Rejected {
                    entity: batch,
                    reason: "store unavailable".to_string(),
                });
            }
            Ok(())
        }

        fn next_id(&mut self) -> i64 {
            self.next_id += 1;
            self.next_id
        }
    }

    impl Gateway for MemoryGateway {
        fn read_snapshot(&self) -> GatewayResult<Snapshot> {
            Ok(Snapshot::new()
                .with_players(self.players.clone())
                .with_tn_memberships(self.tn.clone())
                .with_mtsa_memberships(self.mtsa.clone()))
        }

        fn create_players(&mut self, players: &[NewPlayer]) -> GatewayResult<Vec<Player>> {
            self.check("players")?;
            let created: Vec<Player> = players
                .iter()
                .map(|p| Player::from_new(self.next_id(), p.clone()))
                .collect();
            self.players.extend(created.iter().cloned());
            Ok(created)
        }

        fn update_players(&mut self, updates: &[PlayerUpdate]) -> GatewayResult<Vec<Player>> {
            self.check("player updates")?;
            let mut updated = Vec::new();
            for update in updates {
                if let Some(player) = self.players.iter_mut().find(|p| p.id == update.id) {
                    player.apply(&update.changes);
                    updated.push(player.clone());
                }
            }
            Ok(updated)
        }

        fn create_tn_memberships(
            &mut self,
            memberships: &[NewTnMembership],
        ) -> GatewayResult<Vec<TnMembership>> {
            self.check("memberships")?;
            let created: Vec<TnMembership> = memberships
                .iter()
                .map(|m| TnMembership {
                    id: self.next_id(),
                    record: m.clone(),
                })
                .collect();
            self.tn.extend(created.iter().cloned());
            Ok(created)
        }

        fn create_mtsa_memberships(
            &mut self,
            memberships: &[NewMtsaMembership],
        ) -> GatewayResult<Vec<MtsaMembership>> {
            self.check("memberships")?;
            let created: Vec<MtsaMembership> = memberships
                .iter()
                .map(|m| MtsaMembership {
                    id: self.next_id(),
                    record: m.clone(),
                })
                .collect();
            self.mtsa.extend(created.iter().cloned());
            Ok(created)
        }

        fn record_upload(&mut self, report: &ImportReport) -> GatewayResult<()> {
            self.uploads.push(report.digest.clone());
            Ok(())
        }
    }
}
