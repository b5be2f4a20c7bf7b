// 🔍 Deduplication - one player per unique key, one membership per tuple
// Two checks: Duplicate Key (rows of one upload) and Membership Tuple
// (rows vs the snapshot and vs earlier rows of the same upload)

use crate::entities::MembershipKey;
use crate::identity::UniqueKey;
use crate::parser::UploadRow;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// DUPLICATE MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// Index of the row that wins
    pub first_index: usize,

    /// Index of the later row with the same key
    pub duplicate_index: usize,

    pub key: UniqueKey,

    /// Human-readable reason
    pub reason: String,
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

#[derive(Debug, Default)]
pub struct DeduplicationEngine;

impl DeduplicationEngine {
    pub fn new() -> Self {
        DeduplicationEngine
    }

    /// Every later row whose key was already seen, paired with the first one.
    pub fn find_duplicates(&self, rows: &[UploadRow]) -> Vec<DuplicateMatch> {
        let mut first_seen: HashMap<&UniqueKey, usize> = HashMap::new();
        let mut matches = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            match first_seen.get(&row.unique_key) {
                Some(&first_index) => matches.push(DuplicateMatch {
                    first_index,
                    duplicate_index: index,
                    key: row.unique_key.clone(),
                    reason: format!(
                        "Line {} repeats player '{}' from line {}",
                        row.line, row.unique_key, rows[first_index].line
                    ),
                }),
                None => {
                    first_seen.insert(&row.unique_key, index);
                }
            }
        }

        matches
    }

    /// The first row per unique key, in upload order.
    pub fn first_occurrences<'a>(&self, rows: &'a [UploadRow]) -> Vec<&'a UploadRow> {
        let mut seen = HashSet::new();
        rows.iter()
            .filter(|row| seen.insert(&row.unique_key))
            .collect()
    }
}

// ============================================================================
// MEMBERSHIP LEDGER
// ============================================================================

/// Outcome of checking a membership tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipCheck {
    New,
    /// Already stored
    InSnapshot,
    /// Produced by an earlier row of this upload
    InUpload,
}

/// Membership tuples produced so far in one upload.
#[derive(Debug, Default)]
pub struct MembershipLedger {
    produced: HashSet<MembershipKey>,
}

impl MembershipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a tuple and, when new, claim it.
    pub fn claim(&mut self, snapshot: &Snapshot, key: MembershipKey) -> MembershipCheck {
        if snapshot.has_membership(&key) {
            MembershipCheck::InSnapshot
        } else if !self.produced.insert(key) {
            MembershipCheck::InUpload
        } else {
            MembershipCheck::New
        }
    }

    pub fn len(&self) -> usize {
        self.produced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.produced.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateCode;
    use crate::entities::{
        MembershipFields, NewTnMembership, PlayerFields, TnMembership, TnSoccerFields,
    };

    fn row(line: usize, last: &str, first: &str, city: &str) -> UploadRow {
        let player = PlayerFields {
            last_name: Some(last.to_string()),
            first_name: Some(first.to_string()),
            dob: Some(DateCode::Serial(40180.0)),
            city: Some(city.to_string()),
            ..Default::default()
        };
        UploadRow {
            line,
            unique_key: UniqueKey::derive(
                player.last_name.as_deref(),
                player.first_name.as_deref(),
                &player.dob_code(),
            )
            .unwrap(),
            player,
            membership: MembershipFields::TnSoccer(TnSoccerFields::default()),
        }
    }

    #[test]
    fn test_find_duplicates() {
        let engine = DeduplicationEngine::new();
        let rows = vec![
            row(2, "Doe", "Jane", "Nashville"),
            row(3, "Roe", "Rick", "Nashville"),
            row(4, " doe", "JANE", "Franklin"),
        ];

        let matches = engine.find_duplicates(&rows);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].first_index, 0);
        assert_eq!(matches[0].duplicate_index, 2);
        assert_eq!(matches[0].key.as_str(), "doe_jane_40180");

        println!("✅ {}", matches[0].reason);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let engine = DeduplicationEngine::new();
        let rows = vec![
            row(2, "Doe", "Jane", "Nashville"),
            row(3, "Doe", "Jane", "Franklin"),
        ];

        let firsts = engine.first_occurrences(&rows);
        assert_eq!(firsts.len(), 1);
        assert_eq!(firsts[0].player.city.as_deref(), Some("Nashville"));
    }

    #[test]
    fn test_membership_ledger() {
        let stored = NewTnMembership::new(1, 10, &TnSoccerFields::default());
        let snapshot = Snapshot::new().with_tn_memberships(vec![TnMembership {
            id: 1,
            record: stored.clone(),
        }]);
        let mut ledger = MembershipLedger::new();

        assert_eq!(ledger.claim(&snapshot, stored.key()), MembershipCheck::InSnapshot);

        let fresh = NewTnMembership::new(2, 10, &TnSoccerFields::default()).key();
        assert_eq!(ledger.claim(&snapshot, fresh), MembershipCheck::New);
        assert_eq!(ledger.claim(&snapshot, fresh), MembershipCheck::InUpload);
        assert_eq!(ledger.len(), 1);
    }
}
