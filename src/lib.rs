// Roster Sync - Core Library
// Spreadsheet import pipeline for the association's players database:
// TN Soccer and MTSA exports in, reconciled players and memberships out.

pub mod config;
pub mod dates;
pub mod db;
pub mod deduplication;
pub mod entities;
pub mod error;
pub mod export;
pub mod gateway;
pub mod identity;
pub mod import;
pub mod parser;
pub mod reconciliation;
pub mod sheet;
pub mod snapshot;

// Re-export commonly used types
pub use config::RosterConfig;
pub use dates::{date_string_to_day_count, day_count_to_display, serial_to_timestamp, DateCode};
pub use db::{
    get_events_for_entity, insert_event, setup_database, Event, RosterEntry, SqliteGateway,
    TeamDivision,
};
pub use deduplication::{DeduplicationEngine, DuplicateMatch, MembershipCheck, MembershipLedger};
pub use entities::{
    Division, League, LookupTables, NewPlayer, Player, PlayerChanges, PlayerFields, PlayerUpdate,
    Season, Team,
};
pub use error::{Error, Result};
pub use export::{
    affinity_xlsx_bytes, write_affinity_csv, write_affinity_xlsx, AffinityContext,
    MissingPlayer, AFFINITY_COLUMNS, AFFINITY_SHEET_NAME,
};
pub use gateway::{Gateway, GatewayError, GatewayResult};
pub use identity::{Keyed, UniqueKey};
pub use import::{import_file, import_upload, ImportOptions, ImportOutcome, ImportReport};
pub use parser::{
    detect_source, get_format, MtsaFormat, ParsedUpload, SourceKind, TnSoccerFormat,
    UploadFormat, UploadRow,
};
pub use reconciliation::{
    BatchFailure, BatchKind, DryRunSummary, ReconcileSummary, ReconciliationEngine, SkipCounts,
};
pub use sheet::{upload_digest, Cell, Sheet};
pub use snapshot::{SeasonSelector, Snapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
