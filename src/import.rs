// 📥 Import - one uploaded file, start to finish
//
// bytes → first worksheet → keyed rows → reconcile (or plan) → report.
// The report is recorded through the gateway when the upload was applied.

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::parser::{
    detect_source, MtsaFormat, SourceKind, TnSoccerFormat, UploadFormat,
    MTSA_MIN_POPULATED_CELLS, TN_SOCCER_MIN_POPULATED_CELLS,
};
use crate::reconciliation::{DryRunSummary, ReconcileSummary, ReconciliationEngine};
use crate::sheet::{upload_digest, Sheet};
use crate::snapshot::{SeasonSelector, Snapshot};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// `None` → detect from the header row
    pub source: Option<SourceKind>,
    pub season: SeasonSelector,
    pub dry_run: bool,
    pub tn_min_populated_cells: usize,
    pub mtsa_min_populated_cells: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            source: None,
            season: SeasonSelector::Current,
            dry_run: false,
            tn_min_populated_cells: TN_SOCCER_MIN_POPULATED_CELLS,
            mtsa_min_populated_cells: MTSA_MIN_POPULATED_CELLS,
        }
    }
}

impl ImportOptions {
    fn format(&self, source: SourceKind) -> Box<dyn UploadFormat> {
        match source {
            SourceKind::TnSoccer => Box::new(
                TnSoccerFormat::new().with_min_populated_cells(self.tn_min_populated_cells),
            ),
            SourceKind::Mtsa => Box::new(
                MtsaFormat::new().with_min_populated_cells(self.mtsa_min_populated_cells),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportOutcome {
    Applied(ReconcileSummary),
    Planned(DryRunSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub import_id: String,
    pub file_name: String,

    /// SHA-256 of the uploaded bytes
    pub digest: String,

    pub source: SourceKind,
    pub sheet_name: String,
    pub header_row: usize,
    pub rows_parsed: usize,
    pub rows_rejected: usize,
    pub season: SeasonSelector,
    pub outcome: ImportOutcome,
    pub imported_at: DateTime<Utc>,
}

impl ImportReport {
    pub fn applied(&self) -> Option<&ReconcileSummary> {
        match &self.outcome {
            ImportOutcome::Applied(summary) => Some(summary),
            ImportOutcome::Planned(_) => None,
        }
    }

    pub fn summary(&self) -> String {
        let outcome = match &self.outcome {
            ImportOutcome::Applied(summary) => summary.summary(),
            ImportOutcome::Planned(plan) => plan.summary(),
        };
        format!(
            "{} ({}, sheet '{}', header at line {}): {} rows, {} rejected. {}",
            self.file_name,
            self.source,
            self.sheet_name,
            self.header_row,
            self.rows_parsed,
            self.rows_rejected,
            outcome
        )
    }
}

/// Import an upload held in memory.
pub fn import_upload(
    bytes: &[u8],
    file_name: &str,
    options: &ImportOptions,
    snapshot: &mut Snapshot,
    gateway: &mut dyn Gateway,
) -> Result<ImportReport> {
    let digest = upload_digest(bytes);
    let sheet = Sheet::from_bytes(bytes, file_name)?;

    let source = match options.source {
        Some(source) => source,
        None => detect_source(&sheet).ok_or_else(|| Error::UnknownSource(sheet.name.clone()))?,
    };

    let parsed = options.format(source).parse(&sheet)?;
    let engine = ReconciliationEngine::for_season(options.season.clone());

    let outcome = if options.dry_run {
        ImportOutcome::Planned(engine.plan(&parsed.rows, snapshot))
    } else {
        ImportOutcome::Applied(engine.reconcile(&parsed.rows, snapshot, gateway))
    };

    let report = ImportReport {
        import_id: uuid::Uuid::new_v4().to_string(),
        file_name: file_name.to_string(),
        digest,
        source,
        sheet_name: parsed.sheet_name,
        header_row: parsed.header_row,
        rows_parsed: parsed.rows.len(),
        rows_rejected: parsed.rejected,
        season: options.season.clone(),
        outcome,
        imported_at: Utc::now(),
    };

    if !options.dry_run {
        if let Err(e) = gateway.record_upload(&report) {
            warn!("Could not record upload {}: {}", report.import_id, e);
        }
    }

    info!("{}", report.summary());
    Ok(report)
}

/// Import an upload from disk.
pub fn import_file(
    path: &Path,
    options: &ImportOptions,
    snapshot: &mut Snapshot,
    gateway: &mut dyn Gateway,
) -> Result<ImportReport> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    import_upload(&bytes, file_name, options, snapshot, gateway)
}
