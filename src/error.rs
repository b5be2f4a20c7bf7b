// Error taxonomy for the upload pipeline.
// Row-level problems (rejected rows, unresolved lookups, duplicate
// memberships) are never errors; they are counted in the reports.

use crate::gateway::GatewayError;
use crate::parser::SourceKind;

/// Errors that stop an upload before or during reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Unsupported upload: {0}")]
    UnsupportedFile(String),

    #[error("Workbook has no worksheets")]
    EmptyWorkbook,

    /// ParseFailure: no row in the sheet carries a known header.
    #[error("No {format} header row found in sheet '{sheet}'")]
    NoHeaderRow { format: SourceKind, sheet: String },

    #[error("Could not tell which registration system produced sheet '{0}'")]
    UnknownSource(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl Error {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFile(msg.into())
    }

    /// True for the "nothing recognisable in this sheet" family of failures.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Error::NoHeaderRow { .. } | Error::UnknownSource(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
