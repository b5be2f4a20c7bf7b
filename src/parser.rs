// 🏗️ Upload Formats - header location and row mapping
// One format per registration system: TN Soccer and MTSA
//
// Neither export starts at row 1 reliably (title rows, report banners), so the
// header row is found by content: the first row holding at least one text cell
// that exactly equals a known header. Every later row is mapped column by
// column into PlayerFields + the source's membership fields.

use crate::entities::{
    MembershipColumn, MembershipFields, MtsaField, MtsaFields, PlayerField, PlayerFields,
    TnSoccerField, TnSoccerFields,
};
use crate::error::{Error, Result};
use crate::identity::{Keyed, UniqueKey};
use crate::sheet::{populated_cells, Cell, Sheet};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceKind - which registration system exported the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    TnSoccer,
    Mtsa,
}

impl SourceKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::TnSoccer => "TN Soccer",
            SourceKind::Mtsa => "MTSA",
        }
    }

    /// Short code, as accepted on the command line
    pub fn code(&self) -> &'static str {
        match self {
            SourceKind::TnSoccer => "tn-soccer",
            SourceKind::Mtsa => "mtsa",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "tn-soccer" | "tnsoccer" | "tn" => Ok(SourceKind::TnSoccer),
            "mtsa" => Ok(SourceKind::Mtsa),
            other => Err(format!("unknown source '{}' (expected tn-soccer or mtsa)", other)),
        }
    }
}

/// UploadRow - one keyed data row, ready for reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRow {
    /// 1-based line in the sheet
    pub line: usize,
    pub unique_key: UniqueKey,
    pub player: PlayerFields,
    pub membership: MembershipFields,
}

/// ParsedUpload - output of UploadFormat::parse()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedUpload {
    pub source: SourceKind,
    pub sheet_name: String,

    /// 1-based line of the header row
    pub header_row: usize,

    pub rows: Vec<UploadRow>,

    /// Rows dropped for too few populated cells or no usable names
    pub rejected: usize,
}

// ============================================================================
// HEADER VOCABULARIES
// ============================================================================

pub const TN_SOCCER_PLAYER_HEADERS: [(&str, PlayerField); 11] = [
    ("PlayerID", PlayerField::PlayerId),
    ("Last Name", PlayerField::LastName),
    ("First Name", PlayerField::FirstName),
    ("DOB", PlayerField::Dob),
    ("Gender", PlayerField::Gender),
    ("Address", PlayerField::Address),
    ("City", PlayerField::City),
    ("State", PlayerField::State),
    ("Zip", PlayerField::Zip),
    ("Home Ph#", PlayerField::Phone),
    ("email", PlayerField::Email),
];

pub const TN_SOCCER_MEMBERSHIP_HEADERS: [(&str, TnSoccerField); 5] = [
    ("Play Type", TnSoccerField::PlayType),
    ("TeamID", TnSoccerField::TeamId),
    ("Age", TnSoccerField::Age),
    ("Play Level", TnSoccerField::PlayLevel),
    ("Team Name", TnSoccerField::TeamName),
];

pub const MTSA_PLAYER_HEADERS: [(&str, PlayerField); 10] = [
    ("Player Last Name", PlayerField::LastName),
    ("Player First Name", PlayerField::FirstName),
    ("Street Address", PlayerField::Address),
    ("Player Birth Date", PlayerField::Dob),
    ("Gender", PlayerField::Gender),
    ("City", PlayerField::City),
    ("State", PlayerField::State),
    ("Postal Code", PlayerField::Zip),
    ("Cellphone", PlayerField::Phone),
    ("User Email", PlayerField::Email),
];

pub const MTSA_MEMBERSHIP_HEADERS: [(&str, MtsaField); 11] = [
    ("Other Phone", MtsaField::OtherPhone),
    ("Order Date", MtsaField::OrderDate),
    ("Order No", MtsaField::OrderNo),
    ("Order Detail Description", MtsaField::OrderDetailDescription),
    ("OrderItem Amount", MtsaField::OrderItemAmount),
    ("OrderItem Amount Paid", MtsaField::OrderItemAmountPaid),
    ("OrderItem Balance", MtsaField::OrderItemBalance),
    ("Order Payment Status", MtsaField::OrderPaymentStatus),
    ("Division Name", MtsaField::DivisionName),
    ("Team Name", MtsaField::TeamName),
    ("Program Name", MtsaField::ProgramName),
];

pub const TN_SOCCER_MIN_POPULATED_CELLS: usize = 5;
pub const MTSA_MIN_POPULATED_CELLS: usize = 1;

/// What a header column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Player(PlayerField),
    Membership(MembershipColumn),
}

// ============================================================================
// UPLOAD FORMAT TRAIT
// ============================================================================

/// UploadFormat - one registration system's spreadsheet shape
///
/// Implementors only describe their vocabulary; locating the header and
/// mapping rows is shared.
pub trait UploadFormat {
    fn source(&self) -> SourceKind;

    fn player_headers(&self) -> &'static [(&'static str, PlayerField)];

    fn membership_column(&self, header: &str) -> Option<MembershipColumn>;

    /// Fresh membership field group for one row
    fn empty_membership(&self) -> MembershipFields;

    /// Rows with fewer populated cells are rejected
    fn min_populated_cells(&self) -> usize;

    fn player_field(&self, header: &str) -> Option<PlayerField> {
        self.player_headers()
            .iter()
            .find(|(name, _)| *name == header)
            .map(|(_, field)| *field)
    }

    fn column(&self, header: &str) -> Option<Column> {
        self.player_field(header)
            .map(Column::Player)
            .or_else(|| self.membership_column(header).map(Column::Membership))
    }

    fn recognizes(&self, header: &str) -> bool {
        self.column(header).is_some()
    }

    fn parse(&self, sheet: &Sheet) -> Result<ParsedUpload> {
        map_rows(self, sheet)
    }
}

/// TN Soccer player export
pub struct TnSoccerFormat {
    min_populated_cells: usize,
}

impl TnSoccerFormat {
    pub fn new() -> Self {
        TnSoccerFormat {
            min_populated_cells: TN_SOCCER_MIN_POPULATED_CELLS,
        }
    }

    /// Builder pattern: override the row minimum
    pub fn with_min_populated_cells(mut self, min: usize) -> Self {
        self.min_populated_cells = min;
        self
    }
}

impl Default for TnSoccerFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadFormat for TnSoccerFormat {
    fn source(&self) -> SourceKind {
        SourceKind::TnSoccer
    }

    fn player_headers(&self) -> &'static [(&'static str, PlayerField)] {
        &TN_SOCCER_PLAYER_HEADERS
    }

    fn membership_column(&self, header: &str) -> Option<MembershipColumn> {
        TN_SOCCER_MEMBERSHIP_HEADERS
            .iter()
            .find(|(name, _)| *name == header)
            .map(|(_, field)| MembershipColumn::TnSoccer(*field))
    }

    fn empty_membership(&self) -> MembershipFields {
        MembershipFields::TnSoccer(TnSoccerFields::default())
    }

    fn min_populated_cells(&self) -> usize {
        self.min_populated_cells
    }
}

/// MTSA order export
pub struct MtsaFormat {
    min_populated_cells: usize,
}

impl MtsaFormat {
    pub fn new() -> Self {
        MtsaFormat {
            min_populated_cells: MTSA_MIN_POPULATED_CELLS,
        }
    }

    /// Builder pattern: override the row minimum
    pub fn with_min_populated_cells(mut self, min: usize) -> Self {
        self.min_populated_cells = min;
        self
    }
}

impl Default for MtsaFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadFormat for MtsaFormat {
    fn source(&self) -> SourceKind {
        SourceKind::Mtsa
    }

    fn player_headers(&self) -> &'static [(&'static str, PlayerField)] {
        &MTSA_PLAYER_HEADERS
    }

    fn membership_column(&self, header: &str) -> Option<MembershipColumn> {
        MTSA_MEMBERSHIP_HEADERS
            .iter()
            .find(|(name, _)| *name == header)
            .map(|(_, field)| MembershipColumn::Mtsa(*field))
    }

    fn empty_membership(&self) -> MembershipFields {
        MembershipFields::Mtsa(MtsaFields::default())
    }

    fn min_populated_cells(&self) -> usize {
        self.min_populated_cells
    }
}

/// Get the format for a source, with its default row minimum
///
/// Factory pattern: Returns Box<dyn UploadFormat> for polymorphism
pub fn get_format(source: SourceKind) -> Box<dyn UploadFormat> {
    match source {
        SourceKind::TnSoccer => Box::new(TnSoccerFormat::new()),
        SourceKind::Mtsa => Box::new(MtsaFormat::new()),
    }
}

// ============================================================================
// HEADER LOCATOR & ROW MAPPER
// ============================================================================

/// Find the header row: its index and the column layout it declares.
pub fn locate_header<F: UploadFormat + ?Sized>(
    format: &F,
    sheet: &Sheet,
) -> Option<(usize, Vec<Option<Column>>)> {
    sheet.rows.iter().enumerate().find_map(|(index, row)| {
        let columns: Vec<Option<Column>> = row
            .iter()
            .map(|cell| cell.as_text().and_then(|text| format.column(text)))
            .collect();

        columns
            .iter()
            .any(Option::is_some)
            .then_some((index, columns))
    })
}

/// Map every row below the header into a keyed UploadRow.
///
/// Entirely blank rows are skipped silently; short rows and rows without
/// usable names are counted as rejected.
pub fn map_rows<F: UploadFormat + ?Sized>(format: &F, sheet: &Sheet) -> Result<ParsedUpload> {
    let (header_index, columns) =
        locate_header(format, sheet).ok_or_else(|| Error::NoHeaderRow {
            format: format.source(),
            sheet: sheet.name.clone(),
        })?;

    debug!(
        "{} header found at line {} of '{}'",
        format.source(),
        header_index + 1,
        sheet.name
    );

    let mut rows = Vec::new();
    let mut rejected = 0;

    for (index, row) in sheet.rows.iter().enumerate().skip(header_index + 1) {
        let populated = populated_cells(row);
        if populated == 0 {
            continue;
        }
        if populated < format.min_populated_cells() {
            debug!("Line {}: {} populated cells, rejected", index + 1, populated);
            rejected += 1;
            continue;
        }

        let (player, membership) = map_row(format, &columns, row);
        match player.unique_key() {
            Some(unique_key) => rows.push(UploadRow {
                line: index + 1,
                unique_key,
                player,
                membership,
            }),
            None => {
                debug!("Line {}: no usable player name, rejected", index + 1);
                rejected += 1;
            }
        }
    }

    info!(
        "Mapped {} {} rows from '{}' ({} rejected)",
        rows.len(),
        format.source(),
        sheet.name,
        rejected
    );

    Ok(ParsedUpload {
        source: format.source(),
        sheet_name: sheet.name.clone(),
        header_row: header_index + 1,
        rows,
        rejected,
    })
}

fn map_row<F: UploadFormat + ?Sized>(
    format: &F,
    columns: &[Option<Column>],
    row: &[Cell],
) -> (PlayerFields, MembershipFields) {
    let mut player = PlayerFields::default();
    let mut membership = format.empty_membership();

    for (column, cell) in columns.iter().zip(row) {
        match column {
            Some(Column::Player(field)) => player.set(*field, cell),
            Some(Column::Membership(field)) => membership.set(*field, cell),
            None => {}
        }
    }

    (player, membership)
}

/// Guess the source from the first row one vocabulary recognizes better.
///
/// Rows where both score the same (shared headers only) are passed over; a
/// sheet with nothing but such rows is undecided.
pub fn detect_source(sheet: &Sheet) -> Option<SourceKind> {
    let formats = [get_format(SourceKind::TnSoccer), get_format(SourceKind::Mtsa)];

    for row in &sheet.rows {
        let scores: Vec<usize> = formats
            .iter()
            .map(|format| {
                row.iter()
                    .filter_map(Cell::as_text)
                    .filter(|text| format.recognizes(text))
                    .count()
            })
            .collect();

        let (tn, mtsa) = (scores[0], scores[1]);
        match tn.cmp(&mtsa) {
            std::cmp::Ordering::Greater => return Some(SourceKind::TnSoccer),
            std::cmp::Ordering::Less => return Some(SourceKind::Mtsa),
            std::cmp::Ordering::Equal => {
                if tn > 0 {
                    debug!("Row with {} shared headers does not decide the source", tn);
                }
            }
        }
    }

    None
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateCode;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells
            .iter()
            .map(|c| if c.is_empty() { Cell::Empty } else { Cell::text(*c) })
            .collect()
    }

    fn tn_sheet() -> Sheet {
        Sheet::new(
            "Players",
            vec![
                text_row(&["TN Soccer Player Report"]),
                vec![],
                text_row(&[
                    "PlayerID", "Last Name", "First Name", "DOB", "Gender", "City", "Zip",
                    "Play Level", "Notes",
                ]),
                vec![
                    Cell::text("4411"),
                    Cell::text("Doe"),
                    Cell::text("Jane"),
                    Cell::text("01/02/2010"),
                    Cell::text("F"),
                    Cell::text("Nashville"),
                    Cell::Number(37201.0),
                    Cell::text("Rec"),
                    Cell::text("ignored"),
                ],
                text_row(&["", "Roe", "Rick", "", "", "", "", "", ""]),
                vec![],
                vec![
                    Cell::text("4412"),
                    Cell::Number(12.0),
                    Cell::text("Sam"),
                    Cell::text("03/04/2011"),
                    Cell::text("M"),
                    Cell::text("Franklin"),
                ],
            ],
        )
    }

    #[test]
    fn test_source_kind_names() {
        assert_eq!(SourceKind::TnSoccer.to_string(), "TN Soccer");
        assert_eq!(SourceKind::Mtsa.name(), "MTSA");
        assert_eq!("tn-soccer".parse::<SourceKind>(), Ok(SourceKind::TnSoccer));
        assert_eq!("TN_Soccer".parse::<SourceKind>(), Ok(SourceKind::TnSoccer));
        assert_eq!("MTSA".parse::<SourceKind>(), Ok(SourceKind::Mtsa));
        assert!("affinity".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_locate_header_skips_banner_rows() {
        let sheet = tn_sheet();
        let (index, columns) = locate_header(&TnSoccerFormat::new(), &sheet).unwrap();

        assert_eq!(index, 2);
        assert_eq!(columns[1], Some(Column::Player(PlayerField::LastName)));
        assert_eq!(
            columns[7],
            Some(Column::Membership(MembershipColumn::TnSoccer(TnSoccerField::PlayLevel)))
        );
        assert_eq!(columns[8], None);
    }

    #[test]
    fn test_tn_rows_mapped_and_rejected() {
        let parsed = TnSoccerFormat::new().parse(&tn_sheet()).unwrap();

        assert_eq!(parsed.header_row, 3);
        assert_eq!(parsed.rows.len(), 1);
        // short row + numeric last name; the blank row is not counted
        assert_eq!(parsed.rejected, 2);

        let row = &parsed.rows[0];
        assert_eq!(row.line, 4);
        assert_eq!(row.unique_key.as_str(), "doe_jane_40180");
        assert_eq!(row.player.player_id.as_deref(), Some("4411"));
        assert_eq!(row.player.zip.as_deref(), Some("37201"));
        assert_eq!(row.player.dob, Some(DateCode::Serial(40180.0)));

        let MembershipFields::TnSoccer(tn) = &row.membership else {
            panic!("expected TN Soccer membership fields");
        };
        assert_eq!(tn.play_level.as_deref(), Some("Rec"));

        println!("✅ Mapped {} rows, rejected {}", parsed.rows.len(), parsed.rejected);
    }

    #[test]
    fn test_min_populated_cells_is_configurable() {
        let parsed = TnSoccerFormat::new()
            .with_min_populated_cells(2)
            .parse(&tn_sheet())
            .unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].unique_key.as_str(), "roe_rick_nan");
    }

    #[test]
    fn test_mtsa_single_cell_rows_survive_when_keyable() {
        let sheet = Sheet::new(
            "Orders",
            vec![
                text_row(&["Player Last Name", "Player First Name", "Division Name", "Team Name"]),
                text_row(&["Doe", "Jane", "G U10", "Strikers"]),
                text_row(&["", "", "G U10", ""]),
            ],
        );
        let parsed = MtsaFormat::new().parse(&sheet).unwrap();

        assert_eq!(parsed.source, SourceKind::Mtsa);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rejected, 1);

        let MembershipFields::Mtsa(mtsa) = &parsed.rows[0].membership else {
            panic!("expected MTSA membership fields");
        };
        assert_eq!(mtsa.division_name.as_deref(), Some("G U10"));
        assert_eq!(mtsa.team_name.as_deref(), Some("Strikers"));
    }

    #[test]
    fn test_no_header_is_parse_failure() {
        let sheet = Sheet::new(
            "Junk",
            vec![text_row(&["Name", "Birthday"]), text_row(&["Jane Doe", "1/2/2010"])],
        );
        let err = TnSoccerFormat::new().parse(&sheet).unwrap_err();
        assert!(err.is_parse_failure());
        assert!(matches!(err, Error::NoHeaderRow { format: SourceKind::TnSoccer, .. }));
    }

    #[test]
    fn test_headers_match_exactly() {
        let sheet = Sheet::new("S", vec![text_row(&["last name", "EMAIL"])]);
        assert!(locate_header(&TnSoccerFormat::new(), &sheet).is_none());
    }

    #[test]
    fn test_detect_source() {
        assert_eq!(detect_source(&tn_sheet()), Some(SourceKind::TnSoccer));

        let mtsa = Sheet::new(
            "Orders",
            vec![text_row(&["Order No", "Player Last Name", "Player First Name", "City"])],
        );
        assert_eq!(detect_source(&mtsa), Some(SourceKind::Mtsa));

        // shared headers only
        let ambiguous = Sheet::new("S", vec![text_row(&["Gender", "City", "Team Name"])]);
        assert_eq!(detect_source(&ambiguous), None);

        assert_eq!(detect_source(&Sheet::default()), None);
    }

    #[test]
    fn test_detect_source_looks_past_shared_header_rows() {
        let sheet = Sheet::new(
            "Orders",
            vec![
                text_row(&["Gender", "City", "State", "Team Name"]),
                text_row(&["Player Last Name", "Player First Name", "Order No"]),
                text_row(&["Doe", "Jane", "A-1"]),
            ],
        );
        assert_eq!(detect_source(&sheet), Some(SourceKind::Mtsa));
    }

    #[test]
    fn test_get_format() {
        assert_eq!(get_format(SourceKind::TnSoccer).min_populated_cells(), 5);
        assert_eq!(get_format(SourceKind::Mtsa).min_populated_cells(), 1);
        assert!(get_format(SourceKind::Mtsa).recognizes("OrderItem Balance"));
        assert!(!get_format(SourceKind::TnSoccer).recognizes("OrderItem Balance"));
    }
}
