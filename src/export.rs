// 📤 Affinity Export - players registered with MTSA but missing from TN Soccer
//
// The column order and header text are a contract with the affinity system
// the association submits to; do not reorder. Columns without a source stay
// blank.

use crate::dates::serial_to_datetime;
use crate::entities::{Player, Season};
use crate::error::Result;
use crate::snapshot::Snapshot;
use log::info;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

pub const AFFINITY_SHEET_NAME: &str = "Filtered New Records";

/// Header text and column width, in export order.
pub const AFFINITY_COLUMNS: [(&str, f64); 29] = [
    ("SIDCode", 20.0),
    ("Season", 20.0),
    ("PlayerLastName", 20.0),
    ("PlayerFirstName", 20.0),
    ("MiddleInitialName", 10.0),
    ("PlayerSuffix", 10.0),
    ("Alias", 10.0),
    ("Gender", 10.0),
    ("DOB", 15.0),
    ("PlayLevelCode", 10.0),
    ("Address1", 30.0),
    ("City", 20.0),
    ("State", 15.0),
    ("ZIPCODE", 10.0),
    ("Affinity Use Only", 10.0),
    ("Affinity Use Only2", 10.0),
    ("SeasonID", 10.0),
    ("Home Phone", 10.0),
    ("Cell Phone", 15.0),
    ("Email", 25.0),
    ("Affinity Use Only3", 10.0),
    ("Affinity Use Only4", 10.0),
    ("Affinity Use Only5", 10.0),
    ("Affinity Use Only6", 10.0),
    ("Affinity Use Only7", 10.0),
    ("Alternate Player ID", 25.0),
    ("TeamID", 20.0),
    ("TeamName", 20.0),
    ("School", 20.0),
];

/// A player to submit, with the play level of their last TN Soccer season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingPlayer {
    pub player: Player,
    pub play_type: Option<String>,
}

/// Association and season values repeated on every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffinityContext {
    pub sid_code: Option<String>,
    pub season_name: Option<String>,
    pub season_code: Option<String>,
}

impl AffinityContext {
    /// Values for `season`, taking the code from its league (or the first one).
    pub fn for_season(snapshot: &Snapshot, season: &Season) -> Self {
        let league = snapshot
            .league_for(season)
            .or_else(|| snapshot.leagues.first());

        AffinityContext {
            sid_code: league.and_then(|l| l.sid_code.clone()),
            season_name: season.tnsoccer_season_name.clone(),
            season_code: season.tnsoccer_season_id.clone(),
        }
    }
}

/// One export cell.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Blank,
    Text(String),
    /// Day-count shown as mm/dd/yyyy
    Date(f64),
    /// Whole-number zip shown without decimals
    Zip(f64),
}

impl Value {
    fn text(value: &Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Value::Text(v.to_string()),
            _ => Value::Blank,
        }
    }

    fn zip(value: &Option<String>) -> Self {
        match value.as_deref().map(|z| z.trim().parse::<f64>()) {
            Some(Ok(n)) if n.is_finite() => Value::Zip(n),
            _ => Value::text(value),
        }
    }

    /// Text the affinity system would see in the workbook.
    fn display(&self) -> String {
        match self {
            Value::Blank => String::new(),
            Value::Text(s) => s.clone(),
            Value::Date(serial) => serial_to_datetime(*serial)
                .map(|dt| dt.format("%m/%d/%Y").to_string())
                .unwrap_or_default(),
            Value::Zip(n) => format!("{:.0}", n),
        }
    }
}

fn row_values(context: &AffinityContext, missing: &MissingPlayer) -> Vec<Value> {
    let p = &missing.player;
    let mut row = vec![Value::Blank; AFFINITY_COLUMNS.len()];

    row[0] = Value::text(&context.sid_code);
    row[1] = Value::text(&context.season_name);
    row[2] = Value::Text(p.last_name.trim().to_string());
    row[3] = Value::Text(p.first_name.trim().to_string());
    row[7] = Value::text(&p.gender);
    row[8] = p.dob.map(Value::Date).unwrap_or(Value::Blank);
    row[9] = Value::text(&missing.play_type);
    row[10] = Value::text(&p.address);
    row[11] = Value::text(&p.city);
    row[12] = Value::text(&p.state);
    row[13] = Value::zip(&p.zip);
    row[16] = Value::text(&context.season_code);
    row[18] = Value::text(&p.phone);
    row[19] = Value::text(&p.email);

    row
}

fn build_workbook(context: &AffinityContext, players: &[MissingPlayer]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("mm/dd/yyyy");
    let zip_format = Format::new().set_num_format("0");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(AFFINITY_SHEET_NAME)?;

    for (col, (header, width)) in AFFINITY_COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet.set_column_width(col, *width)?;
        worksheet.write_string(0, col, *header)?;
    }

    for (i, missing) in players.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, value) in row_values(context, missing).iter().enumerate() {
            let col = col as u16;
            match value {
                Value::Blank => {}
                Value::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                Value::Date(serial) => {
                    worksheet.write_number_with_format(row, col, *serial, &date_format)?;
                }
                Value::Zip(n) => {
                    worksheet.write_number_with_format(row, col, *n, &zip_format)?;
                }
            }
        }
    }

    Ok(workbook)
}

/// The export as `.xlsx` bytes.
pub fn affinity_xlsx_bytes(context: &AffinityContext, players: &[MissingPlayer]) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(context, players)?;
    Ok(workbook.save_to_buffer()?)
}

pub fn write_affinity_xlsx(
    path: &Path,
    context: &AffinityContext,
    players: &[MissingPlayer],
) -> Result<()> {
    let mut workbook = build_workbook(context, players)?;
    workbook.save(path)?;
    info!("Wrote {} missing players to {}", players.len(), path.display());
    Ok(())
}

/// Same columns as CSV; dates and zips as the workbook displays them.
pub fn write_affinity_csv<W: Write>(
    writer: W,
    context: &AffinityContext,
    players: &[MissingPlayer],
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(AFFINITY_COLUMNS.iter().map(|(header, _)| *header))?;

    for missing in players {
        let values = row_values(context, missing);
        csv.write_record(values.iter().map(Value::display))?;
    }

    csv.flush()?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
