// ⚽ Player Entity - the canonical registrant
//
// "The players table is the only record of a child; every registration
// system points at it through the derived unique key."
//
// Three shapes live here:
// - Player:        a stored row (has an id)
// - PlayerFields:  the canonical field group of one upload row
// - PlayerChanges: only the fields an upload would change on a stored row

use crate::dates::DateCode;
use crate::identity::{Keyed, UniqueKey};
use crate::sheet::Cell;
use serde::{Deserialize, Serialize};

// ============================================================================
// PLAYER FIELD
// ============================================================================

/// Canonical player attribute, whatever the source header called it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerField {
    PlayerId,
    LastName,
    FirstName,
    Dob,
    Gender,
    Address,
    City,
    State,
    Zip,
    Phone,
    Email,
}

impl PlayerField {
    pub const ALL: [PlayerField; 11] = [
        PlayerField::PlayerId,
        PlayerField::LastName,
        PlayerField::FirstName,
        PlayerField::Dob,
        PlayerField::Gender,
        PlayerField::Address,
        PlayerField::City,
        PlayerField::State,
        PlayerField::Zip,
        PlayerField::Phone,
        PlayerField::Email,
    ];
}

// ============================================================================
// PLAYER (stored)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,

    /// TN Soccer's own player number, once known
    pub player_id: Option<String>,

    pub last_name: String,
    pub first_name: String,

    /// Legacy day-count; `None` when the source date was unusable
    pub dob: Option<f64>,

    pub gender: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    pub fn from_new(id: i64, new: NewPlayer) -> Self {
        Player {
            id,
            player_id: new.player_id,
            last_name: new.last_name,
            first_name: new.first_name,
            dob: new.dob,
            gender: new.gender,
            address: new.address,
            city: new.city,
            state: new.state,
            zip: new.zip,
            phone: new.phone,
            email: new.email,
        }
    }

    /// Apply an update the way the gateway does: untouched fields stay.
    pub fn apply(&mut self, changes: &PlayerChanges) {
        fn set(target: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        set(&mut self.player_id, &changes.player_id);
        if let Some(last) = &changes.last_name {
            self.last_name = last.clone();
        }
        if let Some(first) = &changes.first_name {
            self.first_name = first.clone();
        }
        if let Some(dob) = changes.dob {
            self.dob = Some(dob);
        }
        set(&mut self.gender, &changes.gender);
        set(&mut self.address, &changes.address);
        set(&mut self.city, &changes.city);
        set(&mut self.state, &changes.state);
        set(&mut self.zip, &changes.zip);
        set(&mut self.phone, &changes.phone);
        set(&mut self.email, &changes.email);
    }
}

impl Keyed for Player {
    fn unique_key(&self) -> Option<UniqueKey> {
        UniqueKey::derive(
            Some(self.last_name.as_str()),
            Some(self.first_name.as_str()),
            &DateCode::from_stored(self.dob),
        )
    }
}

/// A player row waiting for the gateway to give it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub player_id: Option<String>,
    pub last_name: String,
    pub first_name: String,
    pub dob: Option<f64>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// ============================================================================
// PLAYER FIELDS (one upload row)
// ============================================================================

/// Canonical field group of an upload row. `None` means the column was
/// missing from the sheet or the cell was blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFields {
    pub player_id: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub dob: Option<DateCode>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl PlayerFields {
    /// Store a cell under its canonical field.
    ///
    /// Names only count when the cell is text; a number in a name column
    /// leaves the row unkeyable.
    pub fn set(&mut self, field: PlayerField, cell: &Cell) {
        if cell.is_empty() {
            return;
        }

        match field {
            PlayerField::LastName => self.last_name = cell.trimmed_text(),
            PlayerField::FirstName => self.first_name = cell.trimmed_text(),
            PlayerField::Dob => self.dob = Some(cell.to_date_code()),
            PlayerField::PlayerId => self.player_id = cell.to_field_text(),
            PlayerField::Gender => self.gender = cell.to_field_text(),
            PlayerField::Address => self.address = cell.to_field_text(),
            PlayerField::City => self.city = cell.to_field_text(),
            PlayerField::State => self.state = cell.to_field_text(),
            PlayerField::Zip => self.zip = cell.to_field_text(),
            PlayerField::Phone => self.phone = cell.to_field_text(),
            PlayerField::Email => self.email = cell.to_field_text(),
        }
    }

    pub fn dob_code(&self) -> DateCode {
        self.dob.unwrap_or(DateCode::Invalid)
    }

    /// The row as a new player; `None` when it has no usable names.
    pub fn to_new_player(&self) -> Option<NewPlayer> {
        Some(NewPlayer {
            player_id: self.player_id.clone(),
            last_name: self.last_name.clone()?,
            first_name: self.first_name.clone()?,
            dob: self.dob.and_then(|d| d.serial()),
            gender: self.gender.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip: self.zip.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
        })
    }

    /// Fields present in this row whose value differs from `stored`.
    ///
    /// Absent fields are never compared, and an invalid date never replaces
    /// a stored one.
    pub fn diff(&self, stored: &Player) -> PlayerChanges {
        fn changed(row: &Option<String>, stored: Option<&str>) -> Option<String> {
            match row {
                Some(value) if Some(value.as_str()) != stored => Some(value.clone()),
                _ => None,
            }
        }

        PlayerChanges {
            player_id: changed(&self.player_id, stored.player_id.as_deref()),
            last_name: changed(&self.last_name, Some(stored.last_name.as_str())),
            first_name: changed(&self.first_name, Some(stored.first_name.as_str())),
            dob: match self.dob {
                Some(DateCode::Serial(serial)) if stored.dob != Some(serial) => Some(serial),
                _ => None,
            },
            gender: changed(&self.gender, stored.gender.as_deref()),
            address: changed(&self.address, stored.address.as_deref()),
            city: changed(&self.city, stored.city.as_deref()),
            state: changed(&self.state, stored.state.as_deref()),
            zip: changed(&self.zip, stored.zip.as_deref()),
            phone: changed(&self.phone, stored.phone.as_deref()),
            email: changed(&self.email, stored.email.as_deref()),
        }
    }
}

impl Keyed for PlayerFields {
    fn unique_key(&self) -> Option<UniqueKey> {
        UniqueKey::derive(
            self.last_name.as_deref(),
            self.first_name.as_deref(),
            &self.dob_code(),
        )
    }
}

// ============================================================================
// PLAYER CHANGES / UPDATE
// ============================================================================

/// Only the fields an update touches. Serializes without the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PlayerChanges {
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Which fields this update carries, in canonical order.
    pub fn fields(&self) -> Vec<PlayerField> {
        PlayerField::ALL
            .into_iter()
            .filter(|field| match field {
                PlayerField::PlayerId => self.player_id.is_some(),
                PlayerField::LastName => self.last_name.is_some(),
                PlayerField::FirstName => self.first_name.is_some(),
                PlayerField::Dob => self.dob.is_some(),
                PlayerField::Gender => self.gender.is_some(),
                PlayerField::Address => self.address.is_some(),
                PlayerField::City => self.city.is_some(),
                PlayerField::State => self.state.is_some(),
                PlayerField::Zip => self.zip.is_some(),
                PlayerField::Phone => self.phone.is_some(),
                PlayerField::Email => self.email.is_some(),
            })
            .collect()
    }

    /// Lay `later` over `self`; fields set in `later` win.
    pub fn merge(&mut self, later: PlayerChanges) {
        fn take<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        take(&mut self.player_id, later.player_id);
        take(&mut self.last_name, later.last_name);
        take(&mut self.first_name, later.first_name);
        take(&mut self.dob, later.dob);
        take(&mut self.gender, later.gender);
        take(&mut self.address, later.address);
        take(&mut self.city, later.city);
        take(&mut self.state, later.state);
        take(&mut self.zip, later.zip);
        take(&mut self.phone, later.phone);
        take(&mut self.email, later.email);
    }
}

/// Changed fields for one stored player, keyed by its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub id: i64,
    #[serde(flatten)]
    pub changes: PlayerChanges,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_player() -> Player {
        Player {
            id: 7,
            player_id: None,
            last_name: "Doe".to_string(),
            first_name: "Jane".to_string(),
            dob: Some(40180.0),
            gender: Some("F".to_string()),
            address: Some("1 Main St".to_string()),
            city: Some("Nashville".to_string()),
            state: Some("TN".to_string()),
            zip: Some("37201".to_string()),
            phone: Some("615-555-0100".to_string()),
            email: None,
        }
    }

    #[test]
    fn test_set_fields_from_cells() {
        let mut fields = PlayerFields::default();
        fields.set(PlayerField::LastName, &Cell::text(" Doe "));
        fields.set(PlayerField::FirstName, &Cell::text("Jane"));
        fields.set(PlayerField::Dob, &Cell::text("01/02/2010"));
        fields.set(PlayerField::Zip, &Cell::Number(37201.0));
        fields.set(PlayerField::City, &Cell::Empty);

        assert_eq!(fields.last_name.as_deref(), Some("Doe"));
        assert_eq!(fields.dob, Some(DateCode::Serial(40180.0)));
        assert_eq!(fields.zip.as_deref(), Some("37201"));
        assert_eq!(fields.city, None);
        assert_eq!(fields.unique_key().unwrap().as_str(), "doe_jane_40180");
    }

    #[test]
    fn test_numeric_name_is_unkeyable() {
        let mut fields = PlayerFields::default();
        fields.set(PlayerField::LastName, &Cell::Number(12.0));
        fields.set(PlayerField::FirstName, &Cell::text("Jane"));
        assert_eq!(fields.unique_key(), None);
        assert_eq!(fields.to_new_player(), None);
    }

    #[test]
    fn test_diff_only_changed_present_fields() {
        let stored = stored_player();
        let fields = PlayerFields {
            last_name: Some("Doe".to_string()),
            first_name: Some("Jane".to_string()),
            dob: Some(DateCode::Serial(40180.0)),
            city: Some("Franklin".to_string()),
            zip: Some("37201".to_string()),
            ..Default::default()
        };

        let changes = fields.diff(&stored);
        assert_eq!(changes.fields(), vec![PlayerField::City]);
        assert_eq!(changes.city.as_deref(), Some("Franklin"));

        let json = serde_json::to_value(PlayerUpdate { id: stored.id, changes }).unwrap();
        assert_eq!(json, serde_json::json!({"id": 7, "city": "Franklin"}));
    }

    #[test]
    fn test_diff_fills_missing_external_id() {
        let stored = stored_player();
        let fields = PlayerFields {
            player_id: Some("TN-4411".to_string()),
            ..Default::default()
        };
        assert_eq!(fields.diff(&stored).fields(), vec![PlayerField::PlayerId]);
    }

    #[test]
    fn test_diff_ignores_invalid_dob() {
        let stored = stored_player();
        let fields = PlayerFields {
            dob: Some(DateCode::Invalid),
            ..Default::default()
        };
        assert!(fields.diff(&stored).is_empty());
    }

    #[test]
    fn test_merge_later_wins() {
        let mut first = PlayerChanges {
            city: Some("Franklin".to_string()),
            phone: Some("1".to_string()),
            ..Default::default()
        };
        first.merge(PlayerChanges {
            phone: Some("2".to_string()),
            ..Default::default()
        });
        assert_eq!(first.city.as_deref(), Some("Franklin"));
        assert_eq!(first.phone.as_deref(), Some("2"));
    }

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let mut player = stored_player();
        player.apply(&PlayerChanges {
            city: Some("Franklin".to_string()),
            ..Default::default()
        });
        assert_eq!(player.city.as_deref(), Some("Franklin"));
        assert_eq!(player.zip.as_deref(), Some("37201"));
    }

    #[test]
    fn test_stored_player_key() {
        let mut player = stored_player();
        assert_eq!(player.unique_key().unwrap().as_str(), "doe_jane_40180");
        player.dob = None;
        assert_eq!(player.unique_key().unwrap().as_str(), "doe_jane_nan");
    }
}
