// 📋 Season Memberships - a player registered for one season
//
// Two flavors, one per registration system:
// - TN Soccer: (player, season), plus play level details
// - MTSA:      (player, season, team, division), plus order/payment details
//
// Memberships are only ever created by the import; never updated or deleted.

use crate::dates::serial_to_timestamp;
use crate::sheet::Cell;
use serde::{Deserialize, Serialize};

// ============================================================================
// SOURCE-SPECIFIC FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TnSoccerField {
    PlayType,
    TeamId,
    Age,
    PlayLevel,
    TeamName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MtsaField {
    OtherPhone,
    OrderDate,
    OrderNo,
    OrderDetailDescription,
    OrderItemAmount,
    OrderItemAmountPaid,
    OrderItemBalance,
    OrderPaymentStatus,
    DivisionName,
    TeamName,
    ProgramName,
}

/// A header that belongs to the membership field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipColumn {
    TnSoccer(TnSoccerField),
    Mtsa(MtsaField),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TnSoccerFields {
    pub play_type: Option<String>,
    /// TN Soccer's team number (free text, not a teams.id)
    pub tn_team_id: Option<String>,
    pub age: Option<String>,
    pub play_level: Option<String>,
    pub team_name: Option<String>,
}

impl TnSoccerFields {
    pub fn set(&mut self, field: TnSoccerField, cell: &Cell) {
        let value = cell.to_field_text();
        match field {
            TnSoccerField::PlayType => self.play_type = value,
            TnSoccerField::TeamId => self.tn_team_id = value,
            TnSoccerField::Age => self.age = value,
            TnSoccerField::PlayLevel => self.play_level = value,
            TnSoccerField::TeamName => self.team_name = value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MtsaFields {
    pub other_phone: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS` when the sheet held a serial, else the text as-is
    pub order_date: Option<String>,
    pub order_no: Option<String>,
    pub order_detail_description: Option<String>,
    pub order_item_amount: Option<f64>,
    pub order_item_amount_paid: Option<f64>,
    pub order_item_balance: Option<f64>,
    pub order_payment_status: Option<String>,

    // Vendor names, resolved to ids and dropped before persistence
    pub division_name: Option<String>,
    pub team_name: Option<String>,
    pub program_name: Option<String>,
}

impl MtsaFields {
    pub fn set(&mut self, field: MtsaField, cell: &Cell) {
        match field {
            MtsaField::OtherPhone => self.other_phone = cell.to_field_text(),
            MtsaField::OrderDate => {
                self.order_date = match cell {
                    Cell::Number(serial) => serial_to_timestamp(*serial),
                    _ => cell.to_field_text(),
                }
            }
            MtsaField::OrderNo => self.order_no = cell.to_field_text(),
            MtsaField::OrderDetailDescription => {
                self.order_detail_description = cell.to_field_text()
            }
            MtsaField::OrderItemAmount => self.order_item_amount = cell.to_number(),
            MtsaField::OrderItemAmountPaid => self.order_item_amount_paid = cell.to_number(),
            MtsaField::OrderItemBalance => self.order_item_balance = cell.to_number(),
            MtsaField::OrderPaymentStatus => self.order_payment_status = cell.to_field_text(),
            MtsaField::DivisionName => self.division_name = cell.to_field_text(),
            MtsaField::TeamName => self.team_name = cell.to_field_text(),
            MtsaField::ProgramName => self.program_name = cell.to_field_text(),
        }
    }
}

/// Membership field group of an upload row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MembershipFields {
    TnSoccer(TnSoccerFields),
    Mtsa(MtsaFields),
}

impl MembershipFields {
    /// Store a cell; a column from the other source is ignored.
    pub fn set(&mut self, column: MembershipColumn, cell: &Cell) {
        if cell.is_empty() {
            return;
        }

        match (self, column) {
            (MembershipFields::TnSoccer(fields), MembershipColumn::TnSoccer(field)) => {
                fields.set(field, cell)
            }
            (MembershipFields::Mtsa(fields), MembershipColumn::Mtsa(field)) => {
                fields.set(field, cell)
            }
            _ => {}
        }
    }
}

// ============================================================================
// MEMBERSHIP KEY
// ============================================================================

/// The tuple that must be unique among memberships of one flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipKey {
    TnSoccer {
        player_id: i64,
        season_id: i64,
    },
    Mtsa {
        player_id: i64,
        season_id: i64,
        team_id: i64,
        division_id: i64,
    },
}

// ============================================================================
// TN SOCCER MEMBERSHIP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTnMembership {
    pub player_id: i64,
    pub season_id: i64,
    pub play_type: Option<String>,
    pub tn_team_id: Option<String>,
    pub age: Option<String>,
    pub play_level: Option<String>,
    pub team_name: Option<String>,
}

impl NewTnMembership {
    pub fn new(player_id: i64, season_id: i64, fields: &TnSoccerFields) -> Self {
        NewTnMembership {
            player_id,
            season_id,
            play_type: fields.play_type.clone(),
            tn_team_id: fields.tn_team_id.clone(),
            age: fields.age.clone(),
            play_level: fields.play_level.clone(),
            team_name: fields.team_name.clone(),
        }
    }

    pub fn key(&self) -> MembershipKey {
        MembershipKey::TnSoccer {
            player_id: self.player_id,
            season_id: self.season_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TnMembership {
    pub id: i64,
    #[serde(flatten)]
    pub record: NewTnMembership,
}

impl TnMembership {
    pub fn key(&self) -> MembershipKey {
        self.record.key()
    }
}

// ============================================================================
// MTSA MEMBERSHIP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMtsaMembership {
    pub player_id: i64,
    pub season_id: i64,
    pub team_id: i64,
    pub division_id: i64,
    pub other_phone: Option<String>,
    pub order_date: Option<String>,
    pub order_no: Option<String>,
    pub order_detail_description: Option<String>,
    pub order_item_amount: Option<f64>,
    pub order_item_amount_paid: Option<f64>,
    pub order_item_balance: Option<f64>,
    pub order_payment_status: Option<String>,
}

impl NewMtsaMembership {
    /// Build the record from resolved ids. Division, team and program names
    /// are left behind.
    pub fn new(
        player_id: i64,
        season_id: i64,
        team_id: i64,
        division_id: i64,
        fields: &MtsaFields,
    ) -> Self {
        NewMtsaMembership {
            player_id,
            season_id,
            team_id,
            division_id,
            other_phone: fields.other_phone.clone(),
            order_date: fields.order_date.clone(),
            order_no: fields.order_no.clone(),
            order_detail_description: fields.order_detail_description.clone(),
            order_item_amount: fields.order_item_amount,
            order_item_amount_paid: fields.order_item_amount_paid,
            order_item_balance: fields.order_item_balance,
            order_payment_status: fields.order_payment_status.clone(),
        }
    }

    pub fn key(&self) -> MembershipKey {
        MembershipKey::Mtsa {
            player_id: self.player_id,
            season_id: self.season_id,
            team_id: self.team_id,
            division_id: self.division_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtsaMembership {
    pub id: i64,
    #[serde(flatten)]
    pub record: NewMtsaMembership,
}

impl MtsaMembership {
    pub fn key(&self) -> MembershipKey {
        self.record.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mtsa_order_date_serial_becomes_timestamp() {
        let mut fields = MtsaFields::default();
        fields.set(MtsaField::OrderDate, &Cell::Number(45000.5));
        assert_eq!(fields.order_date.as_deref(), Some("2023-03-15 12:00:00"));

        fields.set(MtsaField::OrderDate, &Cell::text("2023-03-15"));
        assert_eq!(fields.order_date.as_deref(), Some("2023-03-15"));
    }

    #[test]
    fn test_mtsa_amounts() {
        let mut fields = MtsaFields::default();
        fields.set(MtsaField::OrderItemAmount, &Cell::text("$150.00"));
        fields.set(MtsaField::OrderItemBalance, &Cell::Number(0.0));
        assert_eq!(fields.order_item_amount, Some(150.0));
        assert_eq!(fields.order_item_balance, Some(0.0));
    }

    #[test]
    fn test_membership_fields_ignore_other_source() {
        let mut fields = MembershipFields::TnSoccer(TnSoccerFields::default());
        fields.set(
            MembershipColumn::Mtsa(MtsaField::TeamName),
            &Cell::text("Strikers"),
        );
        fields.set(
            MembershipColumn::TnSoccer(TnSoccerField::PlayLevel),
            &Cell::text("Rec"),
        );

        let MembershipFields::TnSoccer(tn) = fields else {
            panic!("flavor changed");
        };
        assert_eq!(tn.play_level.as_deref(), Some("Rec"));
        assert_eq!(tn.team_name, None);
    }

    #[test]
    fn test_new_mtsa_membership_drops_vendor_names() {
        let fields = MtsaFields {
            order_no: Some("A-100".to_string()),
            division_name: Some("G U10".to_string()),
            team_name: Some("Strikers".to_string()),
            program_name: Some("Fall Rec".to_string()),
            ..Default::default()
        };
        let record = NewMtsaMembership::new(1, 2, 3, 4, &fields);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["order_no"], "A-100");
        assert!(json.get("division_name").is_none());
        assert!(json.get("team_name").is_none());
        assert!(json.get("program_name").is_none());
        assert_eq!(
            record.key(),
            MembershipKey::Mtsa {
                player_id: 1,
                season_id: 2,
                team_id: 3,
                division_id: 4
            }
        );
    }
}
