// Entity Models
//
// Players are the only entity the import creates and updates. Lookups are
// read-only, memberships are create-only.

pub mod player;
pub mod lookup;
pub mod membership;

pub use player::{NewPlayer, Player, PlayerChanges, PlayerField, PlayerFields, PlayerUpdate};
pub use lookup::{names_match, Division, League, LookupTables, Season, Team};
pub use membership::{
    MembershipColumn, MembershipFields, MembershipKey, MtsaField, MtsaFields, MtsaMembership,
    NewMtsaMembership, NewTnMembership, TnMembership, TnSoccerField,
    TnSoccerFields,
};
