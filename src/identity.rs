// 🔑 Identity Key - the cross-source join key for players
//
// `{last}_{first}_{dob_code}`, lowercase, whitespace removed from the names.
// Neither registration system shares an id with the players table, so this
// key is the only thing tying a TN Soccer row, an MTSA row and a stored player
// together. Two different children with the same names and birth date will
// collide; that limitation is accepted.

use crate::dates::DateCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived unique key of a player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueKey(String);

impl UniqueKey {
    /// Derive the key, or `None` when either name is missing.
    ///
    /// ```
    /// use roster_sync::dates::DateCode;
    /// use roster_sync::identity::UniqueKey;
    ///
    /// let key = UniqueKey::derive(Some(" Doe"), Some(" Jane "), &DateCode::Serial(40180.0));
    /// assert_eq!(key.unwrap().as_str(), "doe_jane_40180");
    /// ```
    pub fn derive(last_name: Option<&str>, first_name: Option<&str>, dob: &DateCode) -> Option<Self> {
        let last = squeeze(last_name?);
        let first = squeeze(first_name?);
        if last.is_empty() || first.is_empty() {
            return None;
        }

        Some(UniqueKey(
            format!("{}_{}_{}", last, first, dob).to_lowercase(),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can be matched against the players table.
pub trait Keyed {
    fn unique_key(&self) -> Option<UniqueKey>;
}

fn squeeze(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::date_string_to_day_count;

    fn key(last: &str, first: &str, dob: &str) -> Option<UniqueKey> {
        UniqueKey::derive(Some(last), Some(first), &date_string_to_day_count(dob))
    }

    #[test]
    fn test_key_format() {
        let k = key("Doe", "Jane", "01/02/2010").unwrap();
        assert_eq!(k.as_str(), "doe_jane_40180");
    }

    #[test]
    fn test_key_ignores_whitespace() {
        assert_eq!(key("Doe", "Jane", "01/02/2010"), key(" Doe", " Jane ", "01/02/2010"));
        assert_eq!(
            key("Van Der Berg", "Mary Ann", "40180").unwrap().as_str(),
            "vanderberg_maryann_40180"
        );
    }

    #[test]
    fn test_key_ignores_case() {
        assert_eq!(key("DOE", "jane", "01/02/2010"), key("Doe", "Jane", "01/02/2010"));
    }

    #[test]
    fn test_text_and_serial_dob_agree() {
        assert_eq!(key("Doe", "Jane", "01/02/2010"), key("Doe", "Jane", "40180"));
    }

    #[test]
    fn test_unkeyable_without_names() {
        let dob = DateCode::Serial(40180.0);
        assert_eq!(UniqueKey::derive(None, Some("Jane"), &dob), None);
        assert_eq!(UniqueKey::derive(Some("Doe"), None, &dob), None);
        assert_eq!(UniqueKey::derive(Some("  "), Some("Jane"), &dob), None);
    }

    #[test]
    fn test_invalid_dob_uses_nan_sentinel() {
        let k = UniqueKey::derive(Some("Doe"), Some("Jane"), &DateCode::Invalid).unwrap();
        assert_eq!(k.as_str(), "doe_jane_nan");
    }
}
