//! Variable identifier parsing and normalization.
//!
//! Identifiers follow the usual naming pattern (`[A-Za-z_][A-Za-z0-9_]*`)
//! and are case-normalized to ASCII upper case, so `var_1` and `VAR_1`
//! name the same variable.
//!
//! # Examples
//!
//! ```ignore
//! let id = VarId::from_str("var_3").unwrap();
//! assert_eq!(id.as_str(), "VAR_3");
//! assert_eq!(id.to_string(), "VAR_3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::OnceLock;

/// A normalized variable identifier.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VarId(String);

impl VarId {
    /// Parse and normalize an identifier.
    /// Returns None if the input does not match the identifier pattern.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<VarId> {
        Self::parse_ident(name)
    }

    fn parse_ident(name: &str) -> Option<VarId> {
        let name = name.trim();
        if !ident_re().is_match(name) {
            return None;
        }
        Some(VarId(name.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `ch` may appear inside an identifier.
    pub fn is_ident_char(ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '_'
    }

    /// Whether `ch` may start an identifier.
    pub fn is_ident_start(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    /// Case-insensitive comparison against raw formula text.
    pub fn matches(&self, token: &str) -> bool {
        self.0.eq_ignore_ascii_case(token)
    }
}

fn ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex must compile")
    })
}

impl std::str::FromStr for VarId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_ident(s).ok_or_else(|| format!("Invalid identifier: {}", s))
    }
}

impl TryFrom<String> for VarId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VarId> for String {
    fn from(id: VarId) -> String {
        id.0
    }
}

impl Borrow<str> for VarId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VarId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::VarId;

    #[test]
    fn test_from_str_normalizes_case() {
        let id = VarId::from_str("var_1").unwrap();
        assert_eq!(id.as_str(), "VAR_1");
        assert_eq!(id, VarId::from_str("VAR_1").unwrap());
    }

    #[test]
    fn test_from_str_trims_whitespace() {
        assert_eq!(VarId::from_str("  total ").unwrap().as_str(), "TOTAL");
    }

    #[test]
    fn test_from_str_invalid_inputs() {
        assert!(VarId::from_str("").is_none());
        assert!(VarId::from_str("1VAR").is_none());
        assert!(VarId::from_str("VAR 1").is_none());
        assert!(VarId::from_str("VAR-1").is_none());
        assert!(VarId::from_str("$1").is_none());
    }

    #[test]
    fn test_underscore_start_is_valid() {
        assert_eq!(VarId::from_str("_tmp").unwrap().as_str(), "_TMP");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let id = VarId::from_str("VAR_1").unwrap();
        assert!(id.matches("var_1"));
        assert!(!id.matches("VAR_10"));
    }

    #[test]
    fn test_parse_trait_reports_input() {
        let err = "9x".parse::<VarId>().unwrap_err();
        assert!(err.contains("9x"));
    }
}
