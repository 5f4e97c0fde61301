//! Parser for the .vars file format

use crate::error::{Result, VarchainError};
use std::fs;
use std::path::Path;
use varchain_engine::engine::VarId;

/// One `IDENT: FORMULA` line of a .vars file.
#[derive(Clone, Debug, PartialEq)]
pub struct VarsEntry {
    /// 1-based source line
    pub line: usize,
    pub id: VarId,
    pub formula: String,
}

/// Parse a .vars file into entries, in file order
pub fn parse_vars(path: &Path) -> Result<Vec<VarsEntry>> {
    let content = fs::read_to_string(path)?;
    parse_vars_content(&content)
}

/// Parse .vars content from a string
pub fn parse_vars_content(content: &str) -> Result<Vec<VarsEntry>> {
    let mut entries = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((ident_str, formula)) = line.split_once(':') else {
            return Err(VarchainError::Parse {
                line: line_num + 1,
                message: "Expected 'IDENT: FORMULA' format".to_string(),
            });
        };

        let ident_str = ident_str.trim();
        let id = VarId::from_str(ident_str).ok_or_else(|| VarchainError::Parse {
            line: line_num + 1,
            message: format!("Invalid identifier: {}", ident_str),
        })?;

        entries.push(VarsEntry {
            line: line_num + 1,
            id,
            formula: unescape_vars_text(formula.trim()),
        });
    }

    Ok(entries)
}

fn unescape_vars_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('\\') => out.push('\\'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(name: &str) -> VarId {
        VarId::from_str(name).unwrap()
    }

    #[test]
    fn test_parse_entries_in_order() {
        let content = r#"
# Test chain
VAR_1: 1
var_2: 2

VAR_3: VAR_1 + VAR_2
"#;
        let entries = parse_vars_content(content).unwrap();
        assert_eq!(
            entries,
            vec![
                VarsEntry { line: 3, id: id("VAR_1"), formula: "1".to_string() },
                VarsEntry { line: 4, id: id("VAR_2"), formula: "2".to_string() },
                VarsEntry { line: 6, id: id("VAR_3"), formula: "VAR_1 + VAR_2".to_string() },
            ]
        );
    }

    #[test]
    fn test_parse_empty_formula() {
        let entries = parse_vars_content("A:").unwrap();
        assert_eq!(entries[0].formula, "");
    }

    #[test]
    fn test_parse_unescapes_formula_text() {
        let entries = parse_vars_content(r#"A: 1 +\n2
S: "a\\"b" + "\t""#).unwrap();
        assert_eq!(entries[0].formula, "1 +\n2");
        assert_eq!(entries[1].formula, r#""a\"b" + "\t""#);
    }

    #[test]
    fn test_missing_separator_reports_line() {
        let err = parse_vars_content("A: 1\nB 2").unwrap_err();
        match err {
            VarchainError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_identifier_reports_line() {
        let err = parse_vars_content("# c\n2X: 1").unwrap_err();
        match err {
            VarchainError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("2X"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
