//! Writer for the .vars file format

use crate::error::Result;
use std::fs;
use std::path::Path;
use varchain_engine::engine::Chain;

/// Write a chain to a .vars file
pub fn write_vars(path: &Path, chain: &Chain) -> Result<()> {
    let content = write_vars_content(chain);
    fs::write(path, content)?;
    Ok(())
}

/// Write a chain to a .vars format string, one variable per line in chain order
pub fn write_vars_content(chain: &Chain) -> String {
    let mut lines = vec!["# Varchain variables".to_string()];
    for variable in chain {
        let formula = escape_vars_text(variable.formula.trim());
        if formula.is_empty() {
            lines.push(format!("{}:", variable.id));
        } else {
            lines.push(format!("{}: {}", variable.id, formula));
        }
    }
    lines.join("\n") + "\n"
}

/// Keep every formula on one line: backslashes and line breaks are escaped.
fn escape_vars_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}
