//! Formula translation at the engine boundary.
//!
//! Variables address each other by identifier; the engine addresses
//! formulas by position. This module handles both directions:
//!
//! - **Batch building**: numeric literals pass through unchanged, everything
//!   else becomes `=expr` with each known identifier rewritten to its
//!   1-based positional address `$n` (`VAR_3 + 1` -> `=$3 + 1`).
//! - **Preprocessing**: inside the engine, `$n` becomes `CELL(n - 1)`, the
//!   builtin that reads another position of the current batch. Integer
//!   literals are promoted to floats so arithmetic is never truncating.
//!
//! Positional addressing is internal. Caller formulas that spell `$` or call
//! `CELL` themselves are translated to a blank entry, which the engine
//! reports as unresolved.

use regex::Regex;
use std::sync::OnceLock;

use super::ident::VarId;
use super::refs::{contains_outside_strings, rewrite_references, scan_identifiers};
use super::variable::Chain;

/// Prefix marking a batch entry as an expression to compute.
pub const EXPRESSION_PREFIX: char = '=';

/// Sigil of a positional address (`$1`).
const ADDRESS_SIGIL: char = '$';

/// Builtins that only generated entries may call.
const ENGINE_ONLY_FUNCTIONS: &[&str] = &["CELL", "Fn"];

/// Format a zero-based position as an engine address (`0` -> `$1`).
pub fn format_address(pos: usize) -> String {
    format!("{}{}", ADDRESS_SIGIL, pos + 1)
}

/// Parse an engine address (`$1` -> `0`). Returns None for `$0` or junk.
pub fn parse_address(address: &str) -> Option<usize> {
    address.strip_prefix(ADDRESS_SIGIL)?.parse::<usize>().ok()?.checked_sub(1)
}

/// Whether the formula is a plain number (passed to the engine unchanged).
///
/// Names such as `inf` or `NaN` are identifiers, not literals.
pub fn is_numeric_literal(formula: &str) -> bool {
    let trimmed = formula.trim();
    let Some(first) = trimmed.chars().next() else {
        return false;
    };
    (first.is_ascii_digit() || matches!(first, '.' | '+' | '-')) && trimmed.parse::<f64>().is_ok()
}

/// Whether caller text reaches for engine addressing directly: a `$`
/// outside string literals, or a call to an engine-only builtin (including
/// method-call syntax such as `(0).CELL()`, and string interpolation).
pub fn uses_engine_addressing(formula: &str) -> bool {
    contains_outside_strings(formula, ADDRESS_SIGIL)
        || formula.contains("${")
        || scan_identifiers(formula)
            .iter()
            .any(|t| !t.reference && ENGINE_ONLY_FUNCTIONS.contains(&t.text(formula)))
}

/// Translate one formula into its batch entry, using `position` to resolve
/// identifiers. Unknown identifiers are left as written so the engine reports
/// them as unresolved.
pub fn to_engine_formula<F>(formula: &str, position: F) -> String
where
    F: Fn(&VarId) -> Option<usize>,
{
    let trimmed = formula.trim();
    if trimmed.is_empty() || is_numeric_literal(trimmed) {
        return trimmed.to_string();
    }
    if uses_engine_addressing(trimmed) {
        log::debug!("formula uses engine addressing, left unresolved: {}", trimmed);
        return String::new();
    }
    let rewritten = rewrite_references(trimmed, |id| position(id).map(format_address));
    format!("{}{}", EXPRESSION_PREFIX, rewritten)
}

/// Build the engine batch for a chain, one entry per variable in order.
pub fn build_batch(chain: &Chain) -> Vec<String> {
    chain
        .iter()
        .map(|v| to_engine_formula(&v.formula, |id| chain.position(id)))
        .collect()
}

/// Transform an expression (without the leading `=`) for Rhai evaluation:
/// `$n` becomes `CELL(n - 1)`. String literals are left untouched.
pub fn preprocess_script(script: &str) -> String {
    preprocess_with_precedents(script).0
}

/// Like [`preprocess_script`], also returning the positions the expression
/// reads, in order of first appearance.
pub fn preprocess_with_precedents(script: &str) -> (String, Vec<usize>) {
    let mut precedents: Vec<usize> = Vec::new();
    let mut replace_addresses = |seg: &str| {
        let seg = promote_integer_literals(seg);
        address_re()
            .replace_all(&seg, |caps: &regex::Captures| match parse_address(&caps[0]) {
                Some(pos) => {
                    if !precedents.contains(&pos) {
                        precedents.push(pos);
                    }
                    format!("CELL({})", pos)
                }
                None => caps[0].to_string(),
            })
            .to_string()
    };

    let bytes = script.as_bytes();
    let mut out = String::new();
    let mut seg_start = 0;
    let mut quote: Option<u8> = None;
    let mut backslashes = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                backslashes += 1;
                i += 1;
                continue;
            }
            if b == q && backslashes.is_multiple_of(2) {
                out.push_str(&script[seg_start..=i]);
                quote = None;
                seg_start = i + 1;
            }
            backslashes = 0;
            i += 1;
            continue;
        }

        if b == b'"' || b == b'\'' || b == b'`' {
            out.push_str(&replace_addresses(&script[seg_start..i]));
            quote = Some(b);
            seg_start = i;
            backslashes = 0;
        }
        i += 1;
    }

    if seg_start < script.len() {
        if quote.is_some() {
            out.push_str(&script[seg_start..]);
        } else {
            out.push_str(&replace_addresses(&script[seg_start..]));
        }
    }

    (out, precedents)
}

/// Append `.0` to bare integer literals (`9 / 2` -> `9.0 / 2.0`). Digits
/// inside identifiers or after `$` are left alone, as are float, exponent,
/// hex and digit-separated literals.
fn promote_integer_literals(seg: &str) -> String {
    let chars: Vec<char> = seg.chars().collect();
    let mut out = String::with_capacity(seg.len() + 8);
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i];
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let starts_number = ch.is_ascii_digit()
            && !prev.is_some_and(|p| VarId::is_ident_char(p) || p == ADDRESS_SIGIL || p == '.');
        if !starts_number {
            out.push(ch);
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() {
            let c = chars[j];
            let signed_exponent = (c == '+' || c == '-')
                && matches!(chars[j - 1], 'e' | 'E')
                && chars.get(j + 1).is_some_and(|n| n.is_ascii_digit());
            if VarId::is_ident_char(c) || c == '.' || signed_exponent {
                j += 1;
            } else {
                break;
            }
        }

        out.extend(&chars[i..j]);
        if chars[i..j].iter().all(|c| c.is_ascii_digit()) {
            out.push_str(".0");
        }
        i = j;
    }

    out
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$[0-9]+\b").expect("address regex must compile"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Variable;
    use pretty_assertions::assert_eq;

    fn id(name: &str) -> VarId {
        VarId::from_str(name).unwrap()
    }

    #[test]
    fn test_address_round_trip_edges() {
        assert_eq!(format_address(0), "$1");
        assert_eq!(parse_address("$12"), Some(11));
        assert_eq!(parse_address("$0"), None);
        assert_eq!(parse_address("12"), None);
    }

    #[test]
    fn test_numeric_literals() {
        assert!(is_numeric_literal("1"));
        assert!(is_numeric_literal(" -2.5 "));
        assert!(is_numeric_literal("1e3"));
        assert!(!is_numeric_literal("inf"));
        assert!(!is_numeric_literal("NaN"));
        assert!(!is_numeric_literal("1 + 2"));
        assert!(!is_numeric_literal(""));
    }

    #[test]
    fn test_build_batch_translates_identifiers() {
        let mut chain = Chain::new();
        chain.push(Variable::new(id("VAR_1"), "1")).unwrap();
        chain.push(Variable::new(id("VAR_2"), "2")).unwrap();
        chain.push(Variable::new(id("VAR_3"), "var_1 + VAR_2 * UNKNOWN")).unwrap();
        chain.push(Variable::new(id("VAR_4"), "")).unwrap();

        assert_eq!(
            build_batch(&chain),
            vec!["1", "2", "=$1 + $2 * UNKNOWN", ""]
        );
    }

    #[test]
    fn test_build_batch_uses_positions_not_names() {
        // VAR_10 sits at position 0, so it must not become `$10`.
        let mut chain = Chain::new();
        chain.push(Variable::new(id("VAR_10"), "5")).unwrap();
        chain.push(Variable::new(id("VAR_1"), "VAR_10 + 1")).unwrap();
        assert_eq!(build_batch(&chain), vec!["5", "=$1 + 1"]);
    }

    #[test]
    fn test_preprocess_script_addresses() {
        assert_eq!(preprocess_script("$1"), "CELL(0)");
        assert_eq!(preprocess_script("$2 + $10 * 3"), "CELL(1) + CELL(9) * 3.0");
    }

    #[test]
    fn test_preprocess_script_skips_strings() {
        assert_eq!(preprocess_script("\"$1\" + $2"), "\"$1\" + CELL(1)");
        assert_eq!(preprocess_script("'$1'"), "'$1'");
    }

    #[test]
    fn test_preprocess_collects_precedents() {
        let (script, precedents) = preprocess_with_precedents("$3 + $1 * $3 + \"$7\"");
        assert_eq!(script, "CELL(2) + CELL(0) * CELL(2) + \"$7\"");
        assert_eq!(precedents, vec![2, 0]);
    }

    #[test]
    fn test_preprocess_promotes_integer_literals() {
        assert_eq!(preprocess_script("9 / 2"), "9.0 / 2.0");
        assert_eq!(
            preprocess_script("1.5 + 2e3 + 2.5E-3 + 0xFF + 1_000"),
            "1.5 + 2e3 + 2.5E-3 + 0xFF + 1_000"
        );
        assert_eq!(preprocess_script("ROUND($1, 2)"), "ROUND(CELL(0), 2.0)");
        assert_eq!(preprocess_script("\"7\" + 7"), "\"7\" + 7.0");
    }

    #[test]
    fn test_engine_addressing_in_caller_text_is_blanked() {
        let position = |_: &VarId| Some(0);
        assert_eq!(to_engine_formula("$1 + 1", position), "");
        assert_eq!(to_engine_formula("CELL(0) * 1", position), "");
        assert_eq!(to_engine_formula("(0).CELL()", position), "");
        assert_eq!(to_engine_formula("Fn(\"CELL\").call(0)", position), "");
        assert_eq!(to_engine_formula("\"$1\" + A", position), "=\"$1\" + $1");
        assert!(uses_engine_addressing("`${CELL(0)}`"));
        assert!(uses_engine_addressing("$1"));
        assert!(!uses_engine_addressing("CELL + 1"));
    }

    #[test]
    fn test_preprocess_script_keeps_invalid_address() {
        assert_eq!(preprocess_script("$0 + 1"), "$0 + 1.0");
    }
}
