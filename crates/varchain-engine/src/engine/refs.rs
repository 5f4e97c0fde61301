//! Reference extraction from formula strings.
//!
//! Scans formula text for identifier tokens that name other variables. This
//! is used to build the reference graph for cycle detection and
//! recomputation, and to rewrite references on rename or before handing a
//! formula to the engine.
//!
//! Identifier tokens are maximal runs of identifier characters, so `VAR_10`
//! is never read as `VAR_1`. Not treated as references:
//! - anything inside string literals (`"..."`, `'...'`, `` `...` ``)
//! - names directly followed by `(` (function calls)
//! - names directly preceded by `.` (property and method access)
//! - number literals, including exponent and hex forms like `1e5`, `0xFF`
//! - Rhai keywords (`if`, `true`, `let`, ...), matched case-sensitively

use super::ident::VarId;

/// Rhai reserved words. Upper-case spellings (`IF`, `TRUE`) stay usable as
/// variable names.
const KEYWORDS: &[&str] = &[
    "true", "false", "let", "const", "if", "else", "switch", "do", "while", "until", "loop",
    "for", "in", "continue", "break", "return", "throw", "try", "catch", "fn", "private",
    "import", "export", "as", "global", "this", "Fn",
];

/// Byte span of an identifier token inside a formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentToken {
    pub start: usize,
    pub end: usize,
    /// False for function names and property accesses.
    pub reference: bool,
}

impl IdentToken {
    pub fn text<'a>(&self, formula: &'a str) -> &'a str {
        &formula[self.start..self.end]
    }
}

/// Scan a formula and return every identifier token in order of appearance.
pub fn scan_identifiers(formula: &str) -> Vec<IdentToken> {
    let chars: Vec<(usize, char)> = formula.char_indices().collect();
    let mut tokens = Vec::new();
    let mut prev_significant: Option<char> = None;
    let mut i = 0usize;

    while i < chars.len() {
        let (start, ch) = chars[i];

        if ch == '"' || ch == '\'' || ch == '`' {
            i = skip_string(&chars, i);
            prev_significant = Some(ch);
            continue;
        }

        if ch.is_ascii_digit() {
            i = skip_number(&chars, i);
            prev_significant = Some('0');
            continue;
        }

        if VarId::is_ident_start(ch) {
            let mut j = i + 1;
            while j < chars.len() && VarId::is_ident_char(chars[j].1) {
                j += 1;
            }
            let end = chars.get(j).map(|(idx, _)| *idx).unwrap_or(formula.len());
            let next_significant = chars[j..]
                .iter()
                .map(|(_, c)| *c)
                .find(|c| !c.is_whitespace());

            let is_call = next_significant == Some('(');
            let is_member = prev_significant == Some('.');
            let is_keyword = KEYWORDS.contains(&&formula[start..end]);
            tokens.push(IdentToken {
                start,
                end,
                reference: !is_call && !is_member && !is_keyword,
            });

            prev_significant = Some('a');
            i = j;
            continue;
        }

        if !ch.is_whitespace() {
            prev_significant = Some(ch);
        }
        i += 1;
    }

    tokens
}

/// Whether `needle` appears in the formula outside string literals.
pub fn contains_outside_strings(formula: &str, needle: char) -> bool {
    let chars: Vec<(usize, char)> = formula.char_indices().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i].1;
        if ch == '"' || ch == '\'' || ch == '`' {
            i = skip_string(&chars, i);
            continue;
        }
        if ch == needle {
            return true;
        }
        i += 1;
    }
    false
}

/// Returns the index just past the closing quote (or the end of input).
fn skip_string(chars: &[(usize, char)], open: usize) -> usize {
    let quote = chars[open].1;
    let mut i = open + 1;
    let mut escaped = false;
    while i < chars.len() {
        let ch = chars[i].1;
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return i + 1;
        }
        i += 1;
    }
    i
}

fn skip_number(chars: &[(usize, char)], first: usize) -> usize {
    let mut i = first + 1;
    while i < chars.len() {
        let ch = chars[i].1;
        if VarId::is_ident_char(ch) || ch == '.' {
            i += 1;
            continue;
        }
        // Signed exponent: 1e-3, 2.5E+10
        let prev = chars[i - 1].1;
        if (ch == '+' || ch == '-')
            && (prev == 'e' || prev == 'E')
            && chars.get(i + 1).is_some_and(|(_, c)| c.is_ascii_digit())
        {
            i += 1;
            continue;
        }
        break;
    }
    i
}

/// Extract the identifiers a formula references, de-duplicated, in order of
/// first appearance.
pub fn extract_references(formula: &str) -> Vec<VarId> {
    let mut refs: Vec<VarId> = Vec::new();
    for token in scan_identifiers(formula) {
        if !token.reference {
            continue;
        }
        if let Some(id) = VarId::from_str(token.text(formula))
            && !refs.contains(&id)
        {
            refs.push(id);
        }
    }
    refs
}

/// Whether the formula references `id` as a whole identifier.
pub fn mentions(formula: &str, id: &VarId) -> bool {
    scan_identifiers(formula)
        .iter()
        .any(|t| t.reference && id.matches(t.text(formula)))
}

/// Rewrite every reference token in `formula`.
///
/// `replace` is called with each referenced identifier; returning `None`
/// keeps the original text of that token. Non-reference text is copied
/// through unchanged.
pub fn rewrite_references<F>(formula: &str, mut replace: F) -> String
where
    F: FnMut(&VarId) -> Option<String>,
{
    let mut out = String::with_capacity(formula.len());
    let mut last = 0usize;

    for token in scan_identifiers(formula) {
        if !token.reference {
            continue;
        }
        let Some(id) = VarId::from_str(token.text(formula)) else {
            continue;
        };
        if let Some(replacement) = replace(&id) {
            out.push_str(&formula[last..token.start]);
            out.push_str(&replacement);
            last = token.end;
        }
    }

    out.push_str(&formula[last..]);
    out
}

/// Replace references to `from` with `to`, leaving everything else intact.
pub fn rename_references(formula: &str, from: &VarId, to: &VarId) -> String {
    rewrite_references(formula, |id| (id == from).then(|| to.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(names: &[&str]) -> Vec<VarId> {
        names.iter().map(|n| VarId::from_str(n).unwrap()).collect()
    }

    #[test]
    fn test_extract_simple_expression() {
        assert_eq!(
            extract_references("VAR_1 + VAR_2"),
            ids(&["VAR_1", "VAR_2"])
        );
    }

    #[test]
    fn test_extract_whole_identifiers_only() {
        assert_eq!(extract_references("VAR_10 * 2"), ids(&["VAR_10"]));
        assert!(!mentions("VAR_10 * 2", &VarId::from_str("VAR_1").unwrap()));
        assert!(!mentions("XVAR_1", &VarId::from_str("VAR_1").unwrap()));
    }

    #[test]
    fn test_extract_deduplicates_and_normalizes() {
        assert_eq!(
            extract_references("var_2 * VAR_2 + Var_1"),
            ids(&["VAR_2", "VAR_1"])
        );
    }

    #[test]
    fn test_extract_ignores_literals_and_numbers() {
        assert!(extract_references("42").is_empty());
        assert!(extract_references("1e5 + 2.5E-3 + 0xFF").is_empty());
        assert!(extract_references("\"VAR_1\" + 'x'").is_empty());
        assert_eq!(
            extract_references(r#""say \"VAR_1\"" + VAR_2"#),
            ids(&["VAR_2"])
        );
    }

    #[test]
    fn test_extract_skips_calls_and_members() {
        assert_eq!(extract_references("max(VAR_1, VAR_2)"), ids(&["VAR_1", "VAR_2"]));
        assert_eq!(extract_references("abs (VAR_3)"), ids(&["VAR_3"]));
        assert_eq!(extract_references("VAR_4.to_int()"), ids(&["VAR_4"]));
        assert_eq!(extract_references("VAR_4.len"), ids(&["VAR_4"]));
    }

    #[test]
    fn test_unterminated_string_swallows_rest() {
        assert_eq!(extract_references("VAR_1 + \"VAR_2"), ids(&["VAR_1"]));
    }

    #[test]
    fn test_rename_references_rewrites_whole_tokens() {
        let from = VarId::from_str("VAR_1").unwrap();
        let to = VarId::from_str("BASE").unwrap();
        assert_eq!(
            rename_references("var_1 + VAR_10 + \"VAR_1\" + VAR_1", &from, &to),
            "BASE + VAR_10 + \"VAR_1\" + BASE"
        );
    }

    #[test]
    fn test_rewrite_keeps_unmatched_tokens() {
        let out = rewrite_references("a + b * c", |id| {
            (id.as_str() == "B").then(|| "$2".to_string())
        });
        assert_eq!(out, "a + $2 * c");
    }

    #[test]
    fn test_keywords_are_not_references() {
        assert_eq!(
            extract_references("if VAR_1 > 0 { VAR_2 } else { 0 }"),
            ids(&["VAR_1", "VAR_2"])
        );
        assert!(extract_references("let x = true; false").iter().all(|id| id.as_str() == "X"));
        assert_eq!(extract_references("IF + TRUE"), ids(&["IF", "TRUE"]));
    }

    #[test]
    fn test_contains_outside_strings() {
        assert!(contains_outside_strings("$1 + 1", '$'));
        assert!(!contains_outside_strings("\"$1\" + 'a$'", '$'));
        assert!(!contains_outside_strings("VAR_1", '$'));
    }

    #[test]
    fn test_scan_handles_non_ascii_text() {
        let formula = "\"é\" + VAR_1";
        let tokens = scan_identifiers(formula);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text(formula), "VAR_1");
    }
}
