//! Template placeholders.
//!
//! Callers often translate query templates holding holes such as `{0}` or
//! `[TABLE1]` that are not SQL. Before parsing, every match of a configured
//! pattern is replaced by a mask the parser accepts: a quoted identifier
//! `"Token00001"` for identifier patterns, a bare word `VarToken00001` for
//! variable patterns. After serialization the masks are swapped back.

use regex::Regex;

use crate::config::Config;
use crate::error::{TranslateError, TranslateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Identifier,
    Variable,
}

impl PlaceholderKind {
    fn mask(self, number: usize) -> String {
        match self {
            PlaceholderKind::Identifier => format!("\"Token{:05}\"", number),
            PlaceholderKind::Variable => format!("VarToken{:05}", number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Mask {
    mask: String,
    original: String,
}

/// Masks applied to one input.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    masks: Vec<Mask>,
    only_placeholder: bool,
}

/// Compile the configured patterns. Blank lines and `//` comments are skipped.
pub fn patterns(config: &Config) -> TranslateResult<Vec<(Regex, PlaceholderKind)>> {
    let identifiers = config
        .id_tokens
        .iter()
        .map(|pattern| (pattern, PlaceholderKind::Identifier));
    let variables = config
        .var_tokens
        .iter()
        .map(|pattern| (pattern, PlaceholderKind::Variable));
    identifiers
        .chain(variables)
        .filter(|(pattern, _)| !pattern.starts_with("//") && !pattern.trim().is_empty())
        .map(|(pattern, kind)| {
            Regex::new(pattern)
                .map(|regex| (regex, kind))
                .map_err(|source| TranslateError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
        })
        .collect()
}

/// True when the input is nothing but `placeholder`, optionally behind
/// `SELECT` and before `;`.
fn is_only(placeholder: &str, input: &str) -> bool {
    let trimmed = input.trim().trim_end_matches(';');
    if trimmed.len() == placeholder.len() {
        return true;
    }
    let words: Vec<&str> = input.split(' ').collect();
    matches!(
        words.as_slice(),
        [select, rest] if select.trim().eq_ignore_ascii_case("SELECT")
            && rest.trim().trim_end_matches(';').len() == placeholder.len()
    )
}

impl Placeholders {
    /// Mask every placeholder in `input`.
    pub fn mask(config: &Config, input: &str) -> TranslateResult<(String, Placeholders)> {
        let mut placeholders = Placeholders::default();
        let mut text = input.to_string();
        for (regex, kind) in patterns(config)? {
            let mut found: Vec<String> = Vec::new();
            for matched in regex.find_iter(&text) {
                let matched = matched.as_str().to_string();
                if !matched.is_empty() && !found.contains(&matched) {
                    found.push(matched);
                }
            }
            for original in found {
                if is_only(&original, input) {
                    tracing::debug!(placeholder = %original, "input is a lone placeholder");
                    placeholders.only_placeholder = true;
                    return Ok((input.to_string(), placeholders));
                }
                let mask = kind.mask(placeholders.masks.len() + 1);
                text = text.replace(&original, &mask);
                placeholders.masks.push(Mask { mask, original });
            }
        }
        if !placeholders.masks.is_empty() {
            tracing::debug!(count = placeholders.masks.len(), "placeholders masked");
        }
        Ok((text, placeholders))
    }

    /// Put the original placeholders back into translated text.
    pub fn unmask(&self, output: &str) -> String {
        let mut text = output.to_string();
        for mask in &self.masks {
            text = text.replace(&mask.mask, &mask.original);
        }
        text
    }

    /// The whole input was one placeholder; it is not translated.
    pub fn only_placeholder(&self) -> bool {
        self.only_placeholder
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mask_and_unmask() {
        let config = Config::default();
        let (masked, placeholders) =
            Placeholders::mask(&config, "select a from T where id = {0} and b = '{obj.DocNum}' or c = {0}").unwrap();
        assert_eq!(
            masked,
            r#"select a from T where id = "Token00001" and b = '"Token00002"' or c = "Token00001""#
        );
        assert_eq!(placeholders.len(), 2);
        assert_eq!(
            placeholders.unmask(r#"SELECT a FROM T WHERE id = "Token00001" AND b = '"Token00002"'"#),
            "SELECT a FROM T WHERE id = {0} AND b = '{obj.DocNum}'"
        );
    }

    #[test]
    fn test_variable_patterns() {
        let config = Config::builder().no_tokens().var_token(r"\[TABLE[0-9]+\]").build();
        let (masked, placeholders) = Placeholders::mask(&config, "select * from [TABLE12]").unwrap();
        assert_eq!(masked, "select * from VarToken00001");
        assert_eq!(placeholders.unmask("SELECT * FROM VarToken00001"), "SELECT * FROM [TABLE12]");
    }

    #[test]
    fn test_lone_placeholder() {
        let config = Config::default();
        for input in ["{0}", " {0}; ", "SELECT {0}", "select {0};"] {
            let (masked, placeholders) = Placeholders::mask(&config, input).unwrap();
            assert!(placeholders.only_placeholder(), "{input}");
            assert_eq!(masked, input);
        }
        let (_, placeholders) = Placeholders::mask(&config, "select {0} from T").unwrap();
        assert!(!placeholders.only_placeholder());
    }

    #[test]
    fn test_patterns_skip_comments_and_reject_bad_regex() {
        let config = Config::builder().no_tokens().id_token("// disabled").id_token("  ").build();
        assert!(patterns(&config).unwrap().is_empty());

        let config = Config::builder().no_tokens().id_token("(").build();
        assert!(matches!(patterns(&config), Err(TranslateError::Pattern { .. })));
    }
}
