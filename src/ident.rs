//! Pure predicates over identifier strings: variable-name validity, integer
//! literals, `list{T}` syntax, and include-guard sanitization.

use once_cell::sync::Lazy;
use regex::Regex;

static VAR_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("valid regex"));
static INT_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("valid regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9A-Za-z_]").expect("valid regex"));

#[must_use]
pub fn is_valid_var_name(s: &str) -> bool {
    VAR_NAME.is_match(s)
}

#[must_use]
pub fn is_int_literal(s: &str) -> bool {
    INT_LITERAL.is_match(s)
}

/// If `s` is `list{T}` with `T` non-empty, returns `T`.
#[must_use]
pub fn parse_list_type(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("list{")?.strip_suffix('}')?;
    if inner.is_empty() { None } else { Some(inner) }
}

#[must_use]
pub fn sanitize_for_guard(s: &str) -> String {
    NON_WORD.replace_all(s, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_name_accepts_letters_digits_underscore() {
        assert!(is_valid_var_name("foo_Bar9"));
        assert!(is_valid_var_name("_leading"));
        assert!(!is_valid_var_name("9leading"));
        assert!(!is_valid_var_name("has space"));
        assert!(!is_valid_var_name(""));
    }

    #[test]
    fn int_literal_accepts_optional_minus() {
        assert!(is_int_literal("0"));
        assert!(is_int_literal("-42"));
        assert!(!is_int_literal("4.2"));
        assert!(!is_int_literal("+1"));
        assert!(!is_int_literal(""));
    }

    #[test]
    fn list_type_extracts_element_spelling() {
        assert_eq!(parse_list_type("list{i32}"), Some("i32"));
        assert_eq!(parse_list_type("list{}"), None);
        assert_eq!(parse_list_type("i32"), None);
        assert_eq!(parse_list_type("list{q.T}"), Some("q.T"));
    }

    #[test]
    fn sanitize_replaces_non_word_chars() {
        assert_eq!(sanitize_for_guard("a.b-c"), "a_b_c");
        assert_eq!(sanitize_for_guard("already_ok"), "already_ok");
    }
}
