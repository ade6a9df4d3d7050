//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API.

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Trim a required name and reject it when empty.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trim optional free text, mapping blank input to an empty string.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// Lookup key for catalog names: NFKC, lowercase, and `' '`/`-` folded into
/// `_`, so "Small payment" and "small_payment" match.
pub(crate) fn catalog_key(value: &str) -> String {
    value
        .trim()
        .nfkc()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_key_folds_case_and_separators() {
        assert_eq!(catalog_key("Small payment"), "small_payment");
        assert_eq!(catalog_key(" small-payment "), "small_payment");
        assert_eq!(catalog_key("FOOD"), "food");
    }

    #[test]
    fn required_name_rejects_blank() {
        assert!(normalize_required_name("   ", "username").is_err());
        assert_eq!(
            normalize_required_name("  ana ", "username").unwrap(),
            "ana"
        );
    }
}
