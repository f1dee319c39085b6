//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They keep the rules
//! for amounts and labels in one place so every write path applies them.

use crate::{EngineError, ResultEngine, expenses::UNCATEGORIZED};

/// Amounts are minor units and must be strictly positive.
pub(crate) fn validate_amount(amount_minor: i64) -> ResultEngine<i64> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(amount_minor)
}

/// Map a raw category label to the stored one.
///
/// Blank or missing labels, and any casing of "uncategorized", collapse to
/// [`UNCATEGORIZED`].
pub(crate) fn normalize_category(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(label) if label.eq_ignore_ascii_case(UNCATEGORIZED) => UNCATEGORIZED.to_string(),
        Some(label) => label.to_string(),
        None => UNCATEGORIZED.to_string(),
    }
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
