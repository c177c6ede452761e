//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! parsing and normalization so the engine enforces consistent invariants.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse a list of stored UUIDs, preserving order and repeats.
pub(crate) fn parse_uuid_list(values: &[String], label: &str) -> ResultEngine<Vec<Uuid>> {
    values.iter().map(|v| parse_uuid(v, label)).collect()
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::ValidationFailed(vec![format!(
            "{label} must not be empty"
        )]));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Canonical key for a ledger category: trimmed, lowercase, accents stripped.
///
/// `" Serviço "` and `"servico"` land in the same report bucket.
pub(crate) fn normalize_category_key(value: &str) -> ResultEngine<String> {
    let key: String = value
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if key.is_empty() {
        return Err(EngineError::ValidationFailed(vec![
            "category must not be empty".to_string(),
        ]));
    }
    Ok(key)
}
