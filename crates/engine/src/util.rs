//! Internal helpers for input validation and text folding.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, FieldError, ResultEngine};

/// Folds free text into a comparison key.
///
/// Decomposes (NFKD), drops combining marks, lowercases alphanumerics and
/// collapses every run of other characters into a single space.
pub(crate) fn fold_text(value: &str) -> String {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in value.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    out.trim_end().to_string()
}

pub(crate) fn normalize_required_name(value: &str, field: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::field(field, "must not be empty"));
    }
    if trimmed.chars().count() > 100 {
        return Err(EngineError::field(field, "must be at most 100 characters"));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_description(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::field("description", "must not be empty"));
    }
    if trimmed.chars().count() > 255 {
        return Err(EngineError::field(
            "description",
            "must be at most 255 characters",
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Collects field errors and turns them into a single `Validation` error.
#[derive(Default)]
pub(crate) struct Violations(Vec<FieldError>);

impl Violations {
    pub(crate) fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.0.push(FieldError::new(field, message));
        }
    }

    pub(crate) fn finish(self) -> ResultEngine<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self.0))
        }
    }
}
