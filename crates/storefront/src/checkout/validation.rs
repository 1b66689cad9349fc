//! Table-driven form validation.
//!
//! Each form declares a static table of [`FieldRule`]s. [`validate`] runs the
//! whole table and reports every failing field at once, in table order, with
//! at most one message per field (the first failing rule for that field).

use serde::Serialize;
use thiserror::Error;

/// A single check against one field of a form.
pub struct FieldRule<F> {
    /// Field name as shown to the display layer.
    pub field: &'static str,
    /// Returns `true` when the field passes.
    pub check: fn(&F) -> bool,
    /// Message shown next to the field when the check fails.
    pub message: &'static str,
}

/// One violated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Every violated field of a single submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("invalid fields: {}", format_fields(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// A single-field error.
    #[must_use]
    pub fn single(field: &'static str, message: &'static str) -> Self {
        Self {
            errors: vec![FieldError { field, message }],
        }
    }

    /// Names of the violated fields, in report order.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    /// Whether `field` was reported.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.field)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run every rule in `rules` against `form`.
///
/// # Errors
///
/// Returns all violated fields together if any rule fails.
pub fn validate<F>(form: &F, rules: &[FieldRule<F>]) -> Result<(), ValidationErrors> {
    let mut errors: Vec<FieldError> = Vec::new();

    for rule in rules {
        if errors.iter().any(|e| e.field == rule.field) {
            continue;
        }
        if !(rule.check)(form) {
            errors.push(FieldError {
                field: rule.field,
                message: rule.message,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}

/// Non-blank after trimming.
#[must_use]
pub fn present(value: &str) -> bool {
    !value.trim().is_empty()
}
