//! Field validation for product payloads.
//!
//! Validators never stop at the first problem: every message is collected
//! under its dotted field path (`colors.0.sizes.1.price`) so a caller can
//! report them all at once.

use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

use serde::{Deserialize, Serialize};

use crate::domain::products::{
    data::NewSize,
    records::{SizeUuid, SizeVariant},
};

/// A message attached to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field-level problem found in a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    fields: Vec<FieldError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();

        errors.push(field, message);

        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.iter().any(|error| error.field == field)
    }

    /// `Ok` when nothing was collected.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, error) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }

            write!(f, "{}: {}", error.field, error.message)?;
        }

        Ok(())
    }
}

impl Error for ValidationErrors {}

pub(crate) fn path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

/// Trimmed text, flagged when nothing is left.
pub(crate) fn required_text(errors: &mut ValidationErrors, field: String, value: &str) -> String {
    let value = value.trim();

    if value.is_empty() {
        errors.push(field, "is required");
    }

    value.to_string()
}

pub(crate) fn amount(errors: &mut ValidationErrors, field: String, value: i64) -> u64 {
    u64::try_from(value).unwrap_or_else(|_| {
        errors.push(field, "must not be negative");
        0
    })
}

/// A new size variant; price is required, stock defaults to zero.
pub(crate) fn new_size(errors: &mut ValidationErrors, prefix: &str, size: &NewSize) -> SizeVariant {
    let label = required_text(errors, path(prefix, "size"), &size.size);

    let price = match size.price {
        Some(price) => amount(errors, path(prefix, "price"), price),
        None => {
            errors.push(path(prefix, "price"), "is required");
            0
        }
    };

    let stock = size
        .stock
        .map_or(0, |stock| amount(errors, path(prefix, "stock"), stock));

    SizeVariant {
        uuid: SizeUuid::new(),
        size: label,
        price,
        stock,
    }
}

pub(crate) fn new_sizes(
    errors: &mut ValidationErrors,
    prefix: &str,
    sizes: &[NewSize],
) -> Vec<SizeVariant> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, size)| new_size(errors, &path(prefix, &i.to_string()), size))
        .collect()
}
