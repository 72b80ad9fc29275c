//! Reference Records

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{domain::references::errors::ReferencesError, uuids::TypedUuid};

/// Shortest accepted category/brand name, in characters.
pub const MIN_NAME_LENGTH: usize = 3;

/// Longest accepted category/brand name, in characters.
pub const MAX_NAME_LENGTH: usize = 20;

/// Category Record
#[derive(Debug, Clone, Copy)]
pub struct CategoryRecord;

/// Category UUID
pub type CategoryUuid = TypedUuid<CategoryRecord>;

/// Brand Record
#[derive(Debug, Clone, Copy)]
pub struct BrandRecord;

/// Brand UUID
pub type BrandUuid = TypedUuid<BrandRecord>;

/// Which named collection a reference lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Category,
    Brand,
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Category => f.write_str("category"),
            Self::Brand => f.write_str("brand"),
        }
    }
}

/// A category or brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub uuid: Uuid,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Trim `name` and check it against the accepted length range.
///
/// # Errors
///
/// Returns [`ReferencesError::InvalidName`] when the trimmed name is shorter
/// than [`MIN_NAME_LENGTH`] or longer than [`MAX_NAME_LENGTH`] characters.
pub fn normalize_name(name: &str) -> Result<String, ReferencesError> {
    let name = name.trim();

    if (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name.chars().count()) {
        Ok(name.to_string())
    } else {
        Err(ReferencesError::InvalidName)
    }
}

/// Search text worth querying for, or `None` when blank.
#[must_use]
pub fn search_text(text: &str) -> Option<&str> {
    Some(text.trim()).filter(|text| !text.is_empty())
}
