//! Reference errors.

use std::num::TryFromIntError;

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferencesError {
    #[error("name must be between 3 and 20 characters")]
    InvalidName,

    #[error("reference already exists")]
    AlreadyExists,

    #[error("reference not found")]
    NotFound,

    #[error("invalid data")]
    InvalidData,

    #[error("database error: {0}")]
    Sql(#[source] Error),

    #[error("invalid pagination value")]
    InvalidRange(#[from] TryFromIntError),
}

impl From<Error> for ReferencesError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
