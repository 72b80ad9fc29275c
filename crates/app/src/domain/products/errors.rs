//! Products errors.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    num::TryFromIntError,
};

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    blobs::BlobError, products::validation::ValidationErrors, references::ReferencesError,
};

/// What a [`ProductsServiceError::NotFound`] could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Product,
    Color,
    Size,
    Image,
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Product => "product",
            Self::Color => "color",
            Self::Size => "size",
            Self::Image => "image",
        })
    }
}

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("invalid product data: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0} not found")]
    NotFound(Resource),

    #[error("blob store error: {0}")]
    BlobStore(#[source] BlobError),

    #[error("storage error: {0}")]
    Storage(#[source] ProductsRepositoryError),

    #[error("reference lookup failed: {0}")]
    References(#[from] ReferencesError),
}

impl From<ProductsRepositoryError> for ProductsServiceError {
    fn from(error: ProductsRepositoryError) -> Self {
        match error {
            ProductsRepositoryError::NotFound => Self::NotFound(Resource::Product),
            error => Self::Storage(error),
        }
    }
}

impl From<BlobError> for ProductsServiceError {
    fn from(error: BlobError) -> Self {
        Self::BlobStore(error)
    }
}

#[derive(Debug, Error)]
pub enum ProductsRepositoryError {
    #[error("product already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("database error: {0}")]
    Sql(#[source] Error),

    #[error("invalid numeric value")]
    InvalidNumber(#[from] TryFromIntError),
}

impl From<Error> for ProductsRepositoryError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
