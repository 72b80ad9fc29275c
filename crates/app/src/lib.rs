//! Catalog backend: products with color and size variants, category and
//! brand references, and color images kept in a blob store.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;

#[cfg(test)]
mod test;

pub mod uuids;
