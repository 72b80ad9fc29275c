//! Catalog Domain Concerns

pub mod blobs;
pub mod products;
pub mod references;
