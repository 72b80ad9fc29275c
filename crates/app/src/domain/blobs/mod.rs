//! Blobs
//!
//! Binary objects (product images) kept outside the product documents. The
//! store mints an identifier at write time and does no reference tracking of
//! its own; owners are responsible for deleting what they no longer use.

pub mod errors;
mod memory;
mod postgres;
pub mod records;
mod store;

pub use errors::BlobError;
pub use memory::MemoryBlobStore;
pub use postgres::{DEFAULT_CHUNK_SIZE, PgBlobStore};
pub use records::*;
pub use store::BlobStore;
