//! References
//!
//! Categories and brands: small named collections that products point at and
//! that free-text filters resolve against.

pub mod errors;
mod memory;
pub mod records;
mod repository;

pub use errors::ReferencesError;
pub use memory::MemoryReferencesRepository;
pub use records::*;
pub use repository::*;
