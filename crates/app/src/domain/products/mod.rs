//! Products
//!
//! A product owns a tree of color variants, each with an image and a list of
//! sizes. The tree is stored inside the product document; images live in the
//! blob store.

pub mod attachments;
pub mod data;
pub mod errors;
mod memory;
pub mod records;
mod repository;
pub mod service;
mod uploads;
pub mod validation;
mod variants;

pub use attachments::Attachment;
pub use errors::{ProductsRepositoryError, ProductsServiceError, Resource};
pub use memory::MemoryProductsRepository;
pub use repository::*;
pub use service::*;
