//! In-memory references repository.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::domain::references::{
    errors::ReferencesError,
    records::{Reference, ReferenceKind, normalize_name, search_text},
    repository::ReferencesRepository,
};

/// References kept in insertion order per kind.
#[derive(Debug, Clone, Default)]
pub struct MemoryReferencesRepository {
    collections: Arc<RwLock<FxHashMap<ReferenceKind, Vec<Reference>>>>,
}

impl MemoryReferencesRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReferencesRepository for MemoryReferencesRepository {
    async fn resolve(
        &self,
        kind: ReferenceKind,
        text: &str,
    ) -> Result<Option<Uuid>, ReferencesError> {
        let Some(text) = search_text(text) else {
            return Ok(None);
        };

        let needle = text.to_lowercase();

        Ok(self.collections.read().get(&kind).and_then(|references| {
            references
                .iter()
                .find(|reference| reference.name.to_lowercase().contains(&needle))
                .map(|reference| reference.uuid)
        }))
    }

    async fn get_reference(
        &self,
        kind: ReferenceKind,
        uuid: Uuid,
    ) -> Result<Reference, ReferencesError> {
        self.collections
            .read()
            .get(&kind)
            .and_then(|references| references.iter().find(|r| r.uuid == uuid))
            .cloned()
            .ok_or(ReferencesError::NotFound)
    }

    async fn create_reference(
        &self,
        kind: ReferenceKind,
        name: String,
    ) -> Result<Reference, ReferencesError> {
        let now = Timestamp::now();

        let reference = Reference {
            uuid: Uuid::now_v7(),
            name: normalize_name(&name)?,
            created_at: now,
            updated_at: now,
        };

        self.collections
            .write()
            .entry(kind)
            .or_default()
            .push(reference.clone());

        Ok(reference)
    }

    async fn list_references(
        &self,
        kind: ReferenceKind,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Reference>, ReferencesError> {
        let skip = usize::try_from(skip)?;
        let limit = usize::try_from(limit)?;

        Ok(self
            .collections
            .read()
            .get(&kind)
            .map(|references| {
                references
                    .iter()
                    .skip(skip)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
