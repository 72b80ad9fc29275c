//! References Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query_as, query_scalar};
use tracing::debug;
use uuid::Uuid;

use crate::{
    database::Db,
    domain::references::{
        errors::ReferencesError,
        records::{Reference, ReferenceKind, normalize_name, search_text},
    },
};

struct Statements {
    resolve: &'static str,
    get: &'static str,
    create: &'static str,
    list: &'static str,
}

const CATEGORY_STATEMENTS: Statements = Statements {
    resolve: include_str!("sql/categories/resolve.sql"),
    get: include_str!("sql/categories/get.sql"),
    create: include_str!("sql/categories/create.sql"),
    list: include_str!("sql/categories/list.sql"),
};

const BRAND_STATEMENTS: Statements = Statements {
    resolve: include_str!("sql/brands/resolve.sql"),
    get: include_str!("sql/brands/get.sql"),
    create: include_str!("sql/brands/create.sql"),
    list: include_str!("sql/brands/list.sql"),
};

fn statements(kind: ReferenceKind) -> &'static Statements {
    match kind {
        ReferenceKind::Category => &CATEGORY_STATEMENTS,
        ReferenceKind::Brand => &BRAND_STATEMENTS,
    }
}

#[derive(Debug, Clone)]
pub struct PgReferencesRepository {
    db: Db,
}

impl PgReferencesRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl<'r> FromRow<'r, PgRow> for Reference {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            name: row.try_get("name")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

#[async_trait]
impl ReferencesRepository for PgReferencesRepository {
    #[tracing::instrument(
        name = "references.repository.resolve",
        skip(self),
        fields(matched = tracing::field::Empty),
        err
    )]
    async fn resolve(
        &self,
        kind: ReferenceKind,
        text: &str,
    ) -> Result<Option<Uuid>, ReferencesError> {
        let Some(text) = search_text(text) else {
            return Ok(None);
        };

        let matched = query_scalar::<Postgres, Uuid>(statements(kind).resolve)
            .bind(text)
            .fetch_optional(self.db.pool())
            .await?;

        tracing::Span::current().record("matched", matched.is_some());

        Ok(matched)
    }

    #[tracing::instrument(name = "references.repository.get_reference", skip(self), err)]
    async fn get_reference(
        &self,
        kind: ReferenceKind,
        uuid: Uuid,
    ) -> Result<Reference, ReferencesError> {
        query_as::<Postgres, Reference>(statements(kind).get)
            .bind(uuid)
            .fetch_one(self.db.pool())
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(name = "references.repository.create_reference", skip(self), err)]
    async fn create_reference(
        &self,
        kind: ReferenceKind,
        name: String,
    ) -> Result<Reference, ReferencesError> {
        let name = normalize_name(&name)?;

        let reference = query_as::<Postgres, Reference>(statements(kind).create)
            .bind(Uuid::now_v7())
            .bind(&name)
            .fetch_one(self.db.pool())
            .await?;

        debug!(%kind, uuid = %reference.uuid, "created reference");

        Ok(reference)
    }

    #[tracing::instrument(name = "references.repository.list_references", skip(self), err)]
    async fn list_references(
        &self,
        kind: ReferenceKind,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Reference>, ReferencesError> {
        query_as::<Postgres, Reference>(statements(kind).list)
            .bind(i64::try_from(skip)?)
            .bind(i64::try_from(limit)?)
            .fetch_all(self.db.pool())
            .await
            .map_err(Into::into)
    }
}

/// Named collections (categories, brands) that products point at.
#[automock]
#[async_trait]
pub trait ReferencesRepository: Send + Sync {
    /// Resolve free text to the first entity whose name contains it,
    /// ignoring case, in creation order. Blank text resolves to `None`.
    async fn resolve(
        &self,
        kind: ReferenceKind,
        text: &str,
    ) -> Result<Option<Uuid>, ReferencesError>;

    /// Fetch a single entity.
    async fn get_reference(
        &self,
        kind: ReferenceKind,
        uuid: Uuid,
    ) -> Result<Reference, ReferencesError>;

    /// Create an entity with a 3 to 20 character name.
    async fn create_reference(
        &self,
        kind: ReferenceKind,
        name: String,
    ) -> Result<Reference, ReferencesError>;

    /// List entities in creation order.
    async fn list_references(
        &self,
        kind: ReferenceKind,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Reference>, ReferencesError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::db::TestDb;

    use super::*;

    fn repository(test_db: &TestDb) -> PgReferencesRepository {
        PgReferencesRepository::new(Db::new(test_db.pool().clone()))
    }

    #[tokio::test]
    async fn resolve_matches_case_insensitive_substring_in_creation_order() -> TestResult {
        let test_db = TestDb::new().await;
        let repository = repository(&test_db);

        let first = repository
            .create_reference(ReferenceKind::Category, "Running Shoes".to_string())
            .await?;

        repository
            .create_reference(ReferenceKind::Category, "Walking Shoes".to_string())
            .await?;

        let resolved = repository.resolve(ReferenceKind::Category, "SHOE").await?;

        assert_eq!(resolved, Some(first.uuid));

        let missing = repository.resolve(ReferenceKind::Category, "hats").await?;

        assert_eq!(missing, None);

        Ok(())
    }

    #[tokio::test]
    async fn categories_and_brands_are_separate_collections() -> TestResult {
        let test_db = TestDb::new().await;
        let repository = repository(&test_db);

        repository
            .create_reference(ReferenceKind::Brand, "Acme".to_string())
            .await?;

        assert_eq!(repository.resolve(ReferenceKind::Category, "acme").await?, None);
        assert!(repository.resolve(ReferenceKind::Brand, "acme").await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn get_unknown_reference_is_not_found() {
        let test_db = TestDb::new().await;

        let result = repository(&test_db)
            .get_reference(ReferenceKind::Brand, Uuid::now_v7())
            .await;

        assert!(
            matches!(result, Err(ReferencesError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn list_references_pages_in_creation_order() -> TestResult {
        let test_db = TestDb::new().await;
        let repository = repository(&test_db);

        for name in ["Alpha", "Bravo", "Charlie"] {
            repository
                .create_reference(ReferenceKind::Brand, name.to_string())
                .await?;
        }

        let page = repository
            .list_references(ReferenceKind::Brand, 1, 10)
            .await?;

        let names: Vec<&str> = page.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, ["Bravo", "Charlie"]);

        Ok(())
    }
}
