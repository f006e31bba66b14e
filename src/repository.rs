use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder, types::Json};
use std::{
    collections::HashMap,
    marker::PhantomData,
    sync::{Arc, RwLock},
};
use uuid::Uuid;

/// StoreError
///
/// Failures of the persistence layer. Handlers never inspect these beyond
/// converting them into a 500.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("in-memory store lock poisoned")]
    Poisoned,
}

/// Document
///
/// The untyped unit of storage. `body` holds the entity fields; the envelope
/// columns (`is_active`, `sort_order`, timestamps) are lifted out so the store
/// can filter and sort without understanding the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub body: Value,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SortOrder
///
/// The two orderings used by the site: curated (`order` ascending, newest first
/// on ties) and chronological (newest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Manual,
    NewestFirst,
}

/// ListQuery
///
/// Filter for `DocumentStore::find`. Field filters compare a top-level string
/// field of the body for equality.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub active_only: bool,
    pub field_equals: Vec<(String, String)>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub sort: SortOrder,
}

impl ListQuery {
    pub fn all(sort: SortOrder) -> Self {
        Self {
            active_only: false,
            field_equals: Vec::new(),
            created_from: None,
            created_to: None,
            sort,
        }
    }

    pub fn active(sort: SortOrder) -> Self {
        Self {
            active_only: true,
            ..Self::all(sort)
        }
    }

    pub fn with_field(mut self, field: &str, value: impl Into<String>) -> Self {
        self.field_equals.push((field.to_string(), value.into()));
        self
    }

    fn matches(&self, doc: &Document) -> bool {
        if self.active_only && !doc.is_active {
            return false;
        }
        if self.created_from.is_some_and(|from| doc.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| doc.created_at > to) {
            return false;
        }
        self.field_equals
            .iter()
            .all(|(field, value)| doc.body.get(field).and_then(Value::as_str) == Some(value))
    }
}

/// DocumentStore Trait
///
/// The persistence contract shared by every content type. One collection per
/// entity; each method touches exactly one document (or reads one collection),
/// so single-document atomicity of the backend is the only guarantee relied on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError>;
    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError>;
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;
    /// Replaces body and envelope of an existing document. Returns `None` when the id is unknown.
    async fn replace(&self, collection: &str, doc: Document) -> Result<Option<Document>, StoreError>;
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;
    async fn count(&self, collection: &str) -> Result<i64, StoreError>;
}

/// StoreState
///
/// The store handle injected into the application state. Built once in `main`.
pub type StoreState = Arc<dyn DocumentStore>;

// --- PostgreSQL implementation ---

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    body: Json<Value>,
    is_active: bool,
    sort_order: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            body: row.body.0,
            is_active: row.is_active,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, body, is_active, sort_order, created_at, updated_at";

/// PostgresStore
///
/// Backs every collection with the single `documents` table (JSONB body),
/// created by the embedded migrations.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn find(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM documents WHERE collection = "));
        builder.push_bind(collection);

        if query.active_only {
            builder.push(" AND is_active = true");
        }
        for (field, value) in &query.field_equals {
            // Field names are bound, never interpolated.
            builder.push(" AND body ->> ");
            builder.push_bind(field.clone());
            builder.push(" = ");
            builder.push_bind(value.clone());
        }
        if let Some(from) = query.created_from {
            builder.push(" AND created_at >= ");
            builder.push_bind(from);
        }
        if let Some(to) = query.created_to {
            builder.push(" AND created_at <= ");
            builder.push_bind(to);
        }

        builder.push(match query.sort {
            SortOrder::Manual => " ORDER BY sort_order ASC, created_at DESC",
            SortOrder::NewestFirst => " ORDER BY created_at DESC",
        });

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 AND id = $2"
        ))
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Document::from))
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"INSERT INTO documents (id, collection, body, is_active, sort_order, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {COLUMNS}"#
        ))
        .bind(doc.id)
        .bind(collection)
        .bind(Json(&doc.body))
        .bind(doc.is_active)
        .bind(doc.sort_order)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn replace(&self, collection: &str, doc: Document) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"UPDATE documents
               SET body = $3, is_active = $4, sort_order = $5, updated_at = $6
               WHERE collection = $1 AND id = $2
               RETURNING {COLUMNS}"#
        ))
        .bind(collection)
        .bind(doc.id)
        .bind(Json(&doc.body))
        .bind(doc.is_active)
        .bind(doc.sort_order)
        .bind(doc.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Document::from))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, collection: &str) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// --- In-memory implementation ---

/// InMemoryStore
///
/// A process-local `DocumentStore` used by the integration tests. Each call
/// holds the lock for a single operation, mirroring per-document atomicity.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, HashMap<Uuid, Document>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        let mut docs: Vec<Document> = guard
            .get(collection)
            .map(|docs| docs.values().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();

        match query.sort {
            SortOrder::Manual => docs.sort_by(|a, b| {
                a.sort_order
                    .cmp(&b.sort_order)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
            SortOrder::NewestFirst => docs.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(docs)
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(collection).and_then(|docs| docs.get(&id)).cloned())
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let mut guard = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        guard
            .entry(collection.to_string())
            .or_default()
            .insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn replace(&self, collection: &str, doc: Document) -> Result<Option<Document>, StoreError> {
        let mut guard = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let Some(existing) = guard.get_mut(collection).and_then(|docs| docs.get_mut(&doc.id)) else {
            return Ok(None);
        };
        existing.body = doc.body;
        existing.is_active = doc.is_active;
        existing.sort_order = doc.sort_order;
        existing.updated_at = doc.updated_at;
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut guard = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        Ok(guard
            .get_mut(collection)
            .and_then(|docs| docs.remove(&id))
            .is_some())
    }

    async fn count(&self, collection: &str) -> Result<i64, StoreError> {
        let guard = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(collection).map_or(0, |docs| docs.len() as i64))
    }
}

// --- Typed layer ---

/// Entity
///
/// A type stored in its own collection. `sort_key` feeds the envelope's
/// `sort_order` column for types ordered by hand.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn sort_key(&self) -> i64 {
        0
    }
}

/// Record
///
/// A stored entity together with its envelope, in the shape returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: T,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<T: Entity> Record<T> {
    fn from_document(doc: Document) -> Result<Self, StoreError> {
        Ok(Record {
            id: doc.id,
            data: serde_json::from_value(doc.body)?,
            is_active: doc.is_active,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    fn to_document(&self) -> Result<Document, StoreError> {
        Ok(Document {
            id: self.id,
            body: serde_json::to_value(&self.data)?,
            is_active: self.is_active,
            sort_order: self.data.sort_key(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Collection
///
/// The generic repository: typed CRUD over one collection of the shared store.
/// Every route in the crate goes through this instead of touching the store directly.
pub struct Collection<T> {
    store: StoreState,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Collection<T> {
    pub fn new(store: StoreState) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Record<T>>, StoreError> {
        self.store
            .find(T::COLLECTION, query)
            .await?
            .into_iter()
            .map(Record::from_document)
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Record<T>>, StoreError> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(Record::from_document)
            .transpose()
    }

    pub async fn find_one(&self, field: &str, value: &str) -> Result<Option<Record<T>>, StoreError> {
        let query = ListQuery::all(SortOrder::NewestFirst).with_field(field, value);
        Ok(self.list(&query).await?.into_iter().next())
    }

    pub async fn insert(&self, data: T, is_active: bool) -> Result<Record<T>, StoreError> {
        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4(),
            data,
            is_active,
            created_at: now,
            updated_at: now,
        };
        let stored = self.store.insert(T::COLLECTION, record.to_document()?).await?;
        Record::from_document(stored)
    }

    /// Writes the record back, bumping `updated_at`. `None` when it no longer exists.
    pub async fn save(&self, record: &Record<T>) -> Result<Option<Record<T>>, StoreError> {
        let mut doc = record.to_document()?;
        doc.updated_at = Utc::now();
        self.store
            .replace(T::COLLECTION, doc)
            .await?
            .map(Record::from_document)
            .transpose()
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<Record<T>>, StoreError> {
        let Some(mut record) = self.get(id).await? else {
            return Ok(None);
        };
        record.is_active = is_active;
        self.save(&record).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        self.store.count(T::COLLECTION).await
    }
}
