//! Document store boundary.
//!
//! # Responsibility
//! - Define the collection-scoped primitives repositories are built on.
//! - Convert between domain records and generic JSON documents.
//!
//! # Invariants
//! - Every primitive is a single storage statement, atomic for the one
//!   document (or document set) it touches. Nothing spans two primitives.
//! - Enumeration order is insertion order.
//! - Top-level documents are keyed by the caller's id; child documents get a
//!   generated key and carry their parent id outside the body.

use crate::db::DbError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite;

pub use sqlite::SqliteDocumentStore;

/// Generic document body.
pub type Document = serde_json::Map<String, serde_json::Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Named physical collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Opinions,
    Notes,
    Dossiers,
    Reports,
    Resolutions,
    Types,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Self::Opinions,
        Self::Notes,
        Self::Dossiers,
        Self::Reports,
        Self::Resolutions,
        Self::Types,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Opinions => "pareceres",
            Self::Notes => "notas",
            Self::Dossiers => "radocs",
            Self::Reports => "relatos",
            Self::Resolutions => "resolucoes",
            Self::Types => "tipos",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One document as read back from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: String,
    pub parent_id: Option<String>,
    pub body: Document,
}

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    DuplicateKey {
        collection: Collection,
        key: String,
    },
    Serialization(serde_json::Error),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateKey { collection, key } => {
                write!(f, "duplicate key `{key}` in collection `{collection}`")
            }
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::DuplicateKey { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Collection-scoped document operations.
///
/// Field arguments name one top-level body field; nested paths are not
/// supported.
pub trait DocumentStore {
    /// Inserts one document. `key = None` lets the store generate one.
    /// Returns the key the document was stored under.
    fn insert_one(
        &self,
        collection: Collection,
        key: Option<&str>,
        parent_id: Option<&str>,
        body: &Document,
    ) -> StoreResult<String>;
    fn find_by_key(&self, collection: Collection, key: &str)
        -> StoreResult<Option<StoredDocument>>;
    fn find_by_parent(
        &self,
        collection: Collection,
        parent_id: &str,
    ) -> StoreResult<Vec<StoredDocument>>;
    fn find_all(&self, collection: Collection) -> StoreResult<Vec<StoredDocument>>;
    /// Finds documents whose array field `field` contains the string `member`.
    fn find_by_array_member(
        &self,
        collection: Collection,
        field: &str,
        member: &str,
    ) -> StoreResult<Vec<StoredDocument>>;
    /// Children in `child` whose parent key is missing from `parent`.
    fn find_orphans(
        &self,
        child: Collection,
        parent: Collection,
    ) -> StoreResult<Vec<StoredDocument>>;
    /// Replaces one field. Returns whether a document matched `key`.
    fn set_field(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> StoreResult<bool>;
    /// Appends `member` to an array field, creating the array if absent.
    fn push_to_array(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        member: &str,
    ) -> StoreResult<bool>;
    /// Removes every occurrence of `member` from an array field.
    fn pull_from_array(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        member: &str,
    ) -> StoreResult<bool>;
    fn delete_one(&self, collection: Collection, key: &str) -> StoreResult<bool>;
    /// Deletes every child of `parent_id`. Returns the number deleted.
    fn delete_by_parent(&self, collection: Collection, parent_id: &str) -> StoreResult<usize>;
    fn count(&self, collection: Collection) -> StoreResult<usize>;
    /// Wipes every collection.
    fn clear(&self) -> StoreResult<()>;
}

/// Serializes a record into a document body.
///
/// Fails with `InvalidData` when the record does not serialize to an object.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidData(format!(
            "expected object document, got `{other}`"
        ))),
    }
}

/// Deserializes a document body into a record.
pub fn from_document<T: DeserializeOwned>(body: Document) -> StoreResult<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(body))?)
}

/// Serializes a top-level record, moving its `id` out of the body.
///
/// Returns `(id, body)`; the id becomes the storage key.
pub fn to_keyed_document<T: Serialize>(value: &T) -> StoreResult<(String, Document)> {
    let mut body = to_document(value)?;
    match body.remove("id") {
        Some(serde_json::Value::String(id)) => Ok((id, body)),
        _ => Err(StoreError::InvalidData(
            "top-level record has no string `id` field".to_string(),
        )),
    }
}

/// Rebuilds a top-level record from its storage key and body.
pub fn from_keyed_document<T: DeserializeOwned>(document: StoredDocument) -> StoreResult<T> {
    let mut body = document.body;
    body.insert("id".to_string(), serde_json::Value::String(document.key));
    from_document(body)
}
