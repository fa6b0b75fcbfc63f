//! SQLite implementation of the document store.
//!
//! All collections share the `documents` table. Bodies are JSON text and
//! array/field updates use SQLite JSON functions, so each update is one
//! statement against one row.

use super::{Collection, Document, DocumentStore, StoreError, StoreResult, StoredDocument};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT doc_key, parent_id, body FROM documents";

/// Document store over a migrated connection from `db::open_db*`.
#[derive(Clone, Copy)]
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_documents(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StoreResult<Vec<StoredDocument>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn insert_one(
        &self,
        collection: Collection,
        key: Option<&str>,
        parent_id: Option<&str>,
        body: &Document,
    ) -> StoreResult<String> {
        let key = match key {
            Some(key) => key.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let body_text = serde_json::to_string(body)?;

        let inserted = self.conn.execute(
            "INSERT INTO documents (collection, doc_key, parent_id, body)
             VALUES (?1, ?2, ?3, ?4);",
            params![collection.name(), key.as_str(), parent_id, body_text],
        );

        match inserted {
            Ok(_) => Ok(key),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::DuplicateKey { collection, key })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_by_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> StoreResult<Option<StoredDocument>> {
        let row = self
            .conn
            .query_row(
                &format!("{DOCUMENT_SELECT_SQL} WHERE collection = ?1 AND doc_key = ?2;"),
                params![collection.name(), key],
                |row| {
                    Ok((
                        row.get::<_, String>("doc_key")?,
                        row.get::<_, Option<String>>("parent_id")?,
                        row.get::<_, String>("body")?,
                    ))
                },
            )
            .optional()?;

        row.map(|(key, parent_id, body)| build_document(key, parent_id, &body))
            .transpose()
    }

    fn find_by_parent(
        &self,
        collection: Collection,
        parent_id: &str,
    ) -> StoreResult<Vec<StoredDocument>> {
        self.query_documents(
            &format!(
                "{DOCUMENT_SELECT_SQL}
                 WHERE collection = ?1 AND parent_id = ?2
                 ORDER BY seq ASC;"
            ),
            params![collection.name(), parent_id],
        )
    }

    fn find_all(&self, collection: Collection) -> StoreResult<Vec<StoredDocument>> {
        self.query_documents(
            &format!("{DOCUMENT_SELECT_SQL} WHERE collection = ?1 ORDER BY seq ASC;"),
            params![collection.name()],
        )
    }

    fn find_by_array_member(
        &self,
        collection: Collection,
        field: &str,
        member: &str,
    ) -> StoreResult<Vec<StoredDocument>> {
        let path = field_path(field)?;
        self.query_documents(
            "SELECT d.doc_key, d.parent_id, d.body
             FROM documents d
             WHERE d.collection = ?1
               AND EXISTS (
                   SELECT 1 FROM json_each(d.body, ?2) AS j
                   WHERE j.type = 'text' AND j.value = ?3
               )
             ORDER BY d.seq ASC;",
            params![collection.name(), path, member],
        )
    }

    fn find_orphans(
        &self,
        child: Collection,
        parent: Collection,
    ) -> StoreResult<Vec<StoredDocument>> {
        self.query_documents(
            "SELECT c.doc_key, c.parent_id, c.body
             FROM documents c
             WHERE c.collection = ?1
               AND c.parent_id IS NOT NULL
               AND NOT EXISTS (
                   SELECT 1 FROM documents p
                   WHERE p.collection = ?2 AND p.doc_key = c.parent_id
               )
             ORDER BY c.seq ASC;",
            params![child.name(), parent.name()],
        )
    }

    fn set_field(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> StoreResult<bool> {
        let path = field_path(field)?;
        let value_text = serde_json::to_string(value)?;
        let changed = self.conn.execute(
            "UPDATE documents
             SET body = json_set(body, ?3, json(?4))
             WHERE collection = ?1 AND doc_key = ?2;",
            params![collection.name(), key, path, value_text],
        )?;
        Ok(changed > 0)
    }

    fn push_to_array(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        member: &str,
    ) -> StoreResult<bool> {
        let path = field_path(field)?;
        let changed = self.conn.execute(
            "UPDATE documents
             SET body = json_set(
                 body,
                 ?3,
                 json_insert(COALESCE(json_extract(body, ?3), json_array()), '$[#]', ?4)
             )
             WHERE collection = ?1 AND doc_key = ?2;",
            params![collection.name(), key, path, member],
        )?;
        Ok(changed > 0)
    }

    fn pull_from_array(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        member: &str,
    ) -> StoreResult<bool> {
        let path = field_path(field)?;
        let changed = self.conn.execute(
            "UPDATE documents
             SET body = json_set(
                 body,
                 ?3,
                 (SELECT json_group_array(j.value)
                  FROM json_each(documents.body, ?3) AS j
                  WHERE NOT (j.type = 'text' AND j.value = ?4))
             )
             WHERE collection = ?1 AND doc_key = ?2;",
            params![collection.name(), key, path, member],
        )?;
        Ok(changed > 0)
    }

    fn delete_one(&self, collection: Collection, key: &str) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_key = ?2;",
            params![collection.name(), key],
        )?;
        Ok(changed > 0)
    }

    fn delete_by_parent(&self, collection: Collection, parent_id: &str) -> StoreResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND parent_id = ?2;",
            params![collection.name(), parent_id],
        )?;
        Ok(changed)
    }

    fn count(&self, collection: Collection) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1;",
            [collection.name()],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative document count `{count}`")))
    }

    fn clear(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM documents;", [])?;
        Ok(())
    }
}

fn parse_document_row(row: &Row<'_>) -> StoreResult<StoredDocument> {
    let key: String = row.get("doc_key")?;
    let parent_id: Option<String> = row.get("parent_id")?;
    let body: String = row.get("body")?;
    build_document(key, parent_id, &body)
}

fn build_document(key: String, parent_id: Option<String>, body: &str) -> StoreResult<StoredDocument> {
    match serde_json::from_str(body)? {
        serde_json::Value::Object(body) => Ok(StoredDocument {
            key,
            parent_id,
            body,
        }),
        _ => Err(StoreError::InvalidData(format!(
            "document `{key}` body is not a JSON object"
        ))),
    }
}

/// Builds a JSON path for one top-level field.
fn field_path(field: &str) -> StoreResult<String> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid {
        return Err(StoreError::InvalidData(format!(
            "unsupported document field name `{field}`"
        )));
    }
    Ok(format!("$.{field}"))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
