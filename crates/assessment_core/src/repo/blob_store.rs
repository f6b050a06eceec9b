//! Key/value blob storage contract and backends.
//!
//! # Responsibility
//! - Persist one JSON document per storage key.
//! - Keep SQL details inside the repository boundary.
//!
//! # Invariants
//! - `save` replaces any previous blob under the same key.
//! - `load` of a missing key is `Ok(None)`, never an error.
//! - A stored payload that is not valid JSON surfaces as `StoreError::Corrupt`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::codec::CodecError;
use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BLOBS_TABLE: &str = "blobs";

/// Result type used by blob store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from blob store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Stored payload under `key` is not valid JSON.
    Corrupt { key: String, message: String },
    /// Payload could not be encoded for storage.
    Encode(serde_json::Error),
    /// Blob is valid JSON but not a valid assessment document.
    Codec(CodecError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "blob store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "blob store requires table `{table}`")
            }
            Self::Corrupt { key, message } => {
                write!(f, "stored blob `{key}` is corrupt: {message}")
            }
            Self::Encode(err) => write!(f, "cannot encode blob: {err}"),
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::Corrupt { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<CodecError> for StoreError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Save/load contract for `(key, JSON blob)` pairs.
pub trait BlobStore {
    /// Stores `value` under `key`, replacing any previous blob.
    fn save(&self, key: &str, value: &Value) -> StoreResult<()>;
    /// Loads the blob under `key`, if any.
    fn load(&self, key: &str) -> StoreResult<Option<Value>>;
    /// Removes the blob under `key`. Returns whether one existed.
    fn remove(&self, key: &str) -> StoreResult<bool>;
}

impl<T: BlobStore + ?Sized> BlobStore for &T {
    fn save(&self, key: &str, value: &Value) -> StoreResult<()> {
        (**self).save(key, value)
    }

    fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        (**self).load(key)
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        (**self).remove(key)
    }
}

/// SQLite-backed blob store over the `blobs` table.
pub struct SqliteBlobStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlobStore<'conn> {
    /// Creates the store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_blob_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BlobStore for SqliteBlobStore<'_> {
    fn save(&self, key: &str, value: &Value) -> StoreResult<()> {
        let payload = serde_json::to_string(value).map_err(StoreError::Encode)?;
        self.conn.execute(
            "INSERT INTO blobs (blob_key, payload, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(blob_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key, payload, Timestamp::now().as_millisecond()],
        )?;
        Ok(())
    }

    fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM blobs WHERE blob_key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        payload.map(|payload| parse_payload(key, &payload)).transpose()
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM blobs WHERE blob_key = ?1;", [key])?;
        Ok(changed > 0)
    }
}

/// Process-local blob store, used by tests and hosts without a database.
///
/// Payloads are kept as raw text so corrupt blobs can be simulated.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RefCell<BTreeMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `payload` verbatim, without JSON validation.
    pub fn insert_raw(&self, key: impl Into<String>, payload: impl Into<String>) {
        self.blobs.borrow_mut().insert(key.into(), payload.into());
    }

    pub fn len(&self) -> usize {
        self.blobs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.borrow().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn save(&self, key: &str, value: &Value) -> StoreResult<()> {
        let payload = serde_json::to_string(value).map_err(StoreError::Encode)?;
        self.blobs.borrow_mut().insert(key.to_string(), payload);
        Ok(())
    }

    fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        self.blobs
            .borrow()
            .get(key)
            .map(|payload| parse_payload(key, payload))
            .transpose()
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        Ok(self.blobs.borrow_mut().remove(key).is_some())
    }
}

fn parse_payload(key: &str, payload: &str) -> StoreResult<Value> {
    serde_json::from_str(payload).map_err(|err| StoreError::Corrupt {
        key: key.to_string(),
        message: err.to_string(),
    })
}

fn ensure_blob_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [BLOBS_TABLE],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::MissingRequiredTable(BLOBS_TABLE));
    }
    Ok(())
}
