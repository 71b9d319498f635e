//! Core PlanStore implementation

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{MAX_APPEND_ATTEMPTS, StoreError, StoreResult};

/// How long SQLite waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A parent document owning a sequence of versions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: String,
    /// Owning identity; all access is scoped by this
    pub owner_id: String,
    /// Human-readable title
    pub title: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Timestamp of the most recent version append (Unix milliseconds)
    pub updated_at: i64,
}

/// An immutable full-content snapshot of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    /// Unique identifier
    pub id: String,
    /// The document this version belongs to
    pub document_id: String,
    /// Owning identity
    pub owner_id: String,
    /// Strictly increasing, gapless, starting at 1 per document
    pub version_number: i64,
    /// Full content snapshot
    pub content: Value,
    /// Human-readable description of what changed
    pub changes_summary: String,
    /// The version this one was derived or restored from, if any
    pub parent_version_id: Option<String>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

/// The versioned document store
pub struct PlanStore {
    conn: Connection,
}

impl PlanStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = Self::init(conn)?;
        debug!(path = %path.as_ref().display(), "Opened plan store");
        Ok(store)
    }

    /// Open an in-memory store (single connection, mainly for tests)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL,
                title       TEXT NOT NULL,
                created_at  INTEGER NOT NULL,
                updated_at  INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS versions (
                id                TEXT PRIMARY KEY,
                document_id       TEXT NOT NULL REFERENCES documents(id),
                owner_id          TEXT NOT NULL,
                version_number    INTEGER NOT NULL,
                content           TEXT NOT NULL,
                changes_summary   TEXT NOT NULL,
                parent_version_id TEXT,
                created_at        INTEGER NOT NULL,
                UNIQUE(document_id, version_number)
            );
            CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id);
            CREATE INDEX IF NOT EXISTS idx_versions_document ON versions(document_id);",
        )?;
        Ok(Self { conn })
    }

    /// Create a new document with its initial version (version 1)
    pub fn create_document(
        &mut self,
        owner_id: &str,
        title: &str,
        content: &Value,
        changes_summary: &str,
    ) -> StoreResult<(Document, Version)> {
        let now = now_ms();
        let document = Document {
            id: Uuid::now_v7().to_string(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        let version = Version {
            id: Uuid::now_v7().to_string(),
            document_id: document.id.clone(),
            owner_id: owner_id.to_string(),
            version_number: 1,
            content: content.clone(),
            changes_summary: changes_summary.to_string(),
            parent_version_id: None,
            created_at: now,
        };

        let content_json = serde_json::to_string(content)?;
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO documents (id, owner_id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![document.id, document.owner_id, document.title, now, now],
        )?;
        tx.execute(
            "INSERT INTO versions (id, document_id, owner_id, version_number, content,
                                   changes_summary, parent_version_id, created_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5, NULL, ?6)",
            params![version.id, document.id, owner_id, content_json, changes_summary, now],
        )?;
        tx.commit()?;

        info!(document_id = %document.id, %owner_id, "Created document");
        Ok((document, version))
    }

    /// Append a new version for a document
    ///
    /// The version number is `max(existing) + 1`, computed inside an
    /// immediate transaction. A concurrent append racing through the unique
    /// constraint is retried with a fresh number up to [`MAX_APPEND_ATTEMPTS`]
    /// times before surfacing [`StoreError::Conflict`].
    pub fn append_version(
        &mut self,
        owner_id: &str,
        document_id: &str,
        content: &Value,
        changes_summary: &str,
        parent_version_id: Option<&str>,
    ) -> StoreResult<Version> {
        let content_json = serde_json::to_string(content)?;
        let mut rng = rand::rng();

        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            match self.try_append(owner_id, document_id, &content_json, changes_summary, parent_version_id) {
                Ok(number) => {
                    debug!(%document_id, version_number = number, "Appended version");
                    return self.version_by_number(owner_id, document_id, number);
                }
                Err(e) if is_unique_violation(&e) && attempt < MAX_APPEND_ATTEMPTS => {
                    let backoff = Duration::from_millis(rng.random_range(5..=25) * attempt as u64);
                    warn!(%document_id, attempt, "Version number collision, retrying");
                    std::thread::sleep(backoff);
                }
                Err(e) if is_unique_violation(&e) => {
                    return Err(StoreError::Conflict {
                        document_id: document_id.to_string(),
                        attempts: MAX_APPEND_ATTEMPTS,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Err(StoreError::Conflict {
            document_id: document_id.to_string(),
            attempts: MAX_APPEND_ATTEMPTS,
        })
    }

    /// One append attempt; returns the assigned version number
    fn try_append(
        &mut self,
        owner_id: &str,
        document_id: &str,
        content_json: &str,
        changes_summary: &str,
        parent_version_id: Option<&str>,
    ) -> StoreResult<i64> {
        let now = now_ms();
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Ownership check inside the transaction; missing and foreign
        // documents are indistinguishable to the caller
        let owned: Option<String> = tx
            .query_row(
                "SELECT id FROM documents WHERE id = ?1 AND owner_id = ?2",
                params![document_id, owner_id],
                |row| row.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(StoreError::NotFound(format!("document {}", document_id)));
        }

        let next: i64 = tx.query_row(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM versions WHERE document_id = ?1",
            params![document_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO versions (id, document_id, owner_id, version_number, content,
                                   changes_summary, parent_version_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Uuid::now_v7().to_string(),
                document_id,
                owner_id,
                next,
                content_json,
                changes_summary,
                parent_version_id,
                now
            ],
        )?;
        tx.execute(
            "UPDATE documents SET updated_at = ?1 WHERE id = ?2",
            params![now, document_id],
        )?;
        tx.commit()?;
        Ok(next)
    }

    /// Restore an old version by appending its content as a new version
    ///
    /// The target version is left untouched; the new version records it as
    /// parent. Later versions are never deleted.
    pub fn restore(&mut self, owner_id: &str, document_id: &str, version_id: &str) -> StoreResult<Version> {
        let target = self.get_version(owner_id, document_id, version_id)?;
        let summary = format!("Restored from version {}", target.version_number);
        let restored = self.append_version(owner_id, document_id, &target.content, &summary, Some(version_id))?;
        info!(
            %document_id,
            from = target.version_number,
            to = restored.version_number,
            "Restored version"
        );
        Ok(restored)
    }

    /// Get a document by id, scoped by owner
    pub fn get_document(&self, owner_id: &str, document_id: &str) -> StoreResult<Document> {
        self.conn
            .query_row(
                "SELECT id, owner_id, title, created_at, updated_at
                 FROM documents WHERE id = ?1 AND owner_id = ?2",
                params![document_id, owner_id],
                row_to_document,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("document {}", document_id)))
    }

    /// List all documents for an owner, most recently updated first
    pub fn list_documents(&self, owner_id: &str) -> StoreResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, title, created_at, updated_at
             FROM documents WHERE owner_id = ?1 ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![owner_id], row_to_document)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// List all versions of a document, newest first
    pub fn list_versions(&self, owner_id: &str, document_id: &str) -> StoreResult<Vec<Version>> {
        // Ownership first, so a foreign document reads as NotFound
        self.get_document(owner_id, document_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT id, document_id, owner_id, version_number, content,
                    changes_summary, parent_version_id, created_at
             FROM versions WHERE document_id = ?1 ORDER BY version_number DESC",
        )?;
        let rows = stmt.query_map(params![document_id], row_to_version)?;
        rows.map(|r| r.map_err(StoreError::from).and_then(parse_content))
            .collect()
    }

    /// Get a specific version of a document
    pub fn get_version(&self, owner_id: &str, document_id: &str, version_id: &str) -> StoreResult<Version> {
        self.conn
            .query_row(
                "SELECT id, document_id, owner_id, version_number, content,
                        changes_summary, parent_version_id, created_at
                 FROM versions WHERE id = ?1 AND document_id = ?2 AND owner_id = ?3",
                params![version_id, document_id, owner_id],
                row_to_version,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("version {}", version_id)))
            .and_then(parse_content)
    }

    /// Get the most recent version of a document
    pub fn latest_version(&self, owner_id: &str, document_id: &str) -> StoreResult<Version> {
        self.conn
            .query_row(
                "SELECT id, document_id, owner_id, version_number, content,
                        changes_summary, parent_version_id, created_at
                 FROM versions WHERE document_id = ?1 AND owner_id = ?2
                 ORDER BY version_number DESC LIMIT 1",
                params![document_id, owner_id],
                row_to_version,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("document {}", document_id)))
            .and_then(parse_content)
    }

    fn version_by_number(&self, owner_id: &str, document_id: &str, number: i64) -> StoreResult<Version> {
        self.conn
            .query_row(
                "SELECT id, document_id, owner_id, version_number, content,
                        changes_summary, parent_version_id, created_at
                 FROM versions WHERE document_id = ?1 AND owner_id = ?2 AND version_number = ?3",
                params![document_id, owner_id, number],
                row_to_version,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("version {} of {}", number, document_id)))
            .and_then(parse_content)
    }
}

/// Current time in Unix milliseconds
fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn is_unique_violation(e: &StoreError) -> bool {
    matches!(
        e,
        StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn row_to_document(row: &rusqlite::Row<'_>) -> Result<Document, rusqlite::Error> {
    Ok(Document {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Map a version row, leaving content as a raw JSON string wrapped in Value
fn row_to_version(row: &rusqlite::Row<'_>) -> Result<Version, rusqlite::Error> {
    let raw: String = row.get(4)?;
    Ok(Version {
        id: row.get(0)?,
        document_id: row.get(1)?,
        owner_id: row.get(2)?,
        version_number: row.get(3)?,
        content: Value::String(raw),
        changes_summary: row.get(5)?,
        parent_version_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Parse the raw JSON text captured by [`row_to_version`]
fn parse_content(mut version: Version) -> StoreResult<Version> {
    if let Value::String(raw) = &version.content {
        version.content = serde_json::from_str(raw)?;
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(n: u32) -> Value {
        json!({ "problem_statement": format!("problem revision {}", n) })
    }

    #[test]
    fn test_create_document_starts_at_version_one() {
        let mut store = PlanStore::open_in_memory().unwrap();
        let (doc, v1) = store
            .create_document("alice", "Bakery plan", &content(1), "Initial plan")
            .unwrap();

        assert_eq!(v1.version_number, 1);
        assert_eq!(v1.document_id, doc.id);
        assert_eq!(v1.parent_version_id, None);
        assert_eq!(v1.content, content(1));
    }

    #[test]
    fn test_sequential_appends_are_gapless() {
        let mut store = PlanStore::open_in_memory().unwrap();
        let (doc, _) = store
            .create_document("alice", "Bakery plan", &content(1), "Initial plan")
            .unwrap();

        for n in 2..=6 {
            let v = store
                .append_version("alice", &doc.id, &content(n), "Refined", None)
                .unwrap();
            assert_eq!(v.version_number, n as i64);
        }

        let versions = store.list_versions("alice", &doc.id).unwrap();
        let numbers: Vec<i64> = versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_restore_appends_without_touching_history() {
        let mut store = PlanStore::open_in_memory().unwrap();
        let (doc, v1) = store
            .create_document("alice", "Bakery plan", &content(1), "Initial plan")
            .unwrap();
        store
            .append_version("alice", &doc.id, &content(2), "Refined", None)
            .unwrap();

        let restored = store.restore("alice", &doc.id, &v1.id).unwrap();
        assert_eq!(restored.version_number, 3);
        assert_eq!(restored.changes_summary, "Restored from version 1");
        assert_eq!(restored.parent_version_id, Some(v1.id.clone()));
        assert_eq!(restored.content, v1.content);

        // Original version unchanged, later versions still present
        let versions = store.list_versions("alice", &doc.id).unwrap();
        assert_eq!(versions.len(), 3);
        let original = versions.iter().find(|v| v.id == v1.id).unwrap();
        assert_eq!(original.version_number, 1);
        assert_eq!(original.content, content(1));
    }

    #[test]
    fn test_restore_unknown_version_is_not_found() {
        let mut store = PlanStore::open_in_memory().unwrap();
        let (doc, _) = store
            .create_document("alice", "Bakery plan", &content(1), "Initial plan")
            .unwrap();

        let err = store.restore("alice", &doc.id, "no-such-version").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_cross_owner_access_is_not_found() {
        let mut store = PlanStore::open_in_memory().unwrap();
        let (doc, v1) = store
            .create_document("alice", "Bakery plan", &content(1), "Initial plan")
            .unwrap();

        assert!(store.get_document("mallory", &doc.id).unwrap_err().is_not_found());
        assert!(store.list_versions("mallory", &doc.id).unwrap_err().is_not_found());
        assert!(
            store
                .get_version("mallory", &doc.id, &v1.id)
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            store
                .append_version("mallory", &doc.id, &content(2), "hijack", None)
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_latest_version() {
        let mut store = PlanStore::open_in_memory().unwrap();
        let (doc, _) = store
            .create_document("alice", "Bakery plan", &content(1), "Initial plan")
            .unwrap();
        store
            .append_version("alice", &doc.id, &content(2), "Refined", None)
            .unwrap();

        let latest = store.latest_version("alice", &doc.id).unwrap();
        assert_eq!(latest.version_number, 2);
        assert_eq!(latest.content, content(2));
    }

    #[test]
    fn test_list_documents_scoped_by_owner() {
        let mut store = PlanStore::open_in_memory().unwrap();
        store
            .create_document("alice", "Plan A", &content(1), "Initial plan")
            .unwrap();
        store
            .create_document("bob", "Plan B", &content(1), "Initial plan")
            .unwrap();

        let docs = store.list_documents("alice").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Plan A");
    }

    #[test]
    fn test_concurrent_appends_assign_unique_numbers() {
        let temp = tempfile::TempDir::new().unwrap();
        let db_path = temp.path().join("plans.db");

        let doc_id = {
            let mut store = PlanStore::open(&db_path).unwrap();
            let (doc, _) = store
                .create_document("alice", "Bakery plan", &content(1), "Initial plan")
                .unwrap();
            doc.id
        };

        let mut handles = Vec::new();
        for t in 0..4 {
            let db_path = db_path.clone();
            let doc_id = doc_id.clone();
            handles.push(std::thread::spawn(move || {
                let mut store = PlanStore::open(&db_path).unwrap();
                for i in 0..5 {
                    store
                        .append_version("alice", &doc_id, &content(t * 10 + i), "Concurrent refine", None)
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let store = PlanStore::open(&db_path).unwrap();
        let versions = store.list_versions("alice", &doc_id).unwrap();
        let mut numbers: Vec<i64> = versions.iter().map(|v| v.version_number).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=21).collect::<Vec<i64>>());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Append,
            Restore(usize),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => Just(Op::Append),
                1 => (0usize..32).prop_map(Op::Restore),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            /// After any sequence of appends and restores, version numbers
            /// are strictly increasing and gapless starting at 1.
            #[test]
            fn version_numbers_stay_gapless(ops in proptest::collection::vec(op_strategy(), 0..24)) {
                let mut store = PlanStore::open_in_memory().unwrap();
                let (doc, _) = store
                    .create_document("alice", "Bakery plan", &content(0), "Initial plan")
                    .unwrap();

                for (n, op) in ops.iter().enumerate() {
                    match op {
                        Op::Append => {
                            store
                                .append_version("alice", &doc.id, &content(n as u32 + 1), "Refined", None)
                                .unwrap();
                        }
                        Op::Restore(pick) => {
                            let versions = store.list_versions("alice", &doc.id).unwrap();
                            let target = &versions[pick % versions.len()];
                            let target_id = target.id.clone();
                            store.restore("alice", &doc.id, &target_id).unwrap();
                        }
                    }
                }

                let versions = store.list_versions("alice", &doc.id).unwrap();
                let expected: Vec<i64> = (1..=versions.len() as i64).rev().collect();
                let numbers: Vec<i64> = versions.iter().map(|v| v.version_number).collect();
                prop_assert_eq!(numbers, expected);
            }
        }
    }
}
