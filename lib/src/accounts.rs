//! Per-user account documents holding the remote completion map.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::progress::CompletionMap;

/// `$set` of flattened progress paths on the account matching `email`,
/// creating the account when it does not exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpsertProgress {
    pub email: String,
    pub set: BTreeMap<String, bool>,
}

impl UpsertProgress {
    pub fn new(email: impl Into<String>, progress: &CompletionMap) -> Self {
        Self {
            email: email.into(),
            set: progress.flatten(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    /// Existing accounts whose progress actually changed.
    pub modified: u64,
    /// Accounts created by an upsert.
    pub inserted: u64,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// `None` when no account exists for the email.
    async fn find_progress(&self, email: &str) -> Result<Option<CompletionMap>>;

    async fn bulk_upsert(&self, operations: Vec<UpsertProgress>) -> Result<BulkWriteResult>;
}

#[derive(Debug, Default)]
pub struct MemoryAccounts {
    accounts: Mutex<BTreeMap<String, CompletionMap>>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.lock().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn find_progress(&self, email: &str) -> Result<Option<CompletionMap>> {
        Ok(self.accounts.lock().await.get(email).cloned())
    }

    async fn bulk_upsert(&self, operations: Vec<UpsertProgress>) -> Result<BulkWriteResult> {
        let mut accounts = self.accounts.lock().await;
        let mut result = BulkWriteResult::default();

        for operation in operations {
            match accounts.get_mut(&operation.email) {
                Some(progress) => {
                    if progress.apply_set(&operation.set) {
                        result.modified += 1;
                    }
                }
                None => {
                    let mut progress = CompletionMap::new();
                    progress.apply_set(&operation.set);
                    accounts.insert(operation.email, progress);
                    result.inserted += 1;
                }
            }
        }

        Ok(result)
    }
}

/// Accounts in a SQLite table, progress stored as a JSON document.
pub struct SqliteAccounts {
    conn: Arc<std::sync::Mutex<Connection>>,
}

impl SqliteAccounts {
    pub fn open(path: &Path) -> Result<Self> {
        Self::initialize(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                 email    TEXT PRIMARY KEY,
                 progress TEXT NOT NULL DEFAULT '{}'
             );",
        )?;

        Ok(Self {
            conn: Arc::new(std::sync::Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut conn)
        })
        .await?
    }
}

fn read_progress(conn: &Connection, email: &str) -> Result<Option<CompletionMap>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT progress FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;

    Ok(raw.map(|raw| CompletionMap::from_stored(Some(&raw))))
}

#[async_trait]
impl AccountStore for SqliteAccounts {
    async fn find_progress(&self, email: &str) -> Result<Option<CompletionMap>> {
        let email = email.to_owned();

        self.with_conn(move |conn| read_progress(conn, &email)).await
    }

    async fn bulk_upsert(&self, operations: Vec<UpsertProgress>) -> Result<BulkWriteResult> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut result = BulkWriteResult::default();

            for operation in operations {
                match read_progress(&tx, &operation.email)? {
                    Some(mut progress) => {
                        if progress.apply_set(&operation.set) {
                            tx.execute(
                                "UPDATE users SET progress = ?2 WHERE email = ?1",
                                params![operation.email, serde_json::to_string(&progress)?],
                            )?;
                            result.modified += 1;
                        }
                    }
                    None => {
                        let mut progress = CompletionMap::new();
                        progress.apply_set(&operation.set);

                        tx.execute(
                            "INSERT INTO users (email, progress) VALUES (?1, ?2)",
                            params![operation.email, serde_json::to_string(&progress)?],
                        )?;
                        result.inserted += 1;
                    }
                }
            }

            tx.commit()?;

            Ok(result)
        })
        .await
    }
}
