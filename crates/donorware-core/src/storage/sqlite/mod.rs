//! SQLite storage backend.
//!
//! The whole library is written to a fresh database file next to the target
//! and moved into place with a rename, so a crash mid-save never leaves a
//! half-written store behind.

mod row;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction as SqlTransaction};
use tracing::debug;

use crate::catalog::Item;
use crate::error::{DonorError, Result};
use crate::lending::{ClosedLoan, Loan};
use crate::library::LibraryState;
use crate::registry::User;
use crate::storage::traits::StateStore;

use row::{format_date, ClosedLoanRow, ItemRow, LoanRow, TransactionRow, UserRow};

/// Schema version written to the `meta` table.
pub const SCHEMA_VERSION: &str = "1";

const SCHEMA: &str = r#"
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE users (
        username TEXT PRIMARY KEY,
        password_hash TEXT NOT NULL,
        registered_at TEXT NOT NULL
    );

    CREATE TABLE items (
        id INTEGER PRIMARY KEY,
        kind TEXT NOT NULL,
        title TEXT NOT NULL,
        contributor TEXT NOT NULL,
        details_json TEXT NOT NULL,
        status TEXT NOT NULL,
        added_at TEXT NOT NULL,

        FOREIGN KEY(contributor) REFERENCES users(username)
    );

    -- At most one active loan per item
    CREATE TABLE loans (
        item_id INTEGER PRIMARY KEY,
        borrower TEXT NOT NULL,
        borrowed_on TEXT NOT NULL,
        due_on TEXT NOT NULL,

        FOREIGN KEY(item_id) REFERENCES items(id),
        FOREIGN KEY(borrower) REFERENCES users(username)
    );

    CREATE TABLE loan_history (
        seq INTEGER PRIMARY KEY,
        item_id INTEGER NOT NULL,
        borrower TEXT NOT NULL,
        borrowed_on TEXT NOT NULL,
        due_on TEXT NOT NULL,
        returned_on TEXT NOT NULL
    );

    -- Per-user borrow/return events; seq keeps each user's order
    CREATE TABLE transactions (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        seq INTEGER NOT NULL,
        item_id INTEGER NOT NULL,
        kind TEXT NOT NULL,
        date TEXT NOT NULL,
        due_date TEXT,

        UNIQUE(username, seq),
        FOREIGN KEY(username) REFERENCES users(username)
    );
"#;

/// SQLite-file state store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| DonorError::Storage("Invalid store path".to_string()))?;
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DonorError::Storage(format!("System time error: {}", e)))?
            .as_nanos();
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| DonorError::Storage("Invalid store filename".to_string()))?;
        Ok(parent.join(format!("{}.{}.tmp", filename, nanos)))
    }

    fn write_state(conn: &mut Connection, state: &LibraryState) -> Result<()> {
        conn.execute_batch(SCHEMA)?;
        let tx = conn.transaction()?;

        let saved_at = Utc::now().to_rfc3339();
        for (key, value) in [
            ("schema_version", SCHEMA_VERSION.to_string()),
            ("next_item_id", state.next_item_id.to_string()),
            ("saved_at", saved_at),
        ] {
            tx.execute("INSERT INTO meta (key, value) VALUES (?, ?)", (key, value))?;
        }

        for user in &state.users {
            Self::write_user(&tx, user)?;
        }

        for item in &state.items {
            tx.execute(
                "INSERT INTO items (id, kind, title, contributor, details_json, status, added_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                (
                    item.id.get() as i64,
                    item.kind().as_str(),
                    &item.title,
                    &item.contributor,
                    serde_json::to_string(&item.details)?,
                    item.status.as_str(),
                    item.added_at.to_rfc3339(),
                ),
            )?;
        }

        for loan in &state.loans {
            tx.execute(
                "INSERT INTO loans (item_id, borrower, borrowed_on, due_on) VALUES (?, ?, ?, ?)",
                (
                    loan.item_id.get() as i64,
                    &loan.borrower,
                    format_date(loan.borrowed_on),
                    format_date(loan.due_on),
                ),
            )?;
        }

        for closed in &state.closed_loans {
            tx.execute(
                "INSERT INTO loan_history (item_id, borrower, borrowed_on, due_on, returned_on)
                 VALUES (?, ?, ?, ?, ?)",
                (
                    closed.loan.item_id.get() as i64,
                    &closed.loan.borrower,
                    format_date(closed.loan.borrowed_on),
                    format_date(closed.loan.due_on),
                    format_date(closed.returned_on),
                ),
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn write_user(tx: &SqlTransaction<'_>, user: &User) -> Result<()> {
        tx.execute(
            "INSERT INTO users (username, password_hash, registered_at) VALUES (?, ?, ?)",
            (
                &user.username,
                &user.password_hash,
                user.registered_at.to_rfc3339(),
            ),
        )?;
        for (seq, transaction) in user.history.iter().enumerate() {
            tx.execute(
                "INSERT INTO transactions (id, username, seq, item_id, kind, date, due_date)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                (
                    transaction.id.to_string(),
                    &user.username,
                    seq as i64,
                    transaction.item_id.get() as i64,
                    transaction.kind.as_str(),
                    format_date(transaction.date),
                    transaction.due_date.map(format_date),
                ),
            )?;
        }
        Ok(())
    }

    fn read_state(conn: &Connection) -> Result<LibraryState> {
        let version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        match version.as_deref() {
            Some(SCHEMA_VERSION) => {}
            Some(other) => {
                return Err(DonorError::Storage(format!(
                    "Unsupported store schema version {}",
                    other
                )))
            }
            None => {
                return Err(DonorError::Storage(
                    "Store is missing its schema version".to_string(),
                ))
            }
        }

        let next_item_id: String = conn.query_row(
            "SELECT value FROM meta WHERE key = 'next_item_id'",
            [],
            |row| row.get(0),
        )?;
        let next_item_id: u64 = next_item_id
            .parse()
            .map_err(|e| DonorError::Storage(format!("Invalid next_item_id: {}", e)))?;

        let mut users: Vec<User> = {
            let mut stmt = conn.prepare(
                "SELECT username, password_hash, registered_at FROM users ORDER BY username",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserRow {
                        username: row.get(0)?,
                        password_hash: row.get(1)?,
                        registered_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(User::try_from)
                .collect::<Result<Vec<_>>>()?
        };

        let mut histories: BTreeMap<String, Vec<_>> = BTreeMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT id, username, item_id, kind, date, due_date
                 FROM transactions ORDER BY username, seq",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(TransactionRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        item_id: row.get(2)?,
                        kind: row.get(3)?,
                        date: row.get(4)?,
                        due_date: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for row in rows {
                let (username, transaction) = row.into_parts()?;
                histories.entry(username).or_default().push(transaction);
            }
        }
        for user in &mut users {
            if let Some(history) = histories.remove(&user.username) {
                user.history = history;
            }
        }
        if let Some(orphan) = histories.keys().next() {
            return Err(DonorError::Storage(format!(
                "Transactions recorded for unknown user {}",
                orphan
            )));
        }

        let items = {
            let mut stmt = conn.prepare(
                "SELECT id, kind, title, contributor, details_json, status, added_at
                 FROM items ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ItemRow {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                        title: row.get(2)?,
                        contributor: row.get(3)?,
                        details_json: row.get(4)?,
                        status: row.get(5)?,
                        added_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(Item::try_from).collect::<Result<Vec<_>>>()?
        };

        let loans = {
            let mut stmt = conn.prepare(
                "SELECT item_id, borrower, borrowed_on, due_on FROM loans ORDER BY item_id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(LoanRow {
                        item_id: row.get(0)?,
                        borrower: row.get(1)?,
                        borrowed_on: row.get(2)?,
                        due_on: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(Loan::try_from).collect::<Result<Vec<_>>>()?
        };

        let closed_loans = {
            let mut stmt = conn.prepare(
                "SELECT item_id, borrower, borrowed_on, due_on, returned_on
                 FROM loan_history ORDER BY seq",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ClosedLoanRow {
                        loan: LoanRow {
                            item_id: row.get(0)?,
                            borrower: row.get(1)?,
                            borrowed_on: row.get(2)?,
                            due_on: row.get(3)?,
                        },
                        returned_on: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(ClosedLoan::try_from).collect::<Result<Vec<_>>>()?
        };

        Ok(LibraryState {
            users,
            items,
            loans,
            closed_loans,
            next_item_id,
        })
    }
}

impl StateStore for SqliteStore {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn create(&self) -> Result<()> {
        if self.exists() {
            return Err(DonorError::Storage(format!(
                "Store already exists at {}",
                self.path.display()
            )));
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        self.save(&LibraryState {
            next_item_id: 1,
            ..LibraryState::default()
        })
    }

    fn load(&self) -> Result<LibraryState> {
        if !self.exists() {
            return Err(DonorError::Storage(format!(
                "No store at {} (run `donorware init`)",
                self.path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let state = Self::read_state(&conn)?;
        debug!(
            path = %self.path.display(),
            users = state.users.len(),
            items = state.items.len(),
            loans = state.loans.len(),
            "loaded store"
        );
        Ok(state)
    }

    fn save(&self, state: &LibraryState) -> Result<()> {
        let temp_path = self.temp_path()?;
        let written = Connection::open_with_flags(
            &temp_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(DonorError::from)
        .and_then(|mut conn| {
            Self::write_state(&mut conn, state)?;
            conn.close().map_err(|(_, e)| DonorError::from(e))
        });
        if let Err(err) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        crate::fs::rename_with_fallback(&temp_path, &self.path)
            .map_err(|e| DonorError::Storage(format!("Atomic rename failed: {}", e)))?;
        debug!(
            path = %self.path.display(),
            users = state.users.len(),
            items = state.items.len(),
            loans = state.loans.len(),
            "saved store"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_writes_empty_state() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("nested").join("store.db"));

        store.create().unwrap();
        assert!(store.exists());

        let state = store.load().unwrap();
        assert!(state.users.is_empty());
        assert!(state.items.is_empty());
        assert_eq!(state.next_item_id, 1);
    }

    #[test]
    fn test_create_twice_fails() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("store.db"));
        store.create().unwrap();
        assert!(matches!(store.create(), Err(DonorError::Storage(_))));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("store.db"));
        store.create().unwrap();
        store.save(&store.load().unwrap()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["store.db".to_string()]);
    }

    #[test]
    fn test_unknown_schema_version_is_rejected() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("store.db"));
        store.create().unwrap();
        {
            let conn = Connection::open(store.path()).unwrap();
            conn.execute(
                "UPDATE meta SET value = '99' WHERE key = 'schema_version'",
                [],
            )
            .unwrap();
        }
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("99"));
    }
}
