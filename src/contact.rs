//! Contact message persistence

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, error, info};

/// A visitor's message from the contact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Deliberately opaque: storage details never reach the visitor
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Failed to send message")]
    SendFailed,
}

/// Reply sent back for a contact submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum ContactReply {
    Sent,
    Failed { message: String },
}

impl From<Result<(), ContactError>> for ContactReply {
    fn from(result: Result<(), ContactError>) -> Self {
        match result {
            Ok(()) => ContactReply::Sent,
            Err(e) => ContactReply::Failed {
                message: e.to_string(),
            },
        }
    }
}

/// Append-only store for contact messages
pub trait ContactStore: Send + Sync {
    fn submit(&self, message: &ContactMessage) -> Result<(), ContactError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contact_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);";

/// SQLite-backed contact store
pub struct SqliteContactStore {
    conn: Mutex<Connection>,
}

impl SqliteContactStore {
    /// Open (or create) the database file and ensure the table exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// In-memory store (for testing)
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(SCHEMA)?;
        info!("Contact store ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored messages
    pub fn count(&self) -> Result<usize, ContactError> {
        let conn = self.conn.lock().map_err(|_| ContactError::SendFailed)?;
        conn.query_row("SELECT COUNT(*) FROM contact_messages", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(|e| {
            error!(error = %e, "Failed to count contact messages");
            ContactError::SendFailed
        })
    }

    /// Append a row and return its id
    fn insert(&self, message: &ContactMessage) -> Result<i64, ContactError> {
        let conn = self.conn.lock().map_err(|_| {
            error!("Contact store lock poisoned");
            ContactError::SendFailed
        })?;

        conn.execute(
            "INSERT INTO contact_messages (name, email, message) VALUES (?1, ?2, ?3)",
            params![message.name, message.email, message.message],
        )
        .map_err(|e| {
            error!(error = %e, "Failed to store contact message");
            ContactError::SendFailed
        })?;

        Ok(conn.last_insert_rowid())
    }
}

impl ContactStore for SqliteContactStore {
    fn submit(&self, message: &ContactMessage) -> Result<(), ContactError> {
        let id = self.insert(message)?;
        // Visitor details stay in the database, never in the logs
        debug!(id = id, "Contact message stored");
        Ok(())
    }
}

/// Store used when the database could not be opened at startup
pub struct UnavailableContactStore;

impl ContactStore for UnavailableContactStore {
    fn submit(&self, _message: &ContactMessage) -> Result<(), ContactError> {
        Err(ContactError::SendFailed)
    }
}
