#![forbid(unsafe_code)]
//! SQLite persistence for the folio service.
//!
//! One [`Database`] per process. The underlying connection is opened lazily
//! on first use and memoized behind a `tokio::sync::Mutex`, so concurrent
//! requests share the single in-flight open attempt and the single handle.

use folio_model::{Email, UserId, Username};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use tokio::sync::{Mutex, MutexGuard};

mod queries;
mod schema;
mod username;

pub use queries::{NewCompany, NewPortfolioItem, NewTestimonial, NewUser};

pub const CRATE_NAME: &str = "folio-store";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed row does not exist (or is owned by someone else; the
    /// two are indistinguishable on purpose).
    NotFound,
    /// A unique index rejected the write (duplicate email or username).
    Conflict(String),
    Storage(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "record not found"),
            Self::Conflict(msg) => write!(f, "uniqueness conflict: {msg}"),
            Self::Storage(msg) => write!(f, "storage failure: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(inner, _)
                if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(e.to_string())
            }
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound,
            _ => Self::Storage(e.to_string()),
        }
    }
}

pub(crate) fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub struct Database {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl Database {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: Mutex::new(None),
        }
    }

    /// Acquires the shared handle, opening and migrating the database the
    /// first time. Callers awaiting the mutex during that first open all
    /// observe the one connection attempt.
    pub(crate) async fn handle(&self) -> Result<MutexGuard<'_, Option<Connection>>, StoreError> {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            let conn = Connection::open(&self.path).map_err(StoreError::from)?;
            schema::init(&conn)?;
            *guard = Some(conn);
        }
        Ok(guard)
    }

    /// Cheap reachability probe for readiness checks.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
    }
}

pub(crate) fn connection<'a>(
    guard: &'a MutexGuard<'_, Option<Connection>>,
) -> Result<&'a Connection, StoreError> {
    guard
        .as_ref()
        .ok_or_else(|| StoreError::Storage("connection not initialized".to_string()))
}

pub(crate) fn parse_stored_username(raw: String) -> Result<Username, StoreError> {
    Username::parse(&raw).map_err(|e| StoreError::Storage(format!("stored username invalid: {e}")))
}

pub(crate) fn parse_stored_email(raw: String) -> Result<Email, StoreError> {
    Email::parse(&raw).map_err(|e| StoreError::Storage(format!("stored email invalid: {e}")))
}

pub(crate) fn user_id(raw: i64) -> UserId {
    UserId(raw)
}
