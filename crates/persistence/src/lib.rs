// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` persistence for the Showroom dealership system.
//!
//! [`Persistence`] implements [`WorkflowStore`]: every unit of work runs
//! inside one `BEGIN IMMEDIATE` transaction, so a unit holds the database
//! write lock from its first statement until it commits or rolls back.
//! Writers on other connections (including other processes sharing the
//! file) wait up to the configured busy timeout and then fail with a
//! retryable `Conflict`.
//!
//! Entity rows carry a `version` column and every update is a
//! compare-and-swap on it, so a write based on a stale read is rejected
//! even if the caller bypasses the unit's lock.
//!
//! ## Testing
//!
//! `new_in_memory()` gives each caller a private shared-cache in-memory
//! database, so tests are isolated and need no external infrastructure.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use diesel::{Connection, SqliteConnection};
use showroom::{CoreError, UnitOfWork, WorkflowStore};
use tracing::debug;

mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod sqlite;
mod unit;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;
pub use sqlite::MIGRATIONS;
pub use unit::SqliteUnit;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// How long a writer waits for another connection's lock by default.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a unit of work did not commit.
enum UnitError {
    /// The workflow rejected the operation.
    Core(CoreError),
    /// The database failed to begin, commit or roll back.
    Db(diesel::result::Error),
    /// A read-only unit finished and its transaction is being discarded.
    Discard,
}

impl From<diesel::result::Error> for UnitError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Db(err)
    }
}

impl UnitError {
    fn into_core(self) -> CoreError {
        match self {
            Self::Core(err) => err,
            Self::Db(err) => PersistenceError::from(err).into(),
            Self::Discard => CoreError::Storage(String::from("read-only unit was discarded")),
        }
    }
}

/// `SQLite`-backed store.
///
/// The connection is shared behind a mutex; one unit runs at a time per
/// `Persistence` value.
pub struct Persistence {
    conn: Mutex<SqliteConnection>,
}

impl Persistence {
    /// Creates a store backed by a fresh in-memory database.
    ///
    /// Each call receives a unique database instance via atomic counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection =
            sqlite::initialize_database(&shared_memory_url, DEFAULT_BUSY_TIMEOUT)?;
        sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens (creating if needed) a file-based database with the default
    /// busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        Self::new_with_file_and_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Opens (creating if needed) a file-based database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    /// * `busy_timeout` - How long a writer waits for another connection's lock
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file_and_busy_timeout<P: AsRef<Path>>(
        path: P,
        busy_timeout: Duration,
    ) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = sqlite::initialize_database(path_str, busy_timeout)?;
        sqlite::enable_wal_mode(&mut conn)?;
        sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&self) -> Result<(), PersistenceError> {
        let mut conn = self.lock()?;
        sqlite::verify_foreign_key_enforcement(&mut conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SqliteConnection>, PersistenceError> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::DatabaseError(String::from("connection lock poisoned")))
    }
}

impl WorkflowStore for Persistence {
    fn atomically<T, F>(&self, work: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, CoreError>,
    {
        let mut conn = self.lock()?;
        conn.immediate_transaction::<T, UnitError, _>(|conn| {
            work(&mut SqliteUnit { conn }).map_err(UnitError::Core)
        })
        .map_err(|err| {
            let err: CoreError = err.into_core();
            debug!(error = %err, "Unit of work rolled back");
            err
        })
    }

    fn snapshot<T, F>(&self, work: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, CoreError>,
    {
        let mut conn = self.lock()?;
        let mut result: Option<T> = None;
        let outcome: Result<(), UnitError> = conn.transaction::<(), UnitError, _>(|conn| {
            result = Some(work(&mut SqliteUnit { conn }).map_err(UnitError::Core)?);
            Err(UnitError::Discard)
        });
        match outcome {
            Err(UnitError::Discard) | Ok(()) => {
                result.ok_or_else(|| UnitError::Discard.into_core())
            }
            Err(err) => Err(err.into_core()),
        }
    }
}
