//! Connection pool bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite pools.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable pool.
//!
//! # Invariants
//! - Every pooled connection has `foreign_keys=ON` and a busy timeout.
//! - Returned pools have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbPool, DbResult};
use log::{error, info};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Sizing and timeout knobs for the connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Upper bound of simultaneously open connections.
    pub max_connections: u32,
    /// How long a checkout waits for a free connection before failing.
    pub connection_timeout: Duration,
    /// Idle connections above the floor of one are closed after this long.
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 16,
            connection_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Opens a pool over a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Creates the database file when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool(path: impl AsRef<Path>, options: &PoolOptions) -> DbResult<DbPool> {
    let manager = SqliteConnectionManager::file(path.as_ref()).with_init(configure_connection);
    let builder = r2d2::Pool::builder()
        .max_size(options.max_connections)
        .min_idle(Some(1))
        .connection_timeout(options.connection_timeout)
        .idle_timeout(options.idle_timeout);

    build_and_migrate(builder, manager, "file")
}

/// Opens a single-connection pool over an in-memory database.
///
/// Every in-memory SQLite connection is its own database, so the pool is
/// capped at one connection that is never recycled.
pub fn open_pool_in_memory() -> DbResult<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(configure_connection);
    let builder = r2d2::Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .idle_timeout(None)
        .max_lifetime(None);

    build_and_migrate(builder, manager, "memory")
}

fn build_and_migrate(
    builder: r2d2::Builder<SqliteConnectionManager>,
    manager: SqliteConnectionManager,
    mode: &str,
) -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let pool = match builder.build(manager) {
        Ok(pool) => pool,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let migrated = pool
        .get()
        .map_err(DbError::from)
        .and_then(|mut conn| apply_migrations(&mut conn));

    match migrated {
        Ok(steps) => {
            info!(
                "event=db_open module=db status=ok mode={mode} migrations_applied={steps} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_migrate_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure_connection(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)
}
