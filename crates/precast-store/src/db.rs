//! Database connection management

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Default time a writer waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection: foreign keys, WAL and a busy timeout
pub fn configure(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON")
        .map_err(from_rusqlite)?;

    // journal_mode returns a row; in-memory databases report "memory".
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .map_err(from_rusqlite)?;

    conn.busy_timeout(busy_timeout).map_err(from_rusqlite)?;

    Ok(())
}

/// Open and configure a file database in one step
pub fn open_configured<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Connection> {
    let conn = open(path)?;
    configure(&conn, busy_timeout)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_enables_foreign_keys() {
        let conn = open_in_memory().unwrap();
        configure(&conn, DEFAULT_BUSY_TIMEOUT).unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
