//! Session lookup for the HTTP front end

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::SqliteRepo;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

impl SqliteRepo {
    /// Display name of the user owning an unexpired session
    pub fn session_actor(
        conn: &Connection,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        conn.query_row(
            "SELECT TRIM(u.first_name || ' ' || u.last_name)
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.session_id = ?1 AND s.expires_at > ?2",
            rusqlite::params![session_id, now.timestamp_millis()],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)
    }
}
