//! Session collaborator
//!
//! Turns the `Authorization` header into the display name recorded as
//! `adjusted_by`. Resolution runs on the request's own connection inside the
//! blocking pool.

#![allow(clippy::result_large_err)]

use axum::http::HeaderMap;
use chrono::Utc;
use precast_core::errors::Result;
use precast_core_types::Sensitive;
use precast_store::repo::SqliteRepo;
use rusqlite::Connection;

pub trait SessionResolver: Send + Sync {
    /// Display name for a live session, `None` when unknown or expired
    fn resolve_actor(&self, conn: &Connection, session_id: &Sensitive<String>)
        -> Result<Option<String>>;
}

/// Looks sessions up in the `sessions`/`users` tables
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteSessionResolver;

impl SessionResolver for SqliteSessionResolver {
    fn resolve_actor(
        &self,
        conn: &Connection,
        session_id: &Sensitive<String>,
    ) -> Result<Option<String>> {
        SqliteRepo::session_actor(conn, session_id.expose(), Utc::now())
    }
}

/// Session id from `Authorization`, with or without a `Bearer ` prefix
pub fn session_id(headers: &HeaderMap) -> Option<Sensitive<String>> {
    let raw = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim();
    let id = match raw.split_once(' ') {
        Some(("Bearer", rest)) => rest.trim(),
        _ if raw == "Bearer" => "",
        _ => raw,
    };
    (!id.is_empty()).then(|| Sensitive::new(id.to_string()))
}
