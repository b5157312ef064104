pub mod adjust;
pub mod bom;
pub mod diff;
pub mod logs;
pub mod migrate;
pub mod serve;

use anyhow::Context;
use precast_store::db;
use rusqlite::Connection;
use std::path::Path;

pub const DEFAULT_DB: &str = "precast.db";

/// Open a configured connection with the schema up to date
pub fn open_db(path: &str) -> anyhow::Result<Connection> {
    let mut conn = db::open_configured(path, db::DEFAULT_BUSY_TIMEOUT)
        .with_context(|| format!("opening database {}", path))?;
    precast_store::migrations::apply_migrations(&mut conn)?;
    Ok(conn)
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
