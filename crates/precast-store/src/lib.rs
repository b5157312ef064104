//! Precast Store - SQLite persistence for the adjustment engine
//!
//! Provides:
//! - Connection management and pragmas
//! - Embedded, checksummed schema migrations
//! - Repositories for element types, BOMs, revisions, balances and the ledger
//! - The transactional adjustment applier

pub mod apply;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use apply::{apply_adjustment, AppliedAdjustment};
pub use errors::Result;
pub use repo::SqliteRepo;
