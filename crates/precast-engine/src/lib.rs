//! Precast Engine - Orchestration layer
//!
//! Coordinates the pure diff and planning logic in `precast-core` with the
//! SQLite persistence in `precast-store`. Every operation logs one start and
//! one end (or end_error) event.

pub mod commands;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::engine_query::{apply_engine_query, EngineQuery, EngineQueryResult};
