//! Command orchestration layer.
//!
//! Read paths live in `diff_reader` and `ledger`; the write path lives in
//! `adjustment`. `engine_query` and `engine_command` are the typed entry
//! points used by the HTTP server and the CLI.

pub mod adjustment;
pub mod diff_reader;
pub mod engine_command;
pub mod engine_query;
pub mod ledger;
