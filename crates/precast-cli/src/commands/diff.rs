//! Diff Reader command

use super::{open_db, print_json, DEFAULT_DB};
use clap::Args;
use precast_engine::{apply_engine_query, EngineQuery};

#[derive(Debug, Args)]
pub struct DiffArgs {
    #[arg(long, default_value = DEFAULT_DB)]
    pub db: String,

    #[arg(long)]
    pub project: i64,

    /// Compare this element type against its latest revision instead of
    /// listing per-element diffs for the whole project
    #[arg(long)]
    pub element_type: Option<i64>,
}

pub fn execute(args: DiffArgs) -> anyhow::Result<()> {
    let conn = open_db(&args.db)?;

    let query = match args.element_type {
        Some(element_type_id) => EngineQuery::ElementTypeWithUpdatedBom {
            project_id: args.project,
            element_type_id,
        },
        None => EngineQuery::ElementTypesWithUpdatedBom {
            project_id: args.project,
        },
    };

    print_json(&apply_engine_query(query, &conn)?)
}
