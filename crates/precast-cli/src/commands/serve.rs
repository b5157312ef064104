//! HTTP server command

use anyhow::Context;
use clap::Args;
use precast_core::logging_facility::init;
use precast_server::ServerConfig;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Config file stem; `PRECAST__*` variables still override it
    #[arg(long, default_value = precast_server::config::DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Overrides `database_path` from the configuration
    #[arg(long)]
    pub db: Option<String>,
}

pub fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = ServerConfig::load_from(&args.config)?;
    if let Some(db) = args.db {
        config.database_path = db.into();
    }
    init(config.log_profile);

    // Schema is brought up to date before accepting requests.
    super::open_db(&config.database_path.to_string_lossy())?;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(precast_server::serve(config))?;
    Ok(())
}
