#![forbid(unsafe_code)]

use precast_core::logging_facility::init;
use precast_server::ServerConfig;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init(config.log_profile);

    match precast_server::serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(err_code = e.code(), err = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}
