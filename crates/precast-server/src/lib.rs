//! HTTP front end for the BOM diff and inventory adjustment engine.
//!
//! Every request authenticates through the session collaborator, opens its
//! own SQLite connection and runs the engine on the blocking pool under a
//! deadline.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::build_router;
pub use session::{SessionResolver, SqliteSessionResolver};
pub use state::{AppState, Deadline};

use precast_core::errors::{ExError, ExErrorKind};
use tokio::net::TcpListener;

/// Bind `config.bind_addr` and serve until the process is stopped
///
/// # Errors
///
/// `ERR_IO` when the address cannot be bound or the listener fails.
#[allow(clippy::result_large_err)]
pub async fn serve(config: ServerConfig) -> precast_core::Result<()> {
    let io_error = |e: std::io::Error| {
        ExError::new(ExErrorKind::Io)
            .with_op("serve")
            .with_message(e.to_string())
    };

    let listener = TcpListener::bind(config.bind_addr.as_str())
        .await
        .map_err(io_error)?;
    tracing::info!(
        bind_addr = config.bind_addr.as_str(),
        database_path = %config.database_path.display(),
        "precast server listening"
    );

    axum::serve(listener, build_router(AppState::new(config)))
        .await
        .map_err(io_error)
}
