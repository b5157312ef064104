//! Shared request state and the blocking engine bridge

#![allow(clippy::result_large_err)]

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::session::{SessionResolver, SqliteSessionResolver};
use axum::http::HeaderMap;
use precast_core::adjustment::{AdjustmentHook, PlannedLine};
use precast_core::errors::{ExError, ExErrorKind, Result};
use precast_core::types::{RequestContext, RequestId, TraceId};
use precast_store::db;
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_sessions(config, Arc::new(SqliteSessionResolver))
    }

    pub fn with_sessions(config: ServerConfig, sessions: Arc<dyn SessionResolver>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
        }
    }

    /// Run `op` on the blocking pool with a fresh connection
    ///
    /// The session is resolved on the same connection before `op` runs.
    /// When the request deadline passes, the [`Deadline`] handed to `op` is
    /// expired and any in-flight statement is interrupted. The response then
    /// waits for the task, so `ERR_TIMEOUT` is only returned when the work
    /// did not commit.
    pub async fn run_engine<T, F>(&self, headers: &HeaderMap, op: F) -> std::result::Result<T, ApiError>
    where
        F: FnOnce(&mut Connection, RequestContext, Deadline) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let session_id = crate::session::session_id(headers)
            .ok_or_else(|| ApiError::unauthorised("Authorization header is required"))?;
        let request_id = header_value(headers, REQUEST_ID_HEADER)
            .map(RequestId::from_string)
            .unwrap_or_default();
        let trace_id = header_value(headers, TRACE_ID_HEADER).map(TraceId::from_string);

        let path = self.config.database_path.clone();
        let busy_timeout = self.config.busy_timeout();
        let sessions = Arc::clone(&self.sessions);
        let deadline = Deadline::default();
        let task_deadline = deadline.clone();
        let (handle_tx, mut handle_rx) = tokio::sync::oneshot::channel();
        let timeout_request_id = request_id.clone();

        let mut task = tokio::task::spawn_blocking(move || -> Result<T> {
            let mut conn = db::open_configured(&path, busy_timeout)?;
            let _ = handle_tx.send(conn.get_interrupt_handle());

            let actor = sessions
                .resolve_actor(&conn, &session_id)?
                .ok_or_else(|| {
                    ExError::new(ExErrorKind::Unauthorised)
                        .with_message("Session is unknown or expired")
                        .with_request_id(request_id.clone())
                })?;

            let mut ctx = RequestContext::new(actor).with_request_id(request_id);
            if let Some(trace_id) = trace_id {
                ctx = ctx.with_trace_id(trace_id);
            }
            op(&mut conn, ctx, task_deadline)
        });

        let outcome = match tokio::time::timeout(self.config.request_timeout(), &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                deadline.expire();
                if let Ok(handle) = handle_rx.try_recv() {
                    handle.interrupt();
                }
                tracing::warn!(
                    timeout_ms = self.config.request_timeout_ms,
                    request_id = timeout_request_id.as_str(),
                    "engine call exceeded request deadline"
                );
                match task.await {
                    Ok(Err(e)) if e.kind() == ExErrorKind::Timeout => {
                        return Err(ApiError::from(
                            ExError::new(ExErrorKind::Timeout)
                                .with_message("Request deadline exceeded")
                                .with_request_id(timeout_request_id),
                        ));
                    }
                    joined => joined,
                }
            }
        };

        match outcome {
            Ok(result) => result.map_err(ApiError::from),
            Err(join_err) => Err(ApiError::from(
                ExError::new(ExErrorKind::Internal).with_message(join_err.to_string()),
            )),
        }
    }
}

/// Expiry flag shared between a request and its blocking task
///
/// As an [`AdjustmentHook`] it stops an adjustment before the next line and
/// before commit once the request deadline has passed.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    expired: Arc<AtomicBool>,
}

impl Deadline {
    pub fn expire(&self) {
        self.expired.store(true, Ordering::Release);
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<()> {
        if self.is_expired() {
            return Err(ExError::new(ExErrorKind::Timeout)
                .with_op("apply_adjustment")
                .with_message("Request deadline exceeded"));
        }
        Ok(())
    }
}

impl AdjustmentHook for Deadline {
    fn before_line(&self, _index: usize, _line: &PlannedLine) -> Result<()> {
        self.check()
    }

    fn before_commit(&self) -> Result<()> {
        self.check()
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
