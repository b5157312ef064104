//! Canonical logging macros
//!
//! Every engine operation logs exactly one `start` and one `end` or
//! `end_error` event with the same `op` value.

/// Log the start of an operation
///
/// ```
/// # use precast_core::log_op_start;
/// log_op_start!("diff_read");
/// log_op_start!("diff_read", project_id = 1);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use precast_core::log_op_end;
/// log_op_end!("diff_read", duration_ms = 4);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Accepts anything convertible into `ExError` (by reference clone).
///
/// ```
/// # use precast_core::{log_op_error, errors::InventoryError};
/// let err = InventoryError::EmptyPlan;
/// log_op_error!("apply_adjustment", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = ($err).clone().into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = ($err).clone().into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
            $($field)*
        );
    }};
}
