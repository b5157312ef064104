//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across the engine, the store
//! and the HTTP front end.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Entity identifiers
pub const FIELD_PROJECT_ID: &str = "project_id";
pub const FIELD_ELEMENT_TYPE_ID: &str = "element_type_id";
pub const FIELD_BOM_ID: &str = "bom_id";
pub const FIELD_REVISION_ID: &str = "revision_id";

// Collection sizes
pub const FIELD_RECORD_COUNT: &str = "record_count";
pub const FIELD_LINE_COUNT: &str = "line_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
