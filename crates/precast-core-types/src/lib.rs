//! Core types shared across the precast facilities
//!
//! This crate provides foundational types used by both error handling
//! and logging facilities:
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{RequestContext, RequestId, TraceId};
pub use sensitive::Sensitive;
