//! AWS-oriented adapters and handlers for the bucket size-history pipeline.
//!
//! This crate owns runtime integration details (Lambda handlers, S3 and
//! DynamoDB adapters, chart rendering, HTTP triggering) on top of the
//! provider-free primitives in `size_history_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod provision;
pub mod telemetry;
