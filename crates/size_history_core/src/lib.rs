//! Shared size-history domain primitives.
//!
//! This crate owns the observation record, the store contract, trend window
//! math and artifact keys. It intentionally excludes AWS SDK and Lambda runtime
//! concerns; those live in `size_history_lambda`.

pub mod contract;
pub mod retry;
pub mod storage_keys;
pub mod store;
pub mod trend;
