//! Per-subject artifact cache on the local filesystem.

/// Cache keys and the directory-backed store.
pub mod store;
