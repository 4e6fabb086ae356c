//! Chroma-key region detection.
//!
//! Detection is a pure function of one frame and a predicate; results are never cached across
//! frames or runs.

/// Chroma-key predicates and bounding-box detection.
pub mod chroma;
