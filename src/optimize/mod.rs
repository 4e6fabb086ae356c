//! Optional lossy post-optimization of finished animations.
//!
//! The optimizer is an injected capability: the session only sees [`PostOptimizer`] and
//! deployments without the external tool pass `None`.

/// `gifsicle`-based optimizer.
pub mod gifsicle;

use crate::foundation::error::BoilResult;

/// Turns artifact bytes into (hopefully smaller) artifact bytes.
pub trait PostOptimizer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Optimize `artifact`. Errors are reported to the caller, which decides whether they are
    /// fatal.
    fn optimize(&self, artifact: &[u8]) -> BoilResult<Vec<u8>>;
}

/// Run `optimizer` over `artifact`, falling back to the input on any failure.
///
/// Failures are logged and swallowed: the unoptimized artifact is always valid output.
pub fn refine(optimizer: Option<&dyn PostOptimizer>, artifact: Vec<u8>) -> Vec<u8> {
    let Some(optimizer) = optimizer else {
        tracing::debug!("no post-optimizer configured, skipping");
        return artifact;
    };

    match optimizer.optimize(&artifact) {
        Ok(out) if out.is_empty() => {
            tracing::warn!(
                optimizer = optimizer.name(),
                "optimizer produced an empty artifact (non-fatal), keeping original"
            );
            artifact
        }
        Ok(out) => {
            tracing::info!(
                optimizer = optimizer.name(),
                before = artifact.len(),
                after = out.len(),
                "artifact optimized"
            );
            out
        }
        Err(e) => {
            tracing::warn!(
                optimizer = optimizer.name(),
                error = %e,
                "optimization failed (non-fatal), keeping original"
            );
            artifact
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/optimize/refine.rs"]
mod tests;
