//! boilgif composites a subject's picture into the chroma-key region of an animated template.
//!
//! The pipeline is:
//!
//! - detect the green region of every template frame ([`detect`])
//! - resize, soften and paste the picture into it ([`composite`])
//! - quantize each frame and assemble a looping GIF ([`sequence`])
//! - optionally run an external optimizer ([`optimize`])
//! - keep one finished artifact per subject on disk ([`cache`])
//!
//! [`Session`] ties these together behind the platform boundary traits in [`boundary`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Platform boundary contracts and filesystem implementations.
pub mod boundary;
/// Per-subject artifact cache.
pub mod cache;
/// Per-frame compositing.
pub mod composite;
/// JSON configuration.
pub mod config;
/// Chroma-key region detection.
pub mod detect;
/// External post-optimization.
pub mod optimize;
/// Animated template processing.
pub mod sequence;
/// Command-handling context.
pub mod session;

pub use crate::foundation::core::{Region, Size};
pub use crate::foundation::error::{BoilError, BoilResult};

pub use crate::boundary::{
    DirDelivery, Delivery, FsSubjectSource, Subject, SubjectImage, SubjectSource,
};
pub use crate::cache::store::{CacheKey, CacheStore, CachedEntry};
pub use crate::config::{BoilConfig, OptimizerConfig};
pub use crate::detect::chroma::{ChromaKey, detect_region, detect_region_with};
pub use crate::optimize::PostOptimizer;
pub use crate::optimize::gifsicle::{Gifsicle, GifsicleOpts};
pub use crate::sequence::processor::{
    ComposeOpts, ComposeStats, ComposedAnimation, compose, compose_bytes, compose_files,
};
pub use crate::sequence::template::{AnimatedTemplate, TimedFrame};
pub use crate::session::{ArtifactOrigin, BoilReport, Session};
