//! Animated template processing: decode, composite per frame, quantize, assemble.

/// GIF assembly of palette frames.
pub mod assemble;
/// Per-frame compositing orchestration.
pub mod processor;
/// Adaptive palette quantization.
pub mod quantize;
/// Template and source image decoding.
pub mod template;
