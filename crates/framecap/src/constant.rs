//! # Calibration constants with reserved meanings in framecap
//!
//! Every constant here is the default of a [`Calibration`](crate::Calibration)
//! field and may be overridden per deployment.

/// Number of simultaneously live activation tensors during one attention step:
/// query, key, value, attention output and the residual stream.
///
/// Calibrated against observed peak memory (roughly 240 bytes per pixel for a
/// 1536 wide video transformer), not measured.
pub const TENSOR_COPIES: u64 = 5;

/// Temporal compression factor: physical frames merged into one latent frame.
/// Frame counts handed to the encoder must be `1 (mod STRIDE)`.
pub const STRIDE: u64 = 4;

/// Bytes per activation element (half precision).
pub const BYTES_PER_ELEMENT: u64 = 2;

/// Spatial downsampling applied on both axes before tokens reach attention.
pub const SPATIAL_COMPRESSION: u32 = 8;

/// Transformer depth assumed when estimating width from a parameter count,
/// using `params ~= 12 * depth * width^2`.
pub const ASSUMED_DEPTH: u64 = 28;

/// Widths a parameter estimate snaps to.
pub const CONVENTIONAL_WIDTHS: [u64; 11] = [
    256, 512, 768, 1024, 1280, 1536, 2048, 3072, 4096, 5120, 8192,
];

/// Smallest plausible transformer width.
pub const MIN_HIDDEN_DIM: u64 = 64;

/// Largest plausible transformer width.
pub const MAX_HIDDEN_DIM: u64 = 32768;

/// Width budgeted for when nothing could be introspected.
pub const FALLBACK_HIDDEN_DIM: u64 = 1536;

/// Fraction of device memory budgeted when the caller does not say otherwise.
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.95;
