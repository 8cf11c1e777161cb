//! # Frame Budgeting
//!
//! Converts frame geometry, a model width and a device memory capacity into
//! the largest frame count that fits the memory budget.
//!
//! ## Cost Model
//!
//! Peak memory during video denoising is dominated by attention activations,
//! which scale with the number of tokens in flight rather than with the model
//! weights (those are offloaded layer by layer). One frame costs
//!
//! ```text
//! bytes_per_frame = tensor_copies * spatial_tokens * hidden_dim * bytes_per_element
//! spatial_tokens  = (width / 8) * (height / 8)
//! ```
//!
//! When the model declared its own width, its encoder is assumed to merge
//! `stride` physical frames into one latent frame before attention, so the
//! budget is computed in latent frames and expanded back.
//!
//! ## Stride
//!
//! Encoders take `1 + k * stride` frames: one reference frame plus whole
//! groups. Every limited result is snapped down onto that grid.
//!
//! # Example
//!
//! ```rust
//! use framecap::{budget, BudgetRequest, DimSource};
//!
//! let request = BudgetRequest::new(832, 480, 16.0, 10.0)
//!     .with_safety_margin(0.95)
//!     .with_device_capacity(Some(16 * (1 << 30)))
//!     .with_hidden_dim(1536, DimSource::DirectAttribute);
//!
//! let result = budget(&request).unwrap();
//! assert_eq!(result.requested_frames, 161);
//! assert_eq!(result.capped_frames, 161);
//! assert_eq!(result.capped_duration, 10.0);
//! ```

use crate::config::Calibration;
use crate::constant::{DEFAULT_SAFETY_MARGIN, FALLBACK_HIDDEN_DIM};
use crate::error::{BudgetError, Result};
use crate::introspect::{DimSource, IntrospectionResult};

const GIB: f64 = (1u64 << 30) as f64;

/// Everything one budgeting call needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetRequest {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Requested clip length in seconds
    pub duration: f64,
    /// Fraction of device memory to budget, in `(0, 1]`
    pub safety_margin: f64,
    /// `None` when no compatible accelerator is present; no limit is applied then
    pub device_capacity_bytes: Option<u64>,
    pub hidden_dim: u64,
    pub dim_source: DimSource,
}

impl BudgetRequest {
    /// A request with the default safety margin, no device and the fallback width
    pub fn new(width: u32, height: u32, fps: f64, duration: f64) -> Self {
        Self {
            width,
            height,
            fps,
            duration,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            device_capacity_bytes: None,
            hidden_dim: FALLBACK_HIDDEN_DIM,
            dim_source: DimSource::None,
        }
    }

    pub fn with_safety_margin(mut self, safety_margin: f64) -> Self {
        self.safety_margin = safety_margin;
        self
    }

    pub fn with_device_capacity(mut self, device_capacity_bytes: Option<u64>) -> Self {
        self.device_capacity_bytes = device_capacity_bytes;
        self
    }

    pub fn with_hidden_dim(mut self, hidden_dim: u64, dim_source: DimSource) -> Self {
        self.hidden_dim = hidden_dim;
        self.dim_source = dim_source;
        self
    }

    /// Take the width from an introspection result, or `fallback` with source
    /// `none` if introspection found nothing
    pub fn with_introspection(self, introspection: &IntrospectionResult, fallback: u64) -> Self {
        match introspection.hidden_dim {
            Some(hidden_dim) => self.with_hidden_dim(hidden_dim, introspection.source),
            None => self.with_hidden_dim(fallback, DimSource::None),
        }
    }

    /// Check the caller-supplied numbers, naming the first invalid field
    pub fn validate(&self, calibration: &Calibration) -> Result<()> {
        let minimum = calibration.spatial_compression;
        if self.width < minimum {
            return Err(BudgetError::InvalidWidth {
                value: self.width,
                minimum,
            });
        }
        if self.height < minimum {
            return Err(BudgetError::InvalidHeight {
                value: self.height,
                minimum,
            });
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(BudgetError::InvalidFps(self.fps));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(BudgetError::InvalidDuration(self.duration));
        }
        if !(self.safety_margin > 0.0 && self.safety_margin <= 1.0) {
            return Err(BudgetError::InvalidSafetyMargin(self.safety_margin));
        }
        if self.hidden_dim == 0 {
            return Err(BudgetError::InvalidHiddenDim(self.hidden_dim));
        }
        Ok(())
    }
}

/// Outcome of one budgeting call.
///
/// `1 <= capped_frames <= requested_frames` always holds. Whenever a device
/// limit was applied, `capped_frames` is also `1 (mod stride)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetResult {
    pub requested_frames: u64,
    pub capped_frames: u64,
    pub capped_duration: f64,
    /// Frames the memory budget affords, before snapping; `None` on the no-limit path
    pub max_frames: Option<u64>,
    pub hidden_dim: u64,
    pub dim_source: DimSource,
    /// Human-readable `key: value` lines for operator display
    pub diagnostics: String,
}

/// Budget `request` with the default calibration
pub fn budget(request: &BudgetRequest) -> Result<BudgetResult> {
    budget_with(request, &Calibration::default())
}

/// Compute the capped frame count for `request`.
///
/// # Errors
///
/// Returns a [`BudgetError`] naming the offending field if the request is
/// malformed, or [`BudgetError::InvalidCalibration`] if `calibration` fails
/// [`Calibration::validate`]. Nothing else can fail.
pub fn budget_with(request: &BudgetRequest, calibration: &Calibration) -> Result<BudgetResult> {
    calibration.validate()?;
    request.validate(calibration)?;

    let requested_frames = requested_frame_count(request.duration, request.fps);

    let Some(capacity) = request.device_capacity_bytes else {
        log::debug!("no device capacity, {requested_frames} frames pass unlimited");
        let capped_duration = frames_to_duration(requested_frames, request.fps);
        let diagnostics = render_diagnostics(request, None, requested_frames, requested_frames, capped_duration);
        return Ok(BudgetResult {
            requested_frames,
            capped_frames: requested_frames,
            capped_duration,
            max_frames: None,
            hidden_dim: request.hidden_dim,
            dim_source: request.dim_source,
            diagnostics,
        });
    };

    let max_frames = max_frames_for_capacity(request, capacity, calibration);
    let capped_frames = snap_to_stride(requested_frames.min(max_frames), calibration.stride);
    let capped_duration = frames_to_duration(capped_frames, request.fps);

    log::debug!(
        "budgeted {}x{} at dim {} ({}): requested {}, affordable {}, capped {}",
        request.width,
        request.height,
        request.hidden_dim,
        request.dim_source,
        requested_frames,
        max_frames,
        capped_frames
    );

    let diagnostics = render_diagnostics(request, Some(max_frames), requested_frames, capped_frames, capped_duration);
    Ok(BudgetResult {
        requested_frames,
        capped_frames,
        capped_duration,
        max_frames: Some(max_frames),
        hidden_dim: request.hidden_dim,
        dim_source: request.dim_source,
        diagnostics,
    })
}

/// `round(duration * fps) + 1`: the motion frames plus the leading reference frame
pub fn requested_frame_count(duration: f64, fps: f64) -> u64 {
    ((duration * fps).round() as u64).saturating_add(1)
}

/// Snap `frames` down to the nearest `1 + k * stride`, never below one frame
pub fn snap_to_stride(frames: u64, stride: u64) -> u64 {
    let stride = stride.max(1);
    frames.saturating_sub(1) / stride * stride + 1
}

/// Tokens per frame after spatial downsampling
pub fn spatial_tokens(width: u32, height: u32, spatial_compression: u32) -> u64 {
    let compression = spatial_compression.max(1);
    (width / compression) as u64 * (height / compression) as u64
}

/// Activation bytes one frame (latent or physical) costs at `hidden_dim`
pub fn bytes_per_frame(spatial_tokens: u64, hidden_dim: u64, calibration: &Calibration) -> u64 {
    calibration
        .tensor_copies
        .saturating_mul(spatial_tokens)
        .saturating_mul(hidden_dim)
        .saturating_mul(calibration.bytes_per_element)
}

/// Physical frames the memory budget affords, before snapping
fn max_frames_for_capacity(request: &BudgetRequest, capacity: u64, calibration: &Calibration) -> u64 {
    let tokens = spatial_tokens(request.width, request.height, calibration.spatial_compression);
    let frame_bytes = bytes_per_frame(tokens, request.hidden_dim, calibration);
    let budget_bytes = capacity as f64 * request.safety_margin;
    let affordable = ((budget_bytes / frame_bytes as f64).floor() as u64).max(1);

    if request.dim_source.is_identified() {
        // affordable counts latent frames; expand to the physical frames they encode
        (affordable - 1).saturating_mul(calibration.stride).saturating_add(1)
    } else {
        affordable
    }
}

fn frames_to_duration(frames: u64, fps: f64) -> f64 {
    frames.saturating_sub(1) as f64 / fps
}

fn render_diagnostics(
    request: &BudgetRequest,
    max_frames: Option<u64>,
    requested_frames: u64,
    capped_frames: u64,
    capped_duration: f64,
) -> String {
    let device = match (request.device_capacity_bytes, max_frames) {
        (Some(capacity), Some(_)) => format!(
            "device: {:.1} GiB (budget {:.0}%)",
            capacity as f64 / GIB,
            request.safety_margin * 100.0
        ),
        _ => "device: none (no frame limit applied)".to_string(),
    };

    let mut lines = vec![device, format!("dim: {} ({})", request.hidden_dim, request.dim_source)];
    if let Some(max_frames) = max_frames {
        lines.push(format!("limit: {} frames", max_frames));
    }
    lines.push(format!("requested: {} frames", requested_frames));
    lines.push(format!("capped: {} frames ({:.2}s)", capped_frames, capped_duration));
    lines.join("\n")
}
