//! # Pipeline Nodes
//!
//! Adapters that run the introspector, the budgeter and the summary the way a
//! node-based pipeline invokes them: typed inputs in, typed outputs plus a
//! display string out.

use crate::backend::ParameterTensor;
use crate::budget::{budget_with, BudgetRequest};
use crate::config::Calibration;
use crate::constant::DEFAULT_SAFETY_MARGIN;
use crate::device::DeviceProbe;
use crate::error::Result;
use crate::handle::ModelHandle;
use crate::introspect::Introspector;
use crate::summary::summarize_with;

/// Inputs of the frame limit node
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLimitInputs {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration: f64,
    pub safety_margin: f64,
}

impl Default for FrameLimitInputs {
    fn default() -> Self {
        Self {
            width: 832,
            height: 480,
            fps: 16.0,
            duration: 10.0,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }
}

/// Outputs of the frame limit node.
///
/// Geometry and timing pass through unchanged so downstream nodes can be
/// wired from this node alone.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLimitOutput {
    pub text: String,
    pub capped_frames: u64,
    pub capped_duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Caps a requested clip length to what the device can hold.
///
/// # Type Parameters
///
/// * `P` - Where device capacity comes from, any [`DeviceProbe`]
pub struct FrameLimitNode<P> {
    probe: P,
    introspector: Introspector,
}

impl<P> FrameLimitNode<P>
where
    P: DeviceProbe,
{
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            introspector: Introspector::default(),
        }
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.introspector = Introspector::new(calibration);
        self
    }

    /// Run the node once.
    ///
    /// Introspects `model` (if any), falls back to the calibrated width when
    /// nothing is found, reads the device capacity once and budgets.
    ///
    /// # Errors
    ///
    /// Only malformed `inputs` fail; see [`BudgetError`](crate::BudgetError).
    pub fn execute<T>(&self, inputs: &FrameLimitInputs, model: Option<&ModelHandle<T>>) -> Result<FrameLimitOutput>
    where
        T: ParameterTensor,
    {
        let calibration = self.introspector.calibration();
        let request = BudgetRequest::new(inputs.width, inputs.height, inputs.fps, inputs.duration)
            .with_safety_margin(inputs.safety_margin);
        request.validate(calibration)?;

        let introspection = self.introspector.introspect(model);
        let request = request
            .with_introspection(&introspection, calibration.fallback_hidden_dim)
            .with_device_capacity(self.probe.total_memory());
        let result = budget_with(&request, calibration)?;

        let mut lines = Vec::new();
        if let Some(class_name) = &introspection.structural_class_name {
            lines.push(format!("class: {}", class_name));
        }
        lines.push(result.diagnostics.clone());
        lines.extend(introspection.trace.iter().map(|hit| format!("hit: {}", hit)));

        Ok(FrameLimitOutput {
            text: lines.join("\n"),
            capped_frames: result.capped_frames,
            capped_duration: result.capped_duration,
            width: inputs.width,
            height: inputs.height,
            fps: inputs.fps,
        })
    }
}

/// Outputs of the model info node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfoOutput {
    pub text: String,
    pub class_name: String,
    pub dim: u64,
}

/// Describes any connected model
#[derive(Debug, Clone, Default)]
pub struct ModelInfoNode {
    introspector: Introspector,
}

impl ModelInfoNode {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            introspector: Introspector::new(calibration),
        }
    }

    pub fn execute<T>(&self, model: Option<&ModelHandle<T>>) -> ModelInfoOutput
    where
        T: ParameterTensor,
    {
        let summary = summarize_with(model, &self.introspector);
        ModelInfoOutput {
            text: summary.text(),
            class_name: summary.class_name,
            dim: summary.hidden_dim,
        }
    }
}
