//! Human-readable descriptions of whatever model object a pipeline hands us:
//! denoising models, text encoders and autoencoders alike.

use std::fmt;

use crate::backend::ParameterTensor;
use crate::handle::ModelHandle;
use crate::introspect::{unwrap_once, Introspector};

/// Child holding the encoder inside a text-encoder wrapper
const TEXT_ENCODER_ACCESSOR: &str = "cond_stage_model";

/// Child holding the autoencoder inside a VAE wrapper
const AUTOENCODER_ACCESSOR: &str = "first_stage_model";

/// Attribute naming a model's training parameterization (flow, eps, v-prediction)
const MODEL_TYPE_ATTRIBUTE: &str = "model_type";

/// Packaging of a connected model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Clip,
    Vae,
    Gguf,
    Standard,
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFormat::Clip => "clip",
            ModelFormat::Vae => "vae",
            ModelFormat::Gguf => "gguf",
            ModelFormat::Standard => "standard",
        };
        f.write_str(name)
    }
}

/// What [`summarize`] found out about a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    /// `key: value` display lines
    pub lines: Vec<String>,
    /// Class of the inner model, empty if no model was supplied
    pub class_name: String,
    /// Declared hidden dimension, `0` if none was declared
    pub hidden_dim: u64,
    pub format: Option<ModelFormat>,
}

impl ModelSummary {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Describe `handle` with the default calibration
pub fn summarize<T>(handle: Option<&ModelHandle<T>>) -> ModelSummary
where
    T: ParameterTensor,
{
    summarize_with(handle, &Introspector::default())
}

/// Describe `handle`.
///
/// Text encoders and autoencoders report their class and parameter count
/// only. Denoising models also report their training type, declared width and
/// packaging. Unlike [`Introspector::introspect`], no width is estimated from
/// parameters here: only a width the model declares is shown.
pub fn summarize_with<T>(handle: Option<&ModelHandle<T>>, introspector: &Introspector) -> ModelSummary
where
    T: ParameterTensor,
{
    let Some(handle) = handle else {
        return ModelSummary {
            lines: vec!["—".to_string()],
            class_name: String::new(),
            hidden_dim: 0,
            format: None,
        };
    };

    let outer_class = handle.class_name();

    if outer_class == "CLIP" || handle.has_child(TEXT_ENCODER_ACCESSOR) {
        return summarize_component(handle, TEXT_ENCODER_ACCESSOR, ModelFormat::Clip);
    }
    if outer_class == "VAE" || handle.has_child(AUTOENCODER_ACCESSOR) {
        return summarize_component(handle, AUTOENCODER_ACCESSOR, ModelFormat::Vae);
    }

    let format = if outer_class.contains("GGUF") {
        ModelFormat::Gguf
    } else {
        ModelFormat::Standard
    };

    let (label, inner) = unwrap_once(handle);
    let class_name = inner.class_name().to_string();
    let mut lines = vec![format!("class:  {}", class_name)];

    if let Some(model_type) = inner.attribute(MODEL_TYPE_ATTRIBUTE) {
        lines.push(format!("type:   {}", model_type));
    }

    let hidden_dim = introspector
        .declared_width(&label, inner)
        .map(|declared| declared.hidden_dim)
        .unwrap_or(0);
    if hidden_dim > 0 {
        lines.push(format!("dim:    {}", hidden_dim));
    }

    if let Some(total) = inner.total_parameters() {
        lines.push(format!("params: {}", format_parameter_count(total)));
    }
    lines.push(format!("format: {}", format));

    ModelSummary {
        lines,
        class_name,
        hidden_dim,
        format: Some(format),
    }
}

fn summarize_component<T>(handle: &ModelHandle<T>, accessor: &str, format: ModelFormat) -> ModelSummary
where
    T: ParameterTensor,
{
    let inner = handle.child(accessor).map(|child| child.as_ref()).unwrap_or(handle);
    let class_name = inner.class_name().to_string();
    let mut lines = vec![format!("class:  {}", class_name), format!("format: {}", format)];
    if let Some(total) = inner.total_parameters() {
        lines.push(format!("params: {}", format_parameter_count(total)));
    }

    ModelSummary {
        lines,
        class_name,
        hidden_dim: 0,
        format: Some(format),
    }
}

/// `1.7B`, `350M`, or the raw count below a million
pub fn format_parameter_count(count: u64) -> String {
    if count >= 1_000_000_000 {
        format!("{:.1}B", count as f64 / 1e9)
    } else if count >= 1_000_000 {
        format!("{:.0}M", count as f64 / 1e6)
    } else {
        count.to_string()
    }
}
