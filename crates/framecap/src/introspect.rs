//! # Model Introspection
//!
//! Recovers a model's hidden dimension from a [`ModelHandle`] of unknown shape.
//!
//! ## Overview
//!
//! Model families disagree on where they keep their width and on what they
//! call it. The introspector runs a fixed pipeline of capability probes, each
//! returning an optional width, and stops at the first one that answers:
//!
//! 1. **Direct attribute** - a width-like integer attribute on the unwrapped
//!    model or one of its structural sub-objects
//! 2. **Nested config** - the same attribute names one level down, inside a
//!    `config` or `model_config` object
//! 3. **Parameter estimate** - the total parameter count run through
//!    `params ~= 12 * depth * width^2` and snapped to a conventional width
//!
//! Nothing here fails. A miss at every stage yields [`DimSource::None`] and the
//! caller picks a fallback width.
//!
//! # Example
//!
//! ```rust
//! use framecap::{introspect, DimSource, ModelHandle, ParameterShape};
//!
//! let handle: ModelHandle<ParameterShape> = ModelHandle::new("ModelPatcher")
//!     .with_child("model", ModelHandle::new("Wan").with_attribute("hidden_size", 1536));
//!
//! let result = introspect(Some(&handle));
//! assert_eq!(result.hidden_dim, Some(1536));
//! assert_eq!(result.source, DimSource::DirectAttribute);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::ParameterTensor;
use crate::config::Calibration;
use crate::handle::ModelHandle;

/// Accessors that lead from a wrapper to the module it wraps, in priority order
pub const INNER_MODEL_ACCESSORS: [&str; 2] = ["model", "diffusion_model"];

/// Sub-objects searched alongside the unwrapped model, in priority order
pub const STRUCTURAL_ACCESSORS: [&str; 5] = ["diffusion_model", "transformer", "model", "net", "backbone"];

/// Names different model families use for their width, in priority order
pub const WIDTH_ATTRIBUTES: [&str; 8] = [
    "hidden_size",
    "dim",
    "embed_dim",
    "hidden_dim",
    "d_model",
    "inner_dim",
    "width",
    "model_dim",
];

/// Accessors for a configuration sub-object
pub const CONFIG_ACCESSORS: [&str; 2] = ["config", "model_config"];

/// Label of the handle passed in by the caller
const ROOT_LABEL: &str = "self";

/// Where a hidden dimension came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DimSource {
    DirectAttribute,
    NestedConfig,
    ParameterEstimate,
    None,
}

impl DimSource {
    /// Whether a concrete model declared its width, as opposed to an estimate or a fallback
    pub fn is_identified(&self) -> bool {
        matches!(self, DimSource::DirectAttribute | DimSource::NestedConfig)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DimSource::DirectAttribute => "direct-attribute",
            DimSource::NestedConfig => "nested-config",
            DimSource::ParameterEstimate => "parameter-estimate",
            DimSource::None => "none",
        }
    }
}

impl fmt::Display for DimSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successful probe: where it looked and what it found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub location: String,
    pub value: u64,
}

impl TraceEntry {
    fn new(location: impl Into<String>, value: u64) -> Self {
        Self {
            location: location.into(),
            value,
        }
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.location, self.value)
    }
}

/// Outcome of introspecting one handle.
///
/// `hidden_dim`, when present, always lies within the calibrated plausible
/// range; out-of-range values are treated as misses, never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionResult {
    pub structural_class_name: Option<String>,
    pub hidden_dim: Option<u64>,
    pub source: DimSource,
    pub trace: Vec<TraceEntry>,
}

impl IntrospectionResult {
    fn not_found(structural_class_name: Option<String>) -> Self {
        Self {
            structural_class_name,
            hidden_dim: None,
            source: DimSource::None,
            trace: Vec::new(),
        }
    }

    /// The detected width, or `fallback` if nothing was detected
    pub fn hidden_dim_or(&self, fallback: u64) -> u64 {
        self.hidden_dim.unwrap_or(fallback)
    }
}

/// A width declared by the model itself, as opposed to an estimate
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeclaredWidth {
    pub hidden_dim: u64,
    pub source: DimSource,
    pub trace: Vec<TraceEntry>,
}

/// Runs the probe pipeline with a given [`Calibration`].
#[derive(Debug, Clone, Default)]
pub struct Introspector {
    calibration: Calibration,
}

impl Introspector {
    /// `calibration` is not validated here; introspection cannot fail, and an
    /// empty `conventional_widths` list simply disables the parameter estimate.
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Introspect `handle`.
    ///
    /// An absent handle short-circuits to a `none` result without walking anything.
    /// The handle is only read, so one handle may be introspected from many
    /// threads at once.
    pub fn introspect<T>(&self, handle: Option<&ModelHandle<T>>) -> IntrospectionResult
    where
        T: ParameterTensor,
    {
        let Some(handle) = handle else {
            log::trace!("no model handle supplied, skipping introspection");
            return IntrospectionResult::not_found(None);
        };

        let (label, inner) = unwrap_inner(handle);
        let class_name = Some(inner.class_name().to_string());

        if let Some(declared) = self.declared_width(&label, inner) {
            log::debug!(
                "{} declares hidden dim {} ({})",
                inner.class_name(),
                declared.hidden_dim,
                declared.source
            );
            return IntrospectionResult {
                structural_class_name: class_name,
                hidden_dim: Some(declared.hidden_dim),
                source: declared.source,
                trace: declared.trace,
            };
        }

        match self.estimate_from_parameters(inner) {
            Some((total, estimate, snapped)) => {
                log::debug!(
                    "{} hidden dim estimated at {} from {} parameters (snapped to {})",
                    inner.class_name(),
                    estimate,
                    total,
                    snapped
                );
                IntrospectionResult {
                    structural_class_name: class_name,
                    hidden_dim: Some(snapped),
                    source: DimSource::ParameterEstimate,
                    trace: vec![
                        TraceEntry::new(format!("{label}.parameters.count"), total),
                        TraceEntry::new(format!("{label}.parameters.width_estimate"), estimate),
                    ],
                }
            }
            None => {
                log::debug!("no hidden dim found for {}", inner.class_name());
                IntrospectionResult::not_found(class_name)
            }
        }
    }

    /// Search `model` and its structural sub-objects for a declared width:
    /// first as direct attributes of every object, then inside their configs.
    pub(crate) fn declared_width<T>(&self, label: &str, model: &ModelHandle<T>) -> Option<DeclaredWidth> {
        let search = search_set(label, model);

        for (path, object) in &search {
            if let Some((hidden_dim, trace)) = self.scan_widths(path, object) {
                return Some(DeclaredWidth {
                    hidden_dim,
                    source: DimSource::DirectAttribute,
                    trace,
                });
            }
        }

        for (path, object) in &search {
            for accessor in CONFIG_ACCESSORS {
                let Some(config) = object.child(accessor) else {
                    continue;
                };
                let config_path = format!("{path}.{accessor}");
                if let Some((hidden_dim, trace)) = self.scan_widths(&config_path, config) {
                    return Some(DeclaredWidth {
                        hidden_dim,
                        source: DimSource::NestedConfig,
                        trace,
                    });
                }
            }
        }

        None
    }

    /// Test every width attribute on `object`.
    ///
    /// The first plausible value wins, but the remaining names are still
    /// tested so the trace shows every plausible value this object carries.
    fn scan_widths<T>(&self, path: &str, object: &ModelHandle<T>) -> Option<(u64, Vec<TraceEntry>)> {
        let mut winner = None;
        let mut trace = Vec::new();

        for name in WIDTH_ATTRIBUTES {
            match object.int_attribute(name) {
                Some(value) if self.calibration.is_plausible_width(value) => {
                    let value = value as u64;
                    trace.push(TraceEntry::new(format!("{path}.{name}"), value));
                    winner.get_or_insert(value);
                }
                Some(value) => {
                    log::trace!("{path}.{name} = {value} is outside the plausible width range");
                }
                None => {}
            }
        }

        winner.map(|hidden_dim| (hidden_dim, trace))
    }

    /// Returns `(total parameters, raw width estimate, snapped width)`
    fn estimate_from_parameters<T>(&self, model: &ModelHandle<T>) -> Option<(u64, u64, u64)>
    where
        T: ParameterTensor,
    {
        let total = model.total_parameters()?;
        let per_width_squared = 12 * self.calibration.assumed_depth;
        let estimate = (total as f64 / per_width_squared as f64).sqrt() as u64;
        let snapped = nearest_width(&self.calibration.conventional_widths, estimate)?;
        Some((total, estimate, snapped))
    }
}

/// Introspect `handle` with the default calibration
pub fn introspect<T>(handle: Option<&ModelHandle<T>>) -> IntrospectionResult
where
    T: ParameterTensor,
{
    Introspector::default().introspect(handle)
}

/// Peel off wrapper layers.
///
/// Each accessor in [`INNER_MODEL_ACCESSORS`] is tried once, in order, against
/// the object reached so far, so at most one layer per accessor is removed.
/// Returns the dotted path to the unwrapped object alongside it.
pub(crate) fn unwrap_inner<T>(handle: &ModelHandle<T>) -> (String, &ModelHandle<T>) {
    INNER_MODEL_ACCESSORS
        .iter()
        .fold((ROOT_LABEL.to_string(), handle), |(label, current), accessor| {
            match current.child(accessor) {
                Some(child) => (format!("{label}.{accessor}"), child.as_ref()),
                None => (label, current),
            }
        })
}

/// Peel off a single wrapper layer through the first present accessor
pub(crate) fn unwrap_once<T>(handle: &ModelHandle<T>) -> (String, &ModelHandle<T>) {
    INNER_MODEL_ACCESSORS
        .iter()
        .find_map(|accessor| {
            handle
                .child(accessor)
                .map(|child| (format!("{ROOT_LABEL}.{accessor}"), child.as_ref()))
        })
        .unwrap_or_else(|| (ROOT_LABEL.to_string(), handle))
}

/// The unwrapped model followed by each distinct structural sub-object
fn search_set<'a, T>(label: &str, model: &'a ModelHandle<T>) -> Vec<(String, &'a ModelHandle<T>)> {
    let mut search = vec![(label.to_string(), model)];

    for accessor in STRUCTURAL_ACCESSORS {
        let Some(child) = model.child(accessor) else {
            continue;
        };
        let child: &ModelHandle<T> = child;
        if search.iter().any(|(_, seen)| std::ptr::eq(*seen, child)) {
            continue;
        }
        search.push((format!("{label}.{accessor}"), child));
    }

    search
}

/// The entry of `widths` closest to `estimate`; ties go to the earlier entry
fn nearest_width(widths: &[u64], estimate: u64) -> Option<u64> {
    widths.iter().copied().min_by_key(|width| width.abs_diff(estimate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock_tensor::MockTensor;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn patcher(inner: ModelHandle<MockTensor>) -> ModelHandle<MockTensor> {
        ModelHandle::new("ModelPatcher").with_child("model", inner)
    }

    #[test]
    fn test_absent_handle() {
        let result = introspect::<MockTensor>(None);
        assert_eq!(result.hidden_dim, None);
        assert_eq!(result.source, DimSource::None);
        assert_eq!(result.structural_class_name, None);
        assert!(result.trace.is_empty());
    }

    #[test]
    fn test_direct_attribute_beats_config() {
        let handle = patcher(
            ModelHandle::new("WanModel")
                .with_attribute("hidden_size", 1536)
                .with_child("config", ModelHandle::new("Config").with_attribute("hidden_size", 4096)),
        );

        let result = introspect(Some(&handle));
        assert_eq!(result.hidden_dim, Some(1536));
        assert_eq!(result.source, DimSource::DirectAttribute);
        assert_eq!(result.structural_class_name.as_deref(), Some("WanModel"));
    }

    #[test]
    fn test_direct_attribute_on_sub_object_beats_config_on_root() {
        let handle = patcher(
            ModelHandle::new("Wrapper")
                .with_child("config", ModelHandle::new("Config").with_attribute("d_model", 4096))
                .with_child("transformer", ModelHandle::new("Transformer").with_attribute("inner_dim", 3072)),
        );

        let result = introspect(Some(&handle));
        assert_eq!(result.hidden_dim, Some(3072));
        assert_eq!(result.source, DimSource::DirectAttribute);
        assert_eq!(result.trace, vec![TraceEntry::new("self.model.transformer.inner_dim", 3072)]);
    }

    #[test]
    fn test_nested_config() {
        let handle = patcher(
            ModelHandle::new("HunyuanVideo")
                .with_child("model_config", ModelHandle::new("Config").with_attribute("d_model", 3072)),
        );

        let result = introspect(Some(&handle));
        assert_eq!(result.hidden_dim, Some(3072));
        assert_eq!(result.source, DimSource::NestedConfig);
        assert_eq!(result.trace, vec![TraceEntry::new("self.model.model_config.d_model", 3072)]);
    }

    #[test]
    fn test_config_order() {
        let handle: ModelHandle<MockTensor> = ModelHandle::new("Model")
            .with_child("config", ModelHandle::new("A").with_attribute("dim", 1024))
            .with_child("model_config", ModelHandle::new("B").with_attribute("dim", 2048));

        assert_eq!(introspect(Some(&handle)).hidden_dim, Some(1024));
    }

    #[test]
    fn test_out_of_range_values_are_skipped_not_clamped() {
        let handle: ModelHandle<MockTensor> = ModelHandle::new("Odd")
            .with_attribute("hidden_size", 65536)
            .with_attribute("dim", 16)
            .with_attribute("embed_dim", 768);

        let result = introspect(Some(&handle));
        assert_eq!(result.hidden_dim, Some(768));
        assert_eq!(result.trace, vec![TraceEntry::new("self.embed_dim", 768)]);
    }

    #[test]
    fn test_non_integer_attributes_are_ignored() {
        let handle: ModelHandle<MockTensor> = ModelHandle::new("Floaty")
            .with_attribute("hidden_size", 1536.0)
            .with_attribute("dim", "1536");

        let result = introspect(Some(&handle));
        assert_eq!(result.source, DimSource::None);
    }

    #[test]
    fn test_trace_records_every_hit_on_winning_object() {
        let handle: ModelHandle<MockTensor> = ModelHandle::new("Ambiguous")
            .with_attribute("hidden_size", 1536)
            .with_attribute("inner_dim", 6144)
            .with_attribute("width", 32)
            .with_child("transformer", ModelHandle::new("T").with_attribute("dim", 5120));

        let result = introspect(Some(&handle));
        assert_eq!(result.hidden_dim, Some(1536));
        assert_eq!(
            result.trace,
            vec![
                TraceEntry::new("self.hidden_size", 1536),
                TraceEntry::new("self.inner_dim", 6144),
            ]
        );
    }

    #[test]
    fn test_two_level_unwrap() {
        let handle = patcher(
            ModelHandle::new("WAN21").with_child("diffusion_model", ModelHandle::new("WanModel").with_attribute("dim", 5120)),
        );

        let result = introspect(Some(&handle));
        assert_eq!(result.structural_class_name.as_deref(), Some("WanModel"));
        assert_eq!(result.trace, vec![TraceEntry::new("self.model.diffusion_model.dim", 5120)]);
    }

    #[test]
    fn test_unwrap_follows_each_accessor_once() {
        let handle = patcher(
            ModelHandle::new("L1")
                .with_attribute("hidden_size", 1024)
                .with_child("model", ModelHandle::new("L2").with_attribute("hidden_size", 2048)),
        );

        let (label, inner) = unwrap_inner(&handle);
        assert_eq!(label, "self.model");
        assert_eq!(inner.class_name(), "L1");

        // L2 is still reachable as a structural sub-object, but L1 answers first
        let result = introspect(Some(&handle));
        assert_eq!(result.structural_class_name.as_deref(), Some("L1"));
        assert_eq!(result.hidden_dim, Some(1024));
    }

    #[test]
    fn test_unwrap_without_outer_model_accessor() {
        let handle: ModelHandle<MockTensor> =
            ModelHandle::new("Outer").with_child("diffusion_model", ModelHandle::new("Inner"));

        let (label, inner) = unwrap_inner(&handle);
        assert_eq!(label, "self.diffusion_model");
        assert_eq!(inner.class_name(), "Inner");
    }

    #[test]
    fn test_unwrap_once_prefers_first_accessor() {
        let handle: ModelHandle<MockTensor> = ModelHandle::new("Outer")
            .with_child("diffusion_model", ModelHandle::new("Second"))
            .with_child("model", ModelHandle::new("First").with_child("diffusion_model", ModelHandle::new("Deep")));

        let (label, inner) = unwrap_once(&handle);
        assert_eq!(label, "self.model");
        assert_eq!(inner.class_name(), "First");

        let bare: ModelHandle<MockTensor> = ModelHandle::new("Bare");
        assert_eq!(unwrap_once(&bare).1.class_name(), "Bare");
    }

    #[test]
    fn test_aliased_children_searched_once() {
        let shared = Arc::new(ModelHandle::<MockTensor>::new("Shared"));
        let handle: ModelHandle<MockTensor> = ModelHandle::new("Root")
            .with_shared_child("transformer", shared.clone())
            .with_shared_child("backbone", shared);

        let search = search_set("self", &handle);
        let labels: Vec<_> = search.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["self", "self.transformer"]);
    }

    #[test]
    fn test_parameter_estimate() {
        let handle = patcher(ModelHandle::new("Opaque").with_parameters([
            MockTensor::new(1_000_000_000),
            MockTensor::new(700_000_000),
        ]));

        let result = introspect(Some(&handle));
        // sqrt(1.7e9 / (12 * 28)) ~= 2249, nearest conventional width is 2048
        assert_eq!(result.hidden_dim, Some(2048));
        assert_eq!(result.source, DimSource::ParameterEstimate);
        assert_eq!(
            result.trace,
            vec![
                TraceEntry::new("self.model.parameters.count", 1_700_000_000),
                TraceEntry::new("self.model.parameters.width_estimate", 2249),
            ]
        );
        assert!(Calibration::default().conventional_widths.contains(&2048));
    }

    #[test]
    fn test_parameter_estimate_small_model() {
        // 12 * 28 * 1536^2 parameters lands exactly on 1536
        let handle: ModelHandle<MockTensor> =
            ModelHandle::new("Small").with_parameters([MockTensor::new(12 * 28 * 1536 * 1536)]);

        let result = introspect(Some(&handle));
        assert_eq!(result.hidden_dim, Some(1536));
        assert_eq!(result.source, DimSource::ParameterEstimate);
    }

    #[test]
    fn test_non_numeric_parameters_fall_through_to_none() {
        let handle: ModelHandle<MockTensor> = ModelHandle::new("Broken")
            .with_parameters([MockTensor::new(1_000_000), MockTensor::non_numeric()]);

        let result = introspect(Some(&handle));
        assert_eq!(result.hidden_dim, None);
        assert_eq!(result.source, DimSource::None);
        assert_eq!(result.structural_class_name.as_deref(), Some("Broken"));
    }

    #[test]
    fn test_empty_parameter_set_snaps_to_smallest_width() {
        let handle: ModelHandle<MockTensor> = ModelHandle::new("Empty").with_parameters(Vec::new());

        let result = introspect(Some(&handle));
        assert_eq!(result.hidden_dim, Some(256));
        assert_eq!(result.source, DimSource::ParameterEstimate);
        assert_eq!(
            result.trace,
            vec![
                TraceEntry::new("self.parameters.count", 0),
                TraceEntry::new("self.parameters.width_estimate", 0),
            ]
        );
    }

    #[test]
    fn test_nearest_width_tie_goes_low() {
        assert_eq!(nearest_width(&[256, 512], 384), Some(256));
        assert_eq!(nearest_width(&[256, 512], 385), Some(512));
        assert_eq!(nearest_width(&[], 385), None);
    }

    #[test]
    fn test_custom_plausible_range() {
        let calibration = Calibration {
            min_hidden_dim: 2048,
            ..Calibration::default()
        };
        let handle: ModelHandle<MockTensor> = ModelHandle::new("Model")
            .with_attribute("hidden_size", 1536)
            .with_attribute("model_dim", 4096);

        let result = Introspector::new(calibration).introspect(Some(&handle));
        assert_eq!(result.hidden_dim, Some(4096));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_introspection_of_shared_handle() {
        let handle = Arc::new(patcher(
            ModelHandle::new("WanModel")
                .with_attribute("dim", 1536)
                .with_parameters([MockTensor::new(1_300_000_000)]),
        ));

        let tasks = (0..16)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { introspect(Some(handle.as_ref())) })
            })
            .collect::<Vec<_>>();

        let expected = introspect(Some(handle.as_ref()));
        for result in futures::future::join_all(tasks).await {
            assert_eq!(result.unwrap(), expected);
        }
    }
}
