//! # Model Handles
//!
//! An explicit, finite description of a model object graph.
//!
//! Host frameworks wrap their models in layers of heterogeneous objects: an
//! outer patcher holding an inner module holding a transformer holding a
//! config. Rather than probing those objects dynamically, the adapter at the
//! framework boundary builds a [`ModelHandle`] once, recording only what
//! exists: a class name, scalar attributes, named sub-objects and (when the
//! framework can enumerate them) parameter tensors. Every lookup afterwards is
//! a plain absence check.
//!
//! Sub-objects are reference counted, so one object reachable under two
//! accessor names (`model` and `diffusion_model`, say) is the same object and
//! is searched only once.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::{total_elements, ParameterShape, ParameterTensor};
use crate::error::ConfigError;

/// A scalar attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Attribute {
    /// The value if this attribute holds an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attribute::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Bool(value) => write!(f, "{}", value),
            Attribute::Int(value) => write!(f, "{}", value),
            Attribute::Float(value) => write!(f, "{}", value),
            Attribute::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Attribute::Bool(value)
    }
}

impl From<i32> for Attribute {
    fn from(value: i32) -> Self {
        Attribute::Int(value as i64)
    }
}

impl From<i64> for Attribute {
    fn from(value: i64) -> Self {
        Attribute::Int(value)
    }
}

impl From<u32> for Attribute {
    fn from(value: u32) -> Self {
        Attribute::Int(value as i64)
    }
}

impl From<f64> for Attribute {
    fn from(value: f64) -> Self {
        Attribute::Float(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::Text(value.to_string())
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Attribute::Text(value)
    }
}

/// One object in a model's object graph.
///
/// # Type Parameters
///
/// * `T` - The parameter tensor type, any [`ParameterTensor`]. Serialized
///   descriptions use [`ParameterShape`].
///
/// # Example
///
/// ```rust
/// use framecap::{ModelHandle, ParameterShape};
///
/// let handle: ModelHandle<ParameterShape> = ModelHandle::new("ModelPatcher")
///     .with_child(
///         "model",
///         ModelHandle::new("WAN21").with_child(
///             "diffusion_model",
///             ModelHandle::new("WanModel").with_attribute("dim", 1536),
///         ),
///     );
///
/// assert_eq!(handle.child("model").map(|m| m.class_name()), Some("WAN21"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct ModelHandle<T = ParameterShape> {
    class_name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Attribute>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, Arc<ModelHandle<T>>>,

    /// `None` when the framework cannot enumerate this object's parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Vec<T>>,
}

impl<T> ModelHandle<T> {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            attributes: BTreeMap::new(),
            children: BTreeMap::new(),
            parameters: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(self, name: impl Into<String>, child: ModelHandle<T>) -> Self {
        self.with_shared_child(name, Arc::new(child))
    }

    /// Attach a sub-object that may also be reachable under other names
    pub fn with_shared_child(mut self, name: impl Into<String>, child: Arc<ModelHandle<T>>) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    /// Mark this object's parameters as enumerable and record them
    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = T>) -> Self {
        self.parameters = Some(parameters.into_iter().collect());
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// The named attribute, only if it holds an integer
    pub fn int_attribute(&self, name: &str) -> Option<i64> {
        self.attribute(name).and_then(Attribute::as_int)
    }

    pub fn child(&self, name: &str) -> Option<&Arc<ModelHandle<T>>> {
        self.children.get(name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn parameters(&self) -> Option<&[T]> {
        self.parameters.as_deref()
    }
}

impl<T> ModelHandle<T>
where
    T: ParameterTensor,
{
    /// Total element count across this object's own parameters.
    ///
    /// Returns `None` if the parameters are not enumerable, any of them is not
    /// numeric, or the sum overflows.
    pub fn total_parameters(&self) -> Option<u64> {
        total_elements(self.parameters()?)
    }
}

impl ModelHandle<ParameterShape> {
    /// Parse a handle description from TOML
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Read a handle description from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
