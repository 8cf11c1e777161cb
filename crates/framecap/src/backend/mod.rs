//! # Parameter Backend
//!
//! This module provides a unified view of parameter tensors from different
//! tensor libraries, so the introspector can estimate a model's width from
//! its parameter count without knowing which library built the model.
//!
//! ## Feature Flags
//!
//! The module uses feature flags to conditionally compile support for different backends:
//!
//! - `candle`: Enables support for the Candle tensor library
//! - `burn`: Enables support for the Burn tensor library
//!
//! Without either flag, [`ParameterShape`] describes parameters by shape alone,
//! which is what serialized handle descriptions use.

mod core_trait;
mod shape;

#[cfg_attr(docsrs, doc(cfg(feature = "candle")))]
#[cfg(feature = "candle")]
/// Candle tensor backend implementation.
///
/// This module is only available when the `candle` feature flag is enabled.
/// It provides an implementation of [`ParameterTensor`] for Candle's `Tensor` type.
pub mod candle;

#[cfg_attr(docsrs, doc(cfg(feature = "burn")))]
#[cfg(feature = "burn")]
/// Burn tensor backend implementation.
///
/// This module is only available when the `burn` feature flag is enabled.
/// It provides an implementation of [`ParameterTensor`] for Burn tensors of
/// every rank and kind.
pub mod burn;


// Re-export the core traits for convenient imports
pub use core_trait::*;
pub use shape::ParameterShape;


#[cfg(test)]
/// Mock tensor implementation.
///
/// Reports a fixed element count, or none to model a non-numeric tensor
pub(crate) mod mock_tensor;
