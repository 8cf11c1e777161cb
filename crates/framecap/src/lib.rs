//! # Framecap
//!
//! Memory-aware **frame cap**ping for video generation pipelines: how many
//! frames can a given device hold for a given model, at a given resolution?
//!
//! ## Overview
//!
//! Video transformers run out of device memory long before they run out of
//! anything else, and peak memory grows with the number of frames in flight.
//! This library estimates that peak from a small cost model and caps the
//! requested clip length accordingly.
//!
//! Key components include:
//!
//! - A model introspector that recovers a model's hidden dimension from an
//!   arbitrarily shaped object graph
//! - A frame budgeter that turns width, geometry and device capacity into a
//!   safe, stride-aligned frame count
//! - A tensor abstraction layer for counting parameters across backends
//! - Pipeline node adapters and device capacity probes
//!
//! ## Architecture
//!
//! ### Assumptions
//! Regardless of model, framecap assumes:
//!  - Frames are downsampled `8x` on both spatial axes before attention
//!  - Activations are half precision
//!  - Encoders take `1 + k * 4` frames: a reference frame plus whole groups
//!
//! Every one of these is a [`Calibration`] field and can be overridden.
//!
//! ### Model Handles
//!
//! A [`ModelHandle`] is an explicit description of a model object graph, built
//! once where the host framework hands its model over. The introspector only
//! ever performs absence checks against it, so probing dozens of speculative
//! names is silent and free.
//!
//! ### Backend Traits
//!
//! The [`ParameterTensor`] trait defines the one thing the introspector needs
//! from a tensor: its element count. This keeps the width estimate independent
//! of the tensor library that built the model.
//!
//! ## Features
//!
//! - **candle** - Enables candle backend
//! - **burn** - Enables burn backend
//!
//! # Example
//!
//! ```rust
//! use framecap::{FixedCapacity, FrameLimitInputs, FrameLimitNode, ModelHandle, ParameterShape};
//!
//! let model: ModelHandle<ParameterShape> = ModelHandle::new("ModelPatcher")
//!     .with_child("model", ModelHandle::new("WanModel").with_attribute("dim", 1536));
//!
//! let node = FrameLimitNode::new(FixedCapacity::bytes(16 << 30));
//! let output = node.execute(&FrameLimitInputs::default(), Some(&model)).unwrap();
//!
//! assert_eq!(output.capped_frames, 161);
//! println!("{}", output.text);
//! ```

mod config;
mod error;
mod handle;

pub mod backend;
pub mod budget;
pub mod constant;
pub mod device;
pub mod introspect;
pub mod node;
pub mod summary;

pub use backend::{ParameterShape, ParameterTensor};
pub use budget::{budget, budget_with, BudgetRequest, BudgetResult};
pub use config::Calibration;
pub use device::{DeviceProbe, FixedCapacity, NvidiaSmiProbe};
pub use error::{BudgetError, ConfigError, Result};
pub use handle::{Attribute, ModelHandle};
pub use introspect::{introspect, DimSource, IntrospectionResult, Introspector, TraceEntry};
pub use node::{FrameLimitInputs, FrameLimitNode, FrameLimitOutput, ModelInfoNode, ModelInfoOutput};
pub use summary::{summarize, ModelFormat, ModelSummary};
