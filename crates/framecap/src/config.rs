use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constant::{
    ASSUMED_DEPTH, BYTES_PER_ELEMENT, CONVENTIONAL_WIDTHS, FALLBACK_HIDDEN_DIM, MAX_HIDDEN_DIM,
    MIN_HIDDEN_DIM, SPATIAL_COMPRESSION, STRIDE, TENSOR_COPIES,
};
use crate::error::ConfigError;

/// Empirical constants behind the introspector and the budgeter.
///
/// Each field defaults to the matching constant in [`crate::constant`]; a TOML
/// file only needs to name the values it overrides:
///
/// ```toml
/// tensor_copies = 6
/// stride = 8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Live activation copies per attention step
    pub tensor_copies: u64,

    /// Physical frames per latent frame
    pub stride: u64,

    /// Bytes per activation element
    pub bytes_per_element: u64,

    /// Spatial downsampling factor per axis
    pub spatial_compression: u32,

    /// Depth assumed by the parameter-count estimate
    pub assumed_depth: u64,

    /// Widths a parameter estimate snaps to
    pub conventional_widths: Vec<u64>,

    /// Smallest accepted width (inclusive)
    pub min_hidden_dim: u64,

    /// Largest accepted width (inclusive)
    pub max_hidden_dim: u64,

    /// Width used when introspection finds nothing
    pub fallback_hidden_dim: u64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            tensor_copies: TENSOR_COPIES,
            stride: STRIDE,
            bytes_per_element: BYTES_PER_ELEMENT,
            spatial_compression: SPATIAL_COMPRESSION,
            assumed_depth: ASSUMED_DEPTH,
            conventional_widths: CONVENTIONAL_WIDTHS.to_vec(),
            min_hidden_dim: MIN_HIDDEN_DIM,
            max_hidden_dim: MAX_HIDDEN_DIM,
            fallback_hidden_dim: FALLBACK_HIDDEN_DIM,
        }
    }
}

impl Calibration {
    /// Parse overrides from a TOML document and validate the result
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let calibration: Self = toml::from_str(raw)?;
        calibration.validate()?;
        Ok(calibration)
    }

    /// Read overrides from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading calibration from {}", path.as_ref().display());
        Self::from_toml_str(&raw)
    }

    /// Reject values that would make the budget arithmetic meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tensor_copies == 0 {
            return Err(ConfigError::invalid("tensor_copies must be > 0"));
        }
        if self.stride == 0 {
            return Err(ConfigError::invalid("stride must be > 0"));
        }
        if self.bytes_per_element == 0 {
            return Err(ConfigError::invalid("bytes_per_element must be > 0"));
        }
        if self.spatial_compression == 0 {
            return Err(ConfigError::invalid("spatial_compression must be > 0"));
        }
        if self.assumed_depth == 0 {
            return Err(ConfigError::invalid("assumed_depth must be > 0"));
        }
        if self.conventional_widths.is_empty() {
            return Err(ConfigError::invalid("conventional_widths must not be empty"));
        }
        if self.min_hidden_dim > self.max_hidden_dim {
            return Err(ConfigError::invalid(format!(
                "min_hidden_dim {} exceeds max_hidden_dim {}",
                self.min_hidden_dim, self.max_hidden_dim
            )));
        }
        if self.fallback_hidden_dim == 0 {
            return Err(ConfigError::invalid("fallback_hidden_dim must be > 0"));
        }
        Ok(())
    }

    /// Whether `value` is a believable transformer width
    pub fn is_plausible_width(&self, value: i64) -> bool {
        value >= 0 && (self.min_hidden_dim..=self.max_hidden_dim).contains(&(value as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_constants() {
        let calibration = Calibration::default();
        assert_eq!(calibration.tensor_copies, 5);
        assert_eq!(calibration.stride, 4);
        assert_eq!(calibration.assumed_depth, 28);
        assert_eq!(calibration.conventional_widths.len(), 11);
        assert!(calibration.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let calibration = Calibration::from_toml_str("stride = 8\ntensor_copies = 6\n").unwrap();
        assert_eq!(
            calibration,
            Calibration {
                stride: 8,
                tensor_copies: 6,
                ..Calibration::default()
            }
        );
    }

    #[test]
    fn test_rejects_zero_stride() {
        let err = Calibration::from_toml_str("stride = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCalibration(_)));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = Calibration::from_toml_str("min_hidden_dim = 4096\nmax_hidden_dim = 1024").unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = Calibration::from_toml_str("stride = \"four\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Calibration::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_plausible_width_bounds() {
        let calibration = Calibration::default();
        assert!(calibration.is_plausible_width(64));
        assert!(calibration.is_plausible_width(32768));
        assert!(!calibration.is_plausible_width(63));
        assert!(!calibration.is_plausible_width(32769));
        assert!(!calibration.is_plausible_width(-1536));
    }
}
