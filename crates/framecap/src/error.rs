use thiserror::Error;

/// Result type for budgeting operations
pub type Result<T> = std::result::Result<T, BudgetError>;

/// Malformed caller-supplied numeric inputs.
///
/// Introspection misses are never errors; only the request itself can be rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BudgetError {
    /// Width leaves no spatial token after downsampling
    #[error("Invalid width: {value} (must be at least {minimum})")]
    InvalidWidth { value: u32, minimum: u32 },

    /// Height leaves no spatial token after downsampling
    #[error("Invalid height: {value} (must be at least {minimum})")]
    InvalidHeight { value: u32, minimum: u32 },

    /// Frame rate is zero, negative or not finite
    #[error("Invalid fps: {0} (must be a finite value > 0)")]
    InvalidFps(f64),

    /// Duration is zero, negative or not finite
    #[error("Invalid duration: {0} (must be a finite value > 0)")]
    InvalidDuration(f64),

    /// Safety margin outside `(0, 1]`
    #[error("Invalid safety margin: {0} (must be in (0, 1])")]
    InvalidSafetyMargin(f64),

    /// Hidden dimension of zero
    #[error("Invalid hidden dim: {0} (must be > 0)")]
    InvalidHiddenDim(u64),

    /// Calibration handed to the budgeter is inconsistent
    #[error("{0}")]
    InvalidCalibration(String),
}

impl BudgetError {
    /// Name of the offending request field
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidWidth { .. } => "width",
            Self::InvalidHeight { .. } => "height",
            Self::InvalidFps(_) => "fps",
            Self::InvalidDuration(_) => "duration",
            Self::InvalidSafetyMargin(_) => "safety_margin",
            Self::InvalidHiddenDim(_) => "hidden_dim",
            Self::InvalidCalibration(_) => "calibration",
        }
    }
}

/// Errors raised while loading or validating a [`Calibration`](crate::Calibration)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Calibration file could not be read
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Calibration file is not valid TOML for this schema
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Calibration values are inconsistent
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),
}

impl From<ConfigError> for BudgetError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidCalibration(err.to_string())
    }
}

impl ConfigError {
    /// Create an invalid calibration error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidCalibration(msg.into())
    }
}
