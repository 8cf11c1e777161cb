use serde::{Deserialize, Serialize};

use super::ParameterTensor;

/// A parameter described only by its dimensions.
///
/// Serializes as a plain list, so a handle description can say
/// `parameters = [[1536, 1536], [1536]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterShape(pub Vec<usize>);

impl ParameterShape {
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }
}

impl ParameterTensor for ParameterShape {
    fn element_count(&self) -> Option<u64> {
        self.0
            .iter()
            .try_fold(1u64, |acc, &dim| acc.checked_mul(dim as u64))
    }
}
