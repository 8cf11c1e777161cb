use super::ParameterTensor;

// A simple mock tensor implementation for testing
#[derive(Clone, Debug, PartialEq)]
pub struct MockTensor {
    pub(crate) elements: Option<u64>,
}

impl MockTensor {
    pub fn new(elements: u64) -> Self {
        Self { elements: Some(elements) }
    }

    /// A tensor whose contents cannot be counted (e.g. strings or objects)
    pub fn non_numeric() -> Self {
        Self { elements: None }
    }
}

impl ParameterTensor for MockTensor {
    fn element_count(&self) -> Option<u64> {
        self.elements
    }
}
