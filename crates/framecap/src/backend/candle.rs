use super::ParameterTensor;
use candle_core::Tensor;

impl ParameterTensor for Tensor {
    fn element_count(&self) -> Option<u64> {
        Some(self.elem_count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::total_elements;
    use candle_core::{DType, Device};

    #[test]
    fn test_candle_element_count() {
        let device = Device::Cpu;
        let weight = Tensor::zeros(&[64, 32], DType::F16, &device).unwrap();
        let bias = Tensor::zeros(&[64], DType::F32, &device).unwrap();

        assert_eq!(weight.element_count(), Some(2048));
        assert_eq!(total_elements(&[weight, bias]), Some(2112));
    }
}
