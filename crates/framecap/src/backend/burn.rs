//! The burn implementation for parameter counting.
//! Burn tensors carry their rank as a const generic, so one blanket impl
//! covers every rank and kind.
use super::ParameterTensor;
use burn::prelude::{Backend as BurnBackend, Tensor};
use burn::tensor::BasicOps;

impl<B, const D: usize, K> ParameterTensor for Tensor<B, D, K>
where
    B: BurnBackend,
    K: BasicOps<B>,
{
    fn element_count(&self) -> Option<u64> {
        Some(self.shape().num_elements() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_burn_element_count() {
        let device = Default::default();
        let weight = Tensor::<NdArray, 2>::zeros([64, 32], &device);
        let bias = Tensor::<NdArray, 1>::zeros([64], &device);

        assert_eq!(weight.element_count(), Some(2048));
        assert_eq!(bias.element_count(), Some(64));
    }
}
