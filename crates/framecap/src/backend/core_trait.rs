/// A single parameter tensor of a model, as far as budgeting cares about it.
///
/// Only the element count matters: the introspector sums it over every
/// parameter of a model and derives a width estimate from the total.
pub trait ParameterTensor {
    /// Number of scalar elements held by this tensor.
    ///
    /// Returns `None` when the tensor cannot be counted as numeric data, which
    /// makes the whole parameter estimate fail rather than undercount.
    fn element_count(&self) -> Option<u64>;
}

/// Sum the element counts of `tensors`.
///
/// Returns `None` if any tensor is not countable or the sum overflows.
pub fn total_elements<'a, T, I>(tensors: I) -> Option<u64>
where
    T: ParameterTensor + 'a,
    I: IntoIterator<Item = &'a T>,
{
    tensors
        .into_iter()
        .try_fold(0u64, |acc, tensor| acc.checked_add(tensor.element_count()?))
}
