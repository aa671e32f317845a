use serde::{Deserialize, Serialize};

use crate::dtype::{Device, ScalarType};
use crate::stride::StrideWalk;
use crate::tensor::RuntimeTensor;

/// Stride descriptor for one position in fastest-to-slowest stride order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrideProperty {
    /// Semantic dimension occupying this position; `None` leaves the
    /// position unconstrained.
    #[serde(default)]
    pub stride_index: Option<usize>,
    /// Whether the dimension collapses with its inner neighbour.
    #[serde(default)]
    pub contiguous: bool,
}

impl StrideProperty {
    pub fn new(stride_index: usize, contiguous: bool) -> Self {
        Self {
            stride_index: Some(stride_index),
            contiguous,
        }
    }

    pub fn unconstrained() -> Self {
        Self {
            stride_index: None,
            contiguous: false,
        }
    }
}

/// Shape, layout and type constraints recorded for one specialized path.
///
/// Every `Option` left as `None` is unconstrained. `sizes` is in semantic
/// dimension order, `stride_properties` in stride order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorSignature {
    pub rank: Option<usize>,
    #[serde(default)]
    pub scalar_type: Option<ScalarType>,
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub requires_grad: Option<bool>,
    #[serde(default)]
    pub sizes: Vec<Option<i64>>,
    #[serde(default)]
    pub stride_properties: Vec<StrideProperty>,
}

impl TensorSignature {
    /// Signature of the given rank that accepts any tensor of that rank.
    pub fn unconstrained(rank: usize) -> Self {
        Self {
            rank: Some(rank),
            scalar_type: None,
            device: None,
            requires_grad: None,
            sizes: vec![None; rank],
            stride_properties: vec![StrideProperty::unconstrained(); rank],
        }
    }

    /// Records the full signature of a concrete tensor, the way a profiling
    /// run would.
    pub fn of(tensor: &RuntimeTensor, grad_mode_enabled: bool) -> Self {
        let sizes = tensor.sizes();
        let strides = tensor.strides();

        let mut order: Vec<usize> = (0..tensor.ndim()).collect();
        // Ties go to the higher semantic index, which is the faster one in
        // row-major layout.
        order.sort_by_key(|&dim| (strides[dim], std::cmp::Reverse(dim)));

        let mut walk = StrideWalk::new();
        let stride_properties = order
            .iter()
            .enumerate()
            .map(|(position, &dim)| {
                let contiguous = walk.contiguous_at(position, sizes, strides, dim);
                walk.advance(sizes, strides, dim);
                StrideProperty::new(dim, contiguous)
            })
            .collect();

        Self {
            rank: Some(tensor.ndim()),
            scalar_type: Some(tensor.scalar_type()),
            device: Some(tensor.device()),
            requires_grad: Some(tensor.effective_requires_grad(grad_mode_enabled)),
            sizes: sizes.iter().copied().map(Some).collect(),
            stride_properties,
        }
    }

    #[must_use]
    pub fn with_scalar_type(mut self, scalar_type: ScalarType) -> Self {
        self.scalar_type = Some(scalar_type);
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    #[must_use]
    pub fn with_requires_grad(mut self, requires_grad: bool) -> Self {
        self.requires_grad = Some(requires_grad);
        self
    }

    #[must_use]
    pub fn with_sizes(mut self, sizes: Vec<Option<i64>>) -> Self {
        self.sizes = sizes;
        self
    }

    #[must_use]
    pub fn with_stride_properties(mut self, stride_properties: Vec<StrideProperty>) -> Self {
        self.stride_properties = stride_properties;
        self
    }

    /// Whether dimension `dim` was recorded as a broadcast (size-1) axis, or
    /// `None` when its size is unconstrained.
    pub fn is_broadcast(&self, dim: usize) -> Option<bool> {
        self.recorded_size(dim).map(|size| size == 1)
    }

    /// Whether dimension `dim` was recorded as empty, or `None` when its size
    /// is unconstrained.
    pub fn is_empty_dim(&self, dim: usize) -> Option<bool> {
        self.recorded_size(dim).map(|size| size == 0)
    }

    fn recorded_size(&self, dim: usize) -> Option<i64> {
        self.sizes.get(dim).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_cpu(sizes: Vec<i64>, strides: Vec<i64>) -> RuntimeTensor {
        RuntimeTensor::with_strides(sizes, strides, ScalarType::Float, Device::Cpu).unwrap()
    }

    #[test]
    fn row_major_tensor_is_fully_contiguous() {
        let tensor = float_cpu(vec![2, 3, 4], vec![12, 4, 1]);
        let signature = TensorSignature::of(&tensor, true);
        assert_eq!(
            signature.stride_properties,
            vec![
                StrideProperty::new(2, true),
                StrideProperty::new(1, true),
                StrideProperty::new(0, true),
            ]
        );
        assert_eq!(signature.sizes, vec![Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn transposed_tensor_records_permuted_order() {
        let tensor = float_cpu(vec![3, 2], vec![1, 3]);
        let signature = TensorSignature::of(&tensor, true);
        assert_eq!(
            signature.stride_properties,
            vec![StrideProperty::new(0, true), StrideProperty::new(1, true)]
        );
    }

    #[test]
    fn sliced_tensor_is_not_contiguous() {
        let tensor = float_cpu(vec![4, 3], vec![6, 2]);
        let signature = TensorSignature::of(&tensor, true);
        assert_eq!(
            signature.stride_properties,
            vec![StrideProperty::new(1, false), StrideProperty::new(0, true)]
        );
    }

    #[test]
    fn broadcast_flags_read_recorded_sizes() {
        let signature = TensorSignature::unconstrained(3).with_sizes(vec![Some(1), None, Some(0)]);
        assert_eq!(signature.is_broadcast(0), Some(true));
        assert_eq!(signature.is_broadcast(1), None);
        assert_eq!(signature.is_broadcast(2), Some(false));
        assert_eq!(signature.is_empty_dim(2), Some(true));
        assert_eq!(signature.is_empty_dim(0), Some(false));
        assert_eq!(signature.is_empty_dim(5), None);
    }

    #[test]
    fn requires_grad_records_effective_value() {
        let tensor = float_cpu(vec![2], vec![1]).with_requires_grad(true);
        let recorded = |grad_mode| TensorSignature::of(&tensor, grad_mode).requires_grad;
        assert_eq!(recorded(false), Some(false));
        assert_eq!(recorded(true), Some(true));
    }
}
