use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dtype::{Device, ScalarType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    #[error("tensor has {sizes} sizes but {strides} strides")]
    RankStrideMismatch { sizes: usize, strides: usize },
    #[error("dimension {dim} has negative size {size}")]
    NegativeSize { dim: usize, size: i64 },
}

/// Unvalidated tensor description, the serialized form of [`RuntimeTensor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorParts {
    pub sizes: Vec<i64>,
    #[serde(default)]
    pub strides: Option<Vec<i64>>,
    pub scalar_type: ScalarType,
    pub device: Device,
    #[serde(default)]
    pub requires_grad: bool,
}

/// Concrete tensor metadata observed at one call of a specialized path.
///
/// Sizes and strides always have the same length and sizes are never
/// negative; guards rely on both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TensorParts", into = "TensorParts")]
pub struct RuntimeTensor {
    sizes: Vec<i64>,
    strides: Vec<i64>,
    scalar_type: ScalarType,
    device: Device,
    requires_grad: bool,
}

impl RuntimeTensor {
    /// Row-major tensor with the given sizes.
    pub fn contiguous(
        sizes: Vec<i64>,
        scalar_type: ScalarType,
        device: Device,
    ) -> Result<Self, TensorError> {
        let strides = contiguous_strides(&sizes);
        Self::with_strides(sizes, strides, scalar_type, device)
    }

    pub fn with_strides(
        sizes: Vec<i64>,
        strides: Vec<i64>,
        scalar_type: ScalarType,
        device: Device,
    ) -> Result<Self, TensorError> {
        if sizes.len() != strides.len() {
            return Err(TensorError::RankStrideMismatch {
                sizes: sizes.len(),
                strides: strides.len(),
            });
        }
        if let Some((dim, &size)) = sizes.iter().enumerate().find(|(_, size)| **size < 0) {
            return Err(TensorError::NegativeSize { dim, size });
        }
        Ok(Self {
            sizes,
            strides,
            scalar_type,
            device,
            requires_grad: false,
        })
    }

    #[must_use]
    pub fn with_requires_grad(mut self, requires_grad: bool) -> Self {
        self.requires_grad = requires_grad;
        self
    }

    pub fn sizes(&self) -> &[i64] {
        &self.sizes
    }

    pub fn strides(&self) -> &[i64] {
        &self.strides
    }

    pub fn ndim(&self) -> usize {
        self.sizes.len()
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// The tensor's own flag, before gradient mode is taken into account.
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    pub fn effective_requires_grad(&self, grad_mode_enabled: bool) -> bool {
        self.requires_grad && grad_mode_enabled
    }
}

impl TryFrom<TensorParts> for RuntimeTensor {
    type Error = TensorError;

    fn try_from(parts: TensorParts) -> Result<Self, Self::Error> {
        let strides = parts
            .strides
            .unwrap_or_else(|| contiguous_strides(&parts.sizes));
        Ok(Self::with_strides(parts.sizes, strides, parts.scalar_type, parts.device)?
            .with_requires_grad(parts.requires_grad))
    }
}

impl From<RuntimeTensor> for TensorParts {
    fn from(tensor: RuntimeTensor) -> Self {
        Self {
            sizes: tensor.sizes,
            strides: Some(tensor.strides),
            scalar_type: tensor.scalar_type,
            device: tensor.device,
            requires_grad: tensor.requires_grad,
        }
    }
}

/// Row-major strides for `sizes`. Size-0 dimensions contribute as size 1 so
/// outer strides stay nonzero.
pub fn contiguous_strides(sizes: &[i64]) -> Vec<i64> {
    let mut strides = vec![1; sizes.len()];
    let mut running = 1i64;
    for (stride, &size) in strides.iter_mut().zip(sizes).rev() {
        *stride = running;
        running = running.saturating_mul(size.max(1));
    }
    strides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_strides_are_row_major() {
        assert_eq!(contiguous_strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(contiguous_strides(&[2, 0, 4]), vec![4, 4, 1]);
        assert!(contiguous_strides(&[]).is_empty());
    }

    #[test]
    fn rejects_mismatched_strides() {
        let err = RuntimeTensor::with_strides(vec![2, 3], vec![1], ScalarType::Float, Device::Cpu)
            .unwrap_err();
        assert_eq!(
            err,
            TensorError::RankStrideMismatch {
                sizes: 2,
                strides: 1
            }
        );
    }

    #[test]
    fn rejects_negative_sizes() {
        let err = RuntimeTensor::contiguous(vec![2, -1], ScalarType::Float, Device::Cpu)
            .unwrap_err();
        assert_eq!(err, TensorError::NegativeSize { dim: 1, size: -1 });
    }

    #[test]
    fn effective_requires_grad_follows_grad_mode() {
        let tensor = RuntimeTensor::contiguous(vec![3], ScalarType::Float, Device::Cpu)
            .unwrap()
            .with_requires_grad(true);
        assert!(tensor.effective_requires_grad(true));
        assert!(!tensor.effective_requires_grad(false));
    }

    #[test]
    fn deserializes_with_default_strides() {
        let json = r#"{"sizes":[2,3],"scalar_type":"float","device":{"cuda":0}}"#;
        let tensor: RuntimeTensor = serde_json::from_str(json).unwrap();
        assert_eq!(tensor.strides(), &[3, 1]);
        assert_eq!(tensor.device(), Device::Cuda(0));
        assert!(!tensor.requires_grad());
    }
}
