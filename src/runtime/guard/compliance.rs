//! Shape and stride compatibility between a recorded [`TensorSignature`]
//! and a concrete [`RuntimeTensor`].
//!
//! Checks, in order:
//!   a. rank, scalar type, device and effective `requires_grad`
//!   b. stride order and contiguity, walking dimensions from the fastest
//!      stride to the slowest; contiguity is what the compiled path uses to
//!      collapse dimensions, so size-1 dimensions get special treatment
//!   c. broadcast (size-1) and size-0 dimensions, in semantic order; the
//!      compiled path specializes both

use specguard_tensor::{RuntimeTensor, StrideWalk, TensorSignature};
use tracing::trace;

use super::{GuardError, GuardKind};
use crate::runtime::grad_mode;

const GUARD: GuardKind = GuardKind::Tensor;

/// Whether `tensor` may be fed to the compiled path recorded with
/// `signature`, using the calling thread's gradient mode.
pub fn complies(signature: &TensorSignature, tensor: &RuntimeTensor) -> Result<bool, GuardError> {
    complies_with_grad_mode(signature, tensor, grad_mode::is_enabled())
}

pub fn complies_with_grad_mode(
    signature: &TensorSignature,
    tensor: &RuntimeTensor,
    grad_mode_enabled: bool,
) -> Result<bool, GuardError> {
    let rank = signature
        .rank
        .ok_or(GuardError::MissingRank { guard: GUARD })?;

    if rank != tensor.ndim() {
        trace!(expected = rank, found = tensor.ndim(), "rank mismatch");
        return Ok(false);
    }
    if signature
        .scalar_type
        .is_some_and(|scalar_type| scalar_type != tensor.scalar_type())
    {
        trace!(found = %tensor.scalar_type(), "scalar type mismatch");
        return Ok(false);
    }
    if signature
        .device
        .is_some_and(|device| device != tensor.device())
    {
        trace!(found = %tensor.device(), "device mismatch");
        return Ok(false);
    }
    let requires_grad = tensor.effective_requires_grad(grad_mode_enabled);
    if signature
        .requires_grad
        .is_some_and(|expected| expected != requires_grad)
    {
        trace!("requires_grad mismatch");
        return Ok(false);
    }

    if signature.sizes.len() < rank || signature.stride_properties.len() < rank {
        return Err(GuardError::SignatureLength {
            guard: GUARD,
            rank,
            sizes: signature.sizes.len(),
            strides: signature.stride_properties.len(),
        });
    }

    let sizes = tensor.sizes();
    let strides = tensor.strides();
    let mut walk = StrideWalk::new();

    for position in 0..rank {
        let property = signature.stride_properties[position];
        if let Some(dim) = property.stride_index {
            if dim >= rank {
                return Err(GuardError::StrideIndexOutOfRange {
                    guard: GUARD,
                    index: dim,
                    rank,
                });
            }

            if !walk.order_holds(strides, dim) {
                trace!(position, dim, "stride order mismatch");
                return Ok(false);
            }

            if property.contiguous {
                if position > 0
                    && sizes[dim] != 1
                    && strides[dim] != 1
                    && signature.stride_properties[position - 1].stride_index.is_none()
                {
                    return Err(GuardError::InconsistentStrideIndex {
                        guard: GUARD,
                        position,
                    });
                }
                if !walk.contiguous_at(position, sizes, strides, dim) {
                    trace!(position, dim, "contiguity mismatch");
                    return Ok(false);
                }
            }

            walk.advance(sizes, strides, dim);
        }

        // Unconstrained sizes skip both checks.
        let size = sizes[position];
        if signature
            .is_broadcast(position)
            .is_some_and(|broadcast| broadcast != (size == 1))
        {
            trace!(dim = position, "broadcast mismatch");
            return Ok(false);
        }
        if signature
            .is_empty_dim(position)
            .is_some_and(|empty| empty != (size == 0))
        {
            trace!(dim = position, "size-0 mismatch");
            return Ok(false);
        }
    }

    Ok(true)
}

/// Records the signature of `tensor` under the calling thread's gradient
/// mode. Every tensor complies with its own signature.
pub fn signature_of(tensor: &RuntimeTensor) -> TensorSignature {
    TensorSignature::of(tensor, grad_mode::is_enabled())
}
