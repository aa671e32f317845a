//! Tensor signature model.
//!
//! A [`TensorSignature`] is recorded once for each specialized compiled path
//! while profiling; a [`RuntimeTensor`] describes the concrete tensor handed
//! to one invocation of that path. Guards compare the two.

mod dtype;
mod signature;
mod stride;
mod tensor;

pub use dtype::{Device, ScalarType};
pub use signature::{StrideProperty, TensorSignature};
pub use stride::StrideWalk;
pub use tensor::{RuntimeTensor, TensorError, TensorParts, contiguous_strides};
