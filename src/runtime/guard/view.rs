//! Guard for compiled paths containing a view/reshape.
//!
//! A reshape recorded at trace time freezes most axes into the compiled path.
//! Only axes the reshape keeps untouched may vary between calls; they are
//! marked [`AxisConstraint::Dynamic`] on both sides. Dynamic input axes are
//! paired with dynamic output axes by order of appearance, not by index,
//! since the two size lists need not line up.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{GuardError, GuardKind};

const GUARD: GuardKind = GuardKind::View;

/// Raw encoding of a dynamic axis in recorded constraint lists and of the
/// inferred axis in requested view sizes.
pub const DYNAMIC_AXIS: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisConstraint {
    Fixed(i64),
    Dynamic,
}

impl AxisConstraint {
    pub fn from_raw(value: i64) -> Self {
        if value == DYNAMIC_AXIS {
            Self::Dynamic
        } else {
            Self::Fixed(value)
        }
    }
}

/// Axis constraints recorded for one reshape: `tensor` for the input sizes,
/// `view` for the requested view sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewConstraint {
    pub tensor: Vec<AxisConstraint>,
    pub view: Vec<AxisConstraint>,
}

impl ViewConstraint {
    pub fn from_raw(tensor: &[i64], view: &[i64]) -> Self {
        Self {
            tensor: axes(tensor),
            view: axes(view),
        }
    }
}

fn axes(raw: &[i64]) -> Vec<AxisConstraint> {
    raw.iter().copied().map(AxisConstraint::from_raw).collect()
}

/// Resolves the single inferred axis (`-1`) of `view_sizes` against the
/// element count of `tensor_sizes`.
///
/// Returns `Ok(None)` when the view is infeasible. More than one inferred
/// axis, or a non-positive explicit size, is a malformed trace.
pub fn infer_view_shape(
    tensor_sizes: &[i64],
    view_sizes: &[i64],
) -> Result<Option<Vec<i64>>, GuardError> {
    let mut inferred = None;
    let mut view_elements: i64 = 1;
    for (dim, &size) in view_sizes.iter().enumerate() {
        if size == DYNAMIC_AXIS {
            if inferred.is_some() {
                return Err(GuardError::MultipleInferredDims { guard: GUARD });
            }
            inferred = Some(dim);
        } else if size <= 0 {
            return Err(GuardError::NonPositiveViewDim {
                guard: GUARD,
                dim,
                size,
            });
        } else {
            let Some(product) = view_elements.checked_mul(size) else {
                return Ok(None);
            };
            view_elements = product;
        }
    }

    let Some(elements) = element_count(tensor_sizes) else {
        return Ok(None);
    };
    if elements % view_elements != 0 {
        trace!(elements, view_elements, "view is infeasible");
        return Ok(None);
    }

    let mut resolved = view_sizes.to_vec();
    if let Some(dim) = inferred {
        resolved[dim] = elements / view_elements;
    }
    Ok(Some(resolved))
}

/// Checks a resolved reshape against the recorded constraints.
///
/// Fixed axes must match exactly; dynamic input sizes are queued and each
/// dynamic view axis must equal the next queued size. The reshape must
/// preserve the element count.
pub fn check_view_guard(
    tensor_sizes: &[i64],
    view_sizes: &[i64],
    constraint: &ViewConstraint,
) -> bool {
    if constraint.tensor.len() != tensor_sizes.len() || constraint.view.len() != view_sizes.len() {
        trace!("view guard dimension count mismatch");
        return false;
    }

    let mut dynamic_sizes = VecDeque::new();

    let mut tensor_elements: i64 = 1;
    for (&size, &axis) in tensor_sizes.iter().zip(&constraint.tensor) {
        match axis {
            AxisConstraint::Dynamic => dynamic_sizes.push_back(size),
            AxisConstraint::Fixed(expected) if expected != size => {
                trace!(expected, size, "static tensor axis mismatch");
                return false;
            }
            AxisConstraint::Fixed(_) => {}
        }
        let Some(product) = tensor_elements.checked_mul(size) else {
            return false;
        };
        tensor_elements = product;
    }

    let mut view_elements: i64 = 1;
    for (&size, &axis) in view_sizes.iter().zip(&constraint.view) {
        let expected = match axis {
            AxisConstraint::Dynamic => match dynamic_sizes.pop_front() {
                Some(expected) => expected,
                None => {
                    trace!("dynamic view axis has no matching tensor axis");
                    return false;
                }
            },
            AxisConstraint::Fixed(expected) => expected,
        };
        if expected != size {
            trace!(expected, size, "view axis mismatch");
            return false;
        }
        let Some(product) = view_elements.checked_mul(size) else {
            return false;
        };
        view_elements = product;
    }

    tensor_elements == view_elements
}

/// Infers the requested view, then checks it. An infeasible view fails.
pub fn evaluate_view_guard(
    tensor_sizes: &[i64],
    requested_view: &[i64],
    constraint: &ViewConstraint,
) -> Result<bool, GuardError> {
    Ok(infer_view_shape(tensor_sizes, requested_view)?
        .is_some_and(|resolved| check_view_guard(tensor_sizes, &resolved, constraint)))
}

fn element_count(sizes: &[i64]) -> Option<i64> {
    sizes.iter().try_fold(1i64, |n, &size| n.checked_mul(size))
}
