//! Guards deciding whether a cached specialized path may run.
//!
//! Every guard is a pure check over its call-local arguments. The only shared
//! state a guard reads is the runtime's guard-mode flag; when it is off,
//! guards report success unconditionally.

mod compliance;
mod error;
mod metrics;
mod shape_infer;
mod value;
mod view;

use std::fmt;

use serde::{Deserialize, Serialize};
use specguard_tensor::TensorSignature;
use tracing::trace;

pub use compliance::{complies, complies_with_grad_mode, signature_of};
pub use error::GuardError;
pub use metrics::{GuardMetrics, GuardMetricsSnapshot};
pub use shape_infer::{infer_squeeze_dim_size, infer_squeeze_size, infer_unsqueeze_size};
pub use value::{GuardValue, sizes_broadcast_equal, values_equal};
pub use view::{
    AxisConstraint, DYNAMIC_AXIS, ViewConstraint, check_view_guard, evaluate_view_guard,
    infer_view_shape,
};

use crate::runtime::fuser::FuserRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    Tensor,
    View,
    Value,
    SizeEq,
}

impl fmt::Display for GuardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tensor => "tensor",
            Self::View => "view",
            Self::Value => "value",
            Self::SizeEq => "size_eq",
        };
        f.write_str(name)
    }
}

/// One of the checks that may gate a cached path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// One signature per tensor argument, positionally.
    Tensor { signatures: Vec<TensorSignature> },
    /// Arguments: input sizes, requested view sizes.
    View { constraint: ViewConstraint },
    /// Arguments: captured value, reference value.
    Value,
    /// Arguments: input sizes (or `None`), reference sizes.
    SizeEq,
}

impl Guard {
    pub fn kind(&self) -> GuardKind {
        match self {
            Self::Tensor { .. } => GuardKind::Tensor,
            Self::View { .. } => GuardKind::View,
            Self::Value => GuardKind::Value,
            Self::SizeEq => GuardKind::SizeEq,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Tensor { signatures } => signatures.len(),
            Self::View { .. } | Self::Value | Self::SizeEq => 2,
        }
    }

    /// Evaluates the guard over its arguments, honouring the runtime's guard
    /// mode and recording the outcome in its metrics.
    pub fn check(&self, runtime: &FuserRuntime, args: &[&GuardValue]) -> Result<bool, GuardError> {
        let kind = self.kind();
        if args.len() != self.arity() {
            return Err(GuardError::ArgumentCount {
                guard: kind,
                expected: self.arity(),
                found: args.len(),
            });
        }
        match self {
            Self::Tensor { signatures } => {
                let args = args.iter().copied();
                gate(runtime, kind, || tensors_comply(signatures, args))
            }
            Self::View { constraint } => view_outcome(runtime, args[0], args[1], constraint),
            Self::Value => gate(runtime, kind, || Ok(values_equal(args[0], args[1]))),
            Self::SizeEq => gate(runtime, kind, || sizes_broadcast_equal(args[0], args[1])),
        }
    }

    /// [`Guard::check`] over an owned argument slice.
    pub fn evaluate(
        &self,
        runtime: &FuserRuntime,
        args: &[GuardValue],
    ) -> Result<bool, GuardError> {
        let args: Vec<&GuardValue> = args.iter().collect();
        self.check(runtime, &args)
    }
}

/// A guard together with the positions of its arguments in the call's
/// argument list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardBinding {
    pub guard: Guard,
    pub arguments: Vec<usize>,
}

impl GuardBinding {
    pub fn new(guard: Guard, arguments: Vec<usize>) -> Self {
        Self { guard, arguments }
    }
}

/// Result of evaluating a [`GuardChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    Pass,
    /// The guard at `index` in the chain failed.
    Fail { index: usize, guard: GuardKind },
}

impl GuardVerdict {
    pub fn passed(self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Ordered guards gating one cached path. Evaluation stops at the first
/// failing guard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardChain {
    bindings: Vec<GuardBinding>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_guard(mut self, guard: Guard, arguments: Vec<usize>) -> Self {
        self.push(guard, arguments);
        self
    }

    pub fn push(&mut self, guard: Guard, arguments: Vec<usize>) {
        self.bindings.push(GuardBinding::new(guard, arguments));
    }

    pub fn bindings(&self) -> &[GuardBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn evaluate(
        &self,
        runtime: &FuserRuntime,
        args: &[GuardValue],
    ) -> Result<GuardVerdict, GuardError> {
        for (index, binding) in self.bindings.iter().enumerate() {
            let kind = binding.guard.kind();
            let bound = binding
                .arguments
                .iter()
                .map(|&position| {
                    args.get(position).ok_or(GuardError::ArgumentCount {
                        guard: kind,
                        expected: position + 1,
                        found: args.len(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if !binding.guard.check(runtime, &bound)? {
                return Ok(GuardVerdict::Fail { index, guard: kind });
            }
        }
        Ok(GuardVerdict::Pass)
    }
}

/// Tensor guard over positional arguments: one signature per input.
pub fn fusion_guard(
    runtime: &FuserRuntime,
    signatures: &[TensorSignature],
    inputs: &[GuardValue],
) -> Result<bool, GuardError> {
    if signatures.len() != inputs.len() {
        return Err(GuardError::ArgumentCount {
            guard: GuardKind::Tensor,
            expected: signatures.len(),
            found: inputs.len(),
        });
    }
    gate(runtime, GuardKind::Tensor, || {
        tensors_comply(signatures, inputs)
    })
}

/// View guard over its four raw arguments: input sizes, requested view
/// sizes, recorded input constraint and recorded view constraint, the
/// constraints using [`DYNAMIC_AXIS`] for dynamic axes.
pub fn view_guard(runtime: &FuserRuntime, inputs: &[GuardValue]) -> Result<bool, GuardError> {
    let [tensor_sizes, view_sizes, tensor_constraint, view_constraint] = inputs else {
        return Err(GuardError::ArgumentCount {
            guard: GuardKind::View,
            expected: 4,
            found: inputs.len(),
        });
    };
    let tensor_constraint =
        tensor_constraint.expect_int_list(GuardKind::View, "tensor_constraint")?;
    let view_constraint =
        view_constraint.expect_int_list(GuardKind::View, "view_sizes_constraint")?;
    let constraint = ViewConstraint::from_raw(tensor_constraint, view_constraint);
    view_outcome(runtime, tensor_sizes, view_sizes, &constraint)
}

/// Equality guard over two captured values.
pub fn value_guard(runtime: &FuserRuntime, lhs: &GuardValue, rhs: &GuardValue) -> bool {
    if !runtime.guard_mode() {
        runtime.metrics().record_bypass();
        return true;
    }
    record(runtime, GuardKind::Value, values_equal(lhs, rhs))
}

/// Broadcast-pattern guard over input sizes and reference sizes.
pub fn size_eq_guard(
    runtime: &FuserRuntime,
    input: &GuardValue,
    reference: &GuardValue,
) -> Result<bool, GuardError> {
    gate(runtime, GuardKind::SizeEq, || {
        sizes_broadcast_equal(input, reference)
    })
}

fn tensors_comply<'a>(
    signatures: &[TensorSignature],
    args: impl IntoIterator<Item = &'a GuardValue>,
) -> Result<bool, GuardError> {
    for (signature, arg) in signatures.iter().zip(args) {
        let Some(tensor) = arg.as_tensor() else {
            return Err(GuardError::UnexpectedValue {
                guard: GuardKind::Tensor,
                argument: "input",
                expected: "a tensor",
                found: arg.type_name(),
            });
        };
        if !complies(signature, tensor)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn view_outcome(
    runtime: &FuserRuntime,
    tensor_sizes: &GuardValue,
    view_sizes: &GuardValue,
    constraint: &ViewConstraint,
) -> Result<bool, GuardError> {
    let tensor_sizes = tensor_sizes.expect_int_list(GuardKind::View, "tensor_sizes")?;
    let view_sizes = view_sizes.expect_int_list(GuardKind::View, "view_sizes")?;
    // Inference runs before the guard-mode check: an infeasible view fails
    // even with guards bypassed.
    let Some(resolved) = infer_view_shape(tensor_sizes, view_sizes)? else {
        return Ok(record(runtime, GuardKind::View, false));
    };
    gate(runtime, GuardKind::View, || {
        Ok(check_view_guard(tensor_sizes, &resolved, constraint))
    })
}

/// Runs `check` unless guard mode is off, and records the outcome.
fn gate(
    runtime: &FuserRuntime,
    kind: GuardKind,
    check: impl FnOnce() -> Result<bool, GuardError>,
) -> Result<bool, GuardError> {
    if !runtime.guard_mode() {
        runtime.metrics().record_bypass();
        return Ok(true);
    }
    Ok(record(runtime, kind, check()?))
}

fn record(runtime: &FuserRuntime, kind: GuardKind, passed: bool) -> bool {
    if passed {
        runtime.metrics().record_pass();
    } else {
        trace!(guard = %kind, "guard failed");
        runtime.metrics().record_failure();
    }
    passed
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::config::FuserConfig;
    use crate::runtime::fuser::{FuserEnabler, HostCapabilities};

    fn runtime() -> FuserRuntime {
        let enabler = FuserEnabler::with_env(
            Arc::new(HostCapabilities::available()),
            Arc::new(HashMap::<String, String>::new()),
        );
        FuserRuntime::with_config(enabler, FuserConfig::default())
    }

    #[test]
    fn arity_is_checked_before_evaluation() {
        let err = Guard::Value
            .evaluate(&runtime(), &[GuardValue::Int(1)])
            .unwrap_err();
        assert_eq!(
            err,
            GuardError::ArgumentCount {
                guard: GuardKind::Value,
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn empty_chain_passes() {
        assert_eq!(
            GuardChain::new().evaluate(&runtime(), &[]).unwrap(),
            GuardVerdict::Pass
        );
    }

    #[test]
    fn chain_serializes_with_guard_tags() {
        let chain = GuardChain::new().with_guard(Guard::SizeEq, vec![0, 1]);
        let json = serde_json::to_value(&chain).unwrap();
        assert_eq!(json["bindings"][0]["guard"], "size_eq");
        assert_eq!(json["bindings"][0]["arguments"], serde_json::json!([0, 1]));
    }

    #[test]
    fn errors_name_their_guard() {
        let err = infer_view_shape(&[4], &[-1, -1]).unwrap_err();
        assert_eq!(err.guard(), GuardKind::View);
        assert_eq!(GuardKind::SizeEq.to_string(), "size_eq");
    }
}
