use serde::{Deserialize, Serialize};
use specguard_tensor::RuntimeTensor;

use super::{GuardError, GuardKind};

/// Opaque runtime value passed to a guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardValue {
    None,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    IntList(Vec<i64>),
    List(Vec<GuardValue>),
    Tensor(RuntimeTensor),
}

impl GuardValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "float",
            Self::Str(_) => "str",
            Self::IntList(_) => "int[]",
            Self::List(_) => "list",
            Self::Tensor(_) => "Tensor",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            Self::IntList(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&RuntimeTensor> {
        match self {
            Self::Tensor(tensor) => Some(tensor),
            _ => None,
        }
    }

    /// Borrows an int list argument, or reports which argument of which
    /// guard was malformed.
    pub(crate) fn expect_int_list(
        &self,
        guard: GuardKind,
        argument: &'static str,
    ) -> Result<&[i64], GuardError> {
        let Some(values) = self.as_int_list() else {
            return Err(GuardError::UnexpectedValue {
                guard,
                argument,
                expected: "an int list",
                found: self.type_name(),
            });
        };
        Ok(values)
    }
}

impl From<Vec<i64>> for GuardValue {
    fn from(values: Vec<i64>) -> Self {
        Self::IntList(values)
    }
}

impl From<RuntimeTensor> for GuardValue {
    fn from(tensor: RuntimeTensor) -> Self {
        Self::Tensor(tensor)
    }
}

impl From<i64> for GuardValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Structural equality of two captured values. No tolerance, no
/// broadcasting; `NaN` never equals itself.
pub fn values_equal(lhs: &GuardValue, rhs: &GuardValue) -> bool {
    lhs == rhs
}

/// Compares the broadcast pattern of `input` sizes against `reference`.
///
/// An empty reference only accepts `None`. Otherwise `input` must be an int
/// list of the same length whose size-1 axes line up with the reference's.
pub fn sizes_broadcast_equal(
    input: &GuardValue,
    reference: &GuardValue,
) -> Result<bool, GuardError> {
    let reference = reference.expect_int_list(GuardKind::SizeEq, "reference")?;
    if reference.is_empty() {
        return Ok(input.is_none());
    }
    let Some(input) = input.as_int_list() else {
        return Ok(false);
    };
    if input.len() != reference.len() {
        return Ok(false);
    }
    Ok(input
        .iter()
        .zip(reference)
        .all(|(&size, &expected)| (size == 1) == (expected == 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(values: &[i64]) -> GuardValue {
        GuardValue::IntList(values.to_vec())
    }

    #[test]
    fn equality_is_structural() {
        let a = GuardValue::List(vec![GuardValue::Int(1), GuardValue::IntList(vec![2, 3])]);
        let b = GuardValue::List(vec![GuardValue::Int(1), GuardValue::IntList(vec![2, 3])]);
        let c = GuardValue::List(vec![GuardValue::Int(1), GuardValue::IntList(vec![3, 2])]);
        assert!(values_equal(&a, &b));
        assert!(!values_equal(&a, &c));
    }

    #[test]
    fn equality_has_no_numeric_tolerance() {
        let sum = GuardValue::Double(0.1 + 0.2);
        let nan = GuardValue::Double(f64::NAN);
        assert!(!values_equal(&sum, &GuardValue::Double(0.3)));
        assert!(!values_equal(&GuardValue::Int(1), &GuardValue::Double(1.0)));
        assert!(!values_equal(&nan, &nan));
    }

    #[test]
    fn size_eq_compares_broadcast_pattern() {
        let reference = GuardValue::IntList(vec![1, 4, 5]);
        assert!(sizes_broadcast_equal(&sizes(&[1, 8, 2]), &reference).unwrap());
        assert!(!sizes_broadcast_equal(&sizes(&[3, 4, 5]), &reference).unwrap());
        assert!(!sizes_broadcast_equal(&sizes(&[1, 4]), &reference).unwrap());
        assert!(!sizes_broadcast_equal(&GuardValue::None, &reference).unwrap());
    }

    #[test]
    fn size_eq_empty_reference_expects_none() {
        let reference = GuardValue::IntList(Vec::new());
        assert!(sizes_broadcast_equal(&GuardValue::None, &reference).unwrap());
        assert!(!sizes_broadcast_equal(&sizes(&[2]), &reference).unwrap());
    }

    #[test]
    fn size_eq_reference_must_be_int_list() {
        let err = sizes_broadcast_equal(&sizes(&[1]), &GuardValue::Int(1)).unwrap_err();
        assert_eq!(
            err,
            GuardError::UnexpectedValue {
                guard: GuardKind::SizeEq,
                argument: "reference",
                expected: "an int list",
                found: "int",
            }
        );
    }
}
