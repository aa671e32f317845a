use proptest::prelude::*;
use specguard::runtime::guard::{
    ViewConstraint, check_view_guard, complies, evaluate_view_guard, signature_of,
};
use specguard::tensor::{Device, RuntimeTensor, ScalarType, TensorSignature};

fn tensor(sizes: Vec<i64>, strides: Vec<i64>) -> RuntimeTensor {
    RuntimeTensor::with_strides(sizes, strides, ScalarType::Float, Device::Cuda(0))
        .expect("generated sizes are non-negative")
}

/// Sizes in `0..=4` paired with strides in `-3..=8`, up to rank 4.
fn layout() -> impl Strategy<Value = (Vec<i64>, Vec<i64>)> {
    prop::collection::vec((0i64..=4, -3i64..=8), 0..=4).prop_map(|dims| dims.into_iter().unzip())
}

fn marked(sizes: &[i64], dynamic: &[bool]) -> Vec<i64> {
    sizes
        .iter()
        .zip(dynamic)
        .map(|(&size, &dynamic)| if dynamic { -1 } else { size })
        .collect()
}

fn product(sizes: &[i64]) -> i64 {
    sizes.iter().product()
}

proptest! {
    #[test]
    fn every_layout_complies_with_its_own_signature(
        (sizes, strides) in layout(),
        requires_grad in any::<bool>(),
    ) {
        let t = tensor(sizes, strides).with_requires_grad(requires_grad);
        prop_assert_eq!(complies(&signature_of(&t), &t), Ok(true));
    }

    #[test]
    fn unconstrained_signature_accepts_any_layout_of_its_rank((sizes, strides) in layout()) {
        let t = tensor(sizes, strides);
        let exact = TensorSignature::unconstrained(t.ndim());
        let wider = TensorSignature::unconstrained(t.ndim() + 1);
        prop_assert_eq!(complies(&exact, &t), Ok(true));
        prop_assert_eq!(complies(&wider, &t), Ok(false));
    }

    #[test]
    fn recorded_sizes_gate_broadcast_and_empty_axes(
        dims in prop::collection::vec((0i64..=3, prop::option::of(0i64..=3)), 1..=4),
    ) {
        let (sizes, recorded): (Vec<i64>, Vec<Option<i64>>) = dims.into_iter().unzip();
        let expected = sizes.iter().zip(&recorded).all(|(&size, recorded)| match recorded {
            Some(recorded) => (*recorded == 1) == (size == 1) && (*recorded == 0) == (size == 0),
            None => true,
        });
        let signature = TensorSignature::unconstrained(sizes.len()).with_sizes(recorded);
        let t = RuntimeTensor::contiguous(sizes, ScalarType::Float, Device::Cuda(0))
            .expect("generated sizes are non-negative");
        prop_assert_eq!(complies(&signature, &t), Ok(expected));
    }

    #[test]
    fn accepted_views_preserve_element_count(
        tensor_sizes in prop::collection::vec(1i64..=6, 1..=4),
        view_sizes in prop::collection::vec(1i64..=6, 1..=4),
        tensor_dynamic in prop::collection::vec(any::<bool>(), 4),
        view_dynamic in prop::collection::vec(any::<bool>(), 4),
    ) {
        let constraint = ViewConstraint::from_raw(
            &marked(&tensor_sizes, &tensor_dynamic),
            &marked(&view_sizes, &view_dynamic),
        );
        if check_view_guard(&tensor_sizes, &view_sizes, &constraint) {
            prop_assert_eq!(product(&tensor_sizes), product(&view_sizes));
        }
    }

    #[test]
    fn mismatched_element_count_is_always_rejected(
        tensor_sizes in prop::collection::vec(1i64..=6, 1..=4),
        view_sizes in prop::collection::vec(1i64..=6, 1..=4),
        tensor_dynamic in prop::collection::vec(any::<bool>(), 4),
        view_dynamic in prop::collection::vec(any::<bool>(), 4),
    ) {
        prop_assume!(product(&tensor_sizes) != product(&view_sizes));
        let constraint = ViewConstraint::from_raw(
            &marked(&tensor_sizes, &tensor_dynamic),
            &marked(&view_sizes, &view_dynamic),
        );
        prop_assert!(!check_view_guard(&tensor_sizes, &view_sizes, &constraint));
    }

    #[test]
    fn recorded_reshape_accepts_its_own_inferred_view(
        tensor_sizes in prop::collection::vec(1i64..=6, 1..=4),
        inferred in any::<prop::sample::Index>(),
    ) {
        let view_sizes: Vec<i64> = tensor_sizes.iter().rev().copied().collect();
        let constraint = ViewConstraint::from_raw(&tensor_sizes, &view_sizes);
        let mut requested = view_sizes.clone();
        let slot = inferred.index(requested.len());
        requested[slot] = -1;
        prop_assert!(check_view_guard(&tensor_sizes, &view_sizes, &constraint));
        let outcome = evaluate_view_guard(&tensor_sizes, &requested, &constraint);
        prop_assert_eq!(outcome, Ok(true));
    }
}
