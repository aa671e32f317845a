/// Walks a tensor's dimensions from fastest to slowest stride, tracking the
/// innermost dimension that later dimensions are compared against.
///
/// Size-1 dimensions never replace an existing reference since they are
/// always collapsible, and zero-stride dimensions never become the reference
/// at all because their position in the order is ambiguous under
/// broadcasting.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrideWalk {
    inner: Option<usize>,
}

impl StrideWalk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `dim` is at least as slow as the reference dimension.
    pub fn order_holds(&self, strides: &[i64], dim: usize) -> bool {
        let Some(inner) = self.inner else {
            return true;
        };
        let (stride, inner_stride) = (strides[dim], strides[inner]);
        stride == 0 || inner_stride == 0 || stride >= inner_stride
    }

    /// Whether `dim`, sitting at `position` in stride order, can be collapsed
    /// with the dimensions inside it.
    pub fn contiguous_at(
        &self,
        position: usize,
        sizes: &[i64],
        strides: &[i64],
        dim: usize,
    ) -> bool {
        if sizes[dim] == 1 || strides[dim] == 1 {
            return true;
        }
        if position == 0 {
            return false;
        }
        match self.inner {
            Some(inner) => strides[inner]
                .checked_mul(sizes[inner])
                .is_some_and(|expected| expected == strides[dim]),
            None => false,
        }
    }

    pub fn advance(&mut self, sizes: &[i64], strides: &[i64], dim: usize) {
        if strides[dim] != 0 && (self.inner.is_none() || sizes[dim] != 1) {
            self.inner = Some(dim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_one_dimension_does_not_replace_reference() {
        let sizes = [4, 1, 3];
        let strides = [3, 3, 1];
        let mut walk = StrideWalk::new();
        walk.advance(&sizes, &strides, 2);
        walk.advance(&sizes, &strides, 1);
        assert_eq!(walk.inner, Some(2));
        assert!(walk.contiguous_at(2, &sizes, &strides, 0));
    }

    #[test]
    fn zero_stride_dimension_is_skipped() {
        let sizes = [5, 3];
        let strides = [0, 1];
        let mut walk = StrideWalk::new();
        walk.advance(&sizes, &strides, 0);
        assert_eq!(walk.inner, None);
        walk.advance(&sizes, &strides, 1);
        assert_eq!(walk.inner, Some(1));
        assert!(walk.order_holds(&strides, 0));
    }

    #[test]
    fn transposed_strides_break_order() {
        let strides = [1, 4];
        let mut walk = StrideWalk::new();
        walk.advance(&[4, 3], &strides, 1);
        assert!(!walk.order_holds(&strides, 0));
    }
}
