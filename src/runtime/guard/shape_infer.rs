//! Output-size inference for the squeeze/unsqueeze views a compiled path
//! may contain. Guards use these to derive the sizes a view will produce.

use super::{GuardError, GuardKind};

const GUARD: GuardKind = GuardKind::View;

/// Inserts a size-1 axis at `dim`. Negative `dim` counts from the end of the
/// output, so `-1` appends.
pub fn infer_unsqueeze_size(sizes: &[i64], dim: i64) -> Result<Vec<i64>, GuardError> {
    let index = wrap_dim(dim, sizes.len() + 1)?;
    let mut result = Vec::with_capacity(sizes.len() + 1);
    result.extend_from_slice(&sizes[..index]);
    result.push(1);
    result.extend_from_slice(&sizes[index..]);
    Ok(result)
}

/// Drops every size-1 axis.
pub fn infer_squeeze_size(sizes: &[i64]) -> Vec<i64> {
    sizes.iter().copied().filter(|&size| size != 1).collect()
}

/// Drops axis `dim` if it has size 1, otherwise returns the sizes unchanged.
pub fn infer_squeeze_dim_size(sizes: &[i64], dim: i64) -> Result<Vec<i64>, GuardError> {
    let index = wrap_dim(dim, sizes.len())?;
    let mut result = sizes.to_vec();
    if result[index] == 1 {
        result.remove(index);
    }
    Ok(result)
}

fn wrap_dim(dim: i64, len: usize) -> Result<usize, GuardError> {
    let out_of_range = || GuardError::DimOutOfRange {
        guard: GUARD,
        dim,
        rank: len,
    };
    let len_i64 = i64::try_from(len).map_err(|_| out_of_range())?;
    let wrapped = if dim < 0 { dim + len_i64 } else { dim };
    if (0..len_i64).contains(&wrapped) {
        usize::try_from(wrapped).map_err(|_| out_of_range())
    } else {
        Err(out_of_range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsqueeze_inserts_unit_axis() {
        assert_eq!(infer_unsqueeze_size(&[2, 3], 0).unwrap(), vec![1, 2, 3]);
        assert_eq!(infer_unsqueeze_size(&[2, 3], 2).unwrap(), vec![2, 3, 1]);
        assert_eq!(infer_unsqueeze_size(&[2, 3], -1).unwrap(), vec![2, 3, 1]);
        assert_eq!(infer_unsqueeze_size(&[2, 3], -3).unwrap(), vec![1, 2, 3]);
        assert_eq!(infer_unsqueeze_size(&[], 0).unwrap(), vec![1]);
    }

    #[test]
    fn unsqueeze_rejects_out_of_range() {
        assert!(infer_unsqueeze_size(&[2, 3], 3).is_err());
        assert!(infer_unsqueeze_size(&[2, 3], -4).is_err());
    }

    #[test]
    fn squeeze_drops_all_unit_axes() {
        assert_eq!(infer_squeeze_size(&[1, 2, 1, 1, 3, 1]), vec![2, 3]);
        assert_eq!(infer_squeeze_size(&[1, 1]), Vec::<i64>::new());
    }

    #[test]
    fn squeeze_dim_only_drops_unit_axis() {
        assert_eq!(infer_squeeze_dim_size(&[2, 1, 3], 1).unwrap(), vec![2, 3]);
        assert_eq!(infer_squeeze_dim_size(&[2, 1, 3], -2).unwrap(), vec![2, 3]);
        assert_eq!(infer_squeeze_dim_size(&[4, 1], 0).unwrap(), vec![4, 1]);
        let err = infer_squeeze_dim_size(&[2, 1, 3], 3).unwrap_err();
        assert_eq!(
            err,
            GuardError::DimOutOfRange {
                guard: GuardKind::View,
                dim: 3,
                rank: 3
            }
        );
    }
}
