use thiserror::Error;

use super::GuardKind;

/// Malformed guard input. These mean the compiled-path cache produced an
/// inconsistent artifact; they are never raised for ordinary mismatches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("{guard} guard: signature has no rank")]
    MissingRank { guard: GuardKind },
    #[error("{guard} guard: rank {rank} signature records {sizes} sizes, {strides} strides")]
    SignatureLength {
        guard: GuardKind,
        rank: usize,
        sizes: usize,
        strides: usize,
    },
    #[error("{guard} guard: stride position {position} is contiguous after an unknown index")]
    InconsistentStrideIndex { guard: GuardKind, position: usize },
    #[error("{guard} guard: stride index {index} is out of range for rank {rank}")]
    StrideIndexOutOfRange {
        guard: GuardKind,
        index: usize,
        rank: usize,
    },
    #[error("{guard} guard: only one view dimension can be inferred")]
    MultipleInferredDims { guard: GuardKind },
    #[error("{guard} guard: view dimension {dim} has non-positive size {size}")]
    NonPositiveViewDim {
        guard: GuardKind,
        dim: usize,
        size: i64,
    },
    #[error("{guard} guard: {argument} needs to be {expected}, found {found}")]
    UnexpectedValue {
        guard: GuardKind,
        argument: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{guard} guard: expected {expected} arguments, found {found}")]
    ArgumentCount {
        guard: GuardKind,
        expected: usize,
        found: usize,
    },
    #[error("{guard} guard: dimension {dim} is out of range for {rank} sizes")]
    DimOutOfRange {
        guard: GuardKind,
        dim: i64,
        rank: usize,
    },
}

impl GuardError {
    /// The guard that rejected its input.
    pub fn guard(&self) -> GuardKind {
        match self {
            Self::MissingRank { guard }
            | Self::SignatureLength { guard, .. }
            | Self::InconsistentStrideIndex { guard, .. }
            | Self::StrideIndexOutOfRange { guard, .. }
            | Self::MultipleInferredDims { guard }
            | Self::NonPositiveViewDim { guard, .. }
            | Self::UnexpectedValue { guard, .. }
            | Self::ArgumentCount { guard, .. }
            | Self::DimOutOfRange { guard, .. } => *guard,
        }
    }
}
