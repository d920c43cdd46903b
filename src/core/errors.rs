//! Error types emitted by the pooling implementations.

use thiserror::Error;

/// Attention-specific error category.
///
/// Shape mismatches are the only caller-facing failure mode; tensor backend
/// failures pass through transparently.
#[derive(Debug, Error)]
pub enum AttentionError {
    /// The supplied tensor shapes do not align with the documented contract.
    #[error("invalid tensor shape for {context}")]
    InvalidShape { context: String },

    /// Valid-length tensors must be rank 1 (per batch) or rank 2 (per query).
    #[error("valid lengths must have rank 1 or 2, got rank {rank}")]
    InvalidValidLens { rank: usize },

    /// Dropout probabilities live in `[0, 1)`.
    #[error("dropout probability must be in [0, 1), got {p}")]
    InvalidDropout { p: f32 },

    /// A non-tensor internal failure propagated to the caller.
    #[error("{message}")]
    Backend { message: String },

    /// A tensor operation failed inside the backend.
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

impl AttentionError {
    pub(crate) fn shape(context: impl Into<String>) -> Self {
        Self::InvalidShape {
            context: context.into(),
        }
    }
}
