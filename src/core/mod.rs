//! Core traits and types shared across attention pooling implementations.
//!
//! Implementations operate on rank-3 tensors with layout
//! `(batch, seq, feature)`. Key and value tensors must agree on their
//! sequence length; the pooled output always has shape
//! `(batch, n_queries, value_feature_dim)`.

pub mod config;
pub mod errors;

use candle_core::Tensor;

pub use config::{AdditiveAttentionConfig, DotProductAttentionConfig};
pub use errors::AttentionError;

/// Result of a pooling forward pass.
///
/// `weights` holds the post-mask, pre-dropout attention weights with shape
/// `(batch, n_queries, n_keys)`; rows sum to one over the valid key prefix.
#[derive(Debug, Clone)]
pub struct Pooled {
    /// Weighted sum over the value rows, `(batch, n_queries, value_dim)`.
    pub output: Tensor,
    /// Normalized attention weights, `(batch, n_queries, n_keys)`.
    pub weights: Tensor,
}

/// Unified interface for attention pooling implementations.
///
/// * `queries`, `keys`, and `values` are rank-3 `(batch, seq, feature)`.
/// * `valid_lens`, when present, is rank-1 `(batch,)` or rank-2
///   `(batch, n_queries)` and bounds the key prefix each row may attend to.
/// * `train` only affects dropout on the attention weights; inference
///   passes are deterministic.
pub trait AttentionPooling {
    /// Compute attention-weighted pooling over `values`.
    fn forward(
        &self,
        queries: &Tensor,
        keys: &Tensor,
        values: &Tensor,
        valid_lens: Option<&Tensor>,
        train: bool,
    ) -> Result<Pooled, AttentionError>;
}
