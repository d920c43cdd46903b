//! Attention pooling primitives built on Candle.
//!
//! The crate implements the two classic attention scoring functions over
//! tensors with layout `(batch, seq, feature)`: additive attention, which
//! projects queries and keys into a shared hidden space, and scaled
//! dot-product attention, which requires queries and keys to share a feature
//! dimension. Both reduce to the same pooling step, a softmax-weighted sum
//! over the value rows, and both accept per-batch (or per-query) valid key
//! lengths so that padded positions receive zero probability mass.
//!
//! Masking is performed before the softmax by filling positions past each
//! row's valid length with the finite sentinel [`masks::MASK_FILL`]. A row
//! whose valid length is zero therefore degrades to a uniform softmax over
//! sentinel values rather than NaN.
//!
//! Dropout on the attention weights is a train-only concern: the training
//! flag is passed explicitly on every forward call, and inference passes are
//! deterministic.

pub mod core;
pub mod masks;
pub mod pooling;
pub mod softmax;

pub use self::core::{
    AdditiveAttentionConfig, AttentionError, AttentionPooling, DotProductAttentionConfig, Pooled,
};
pub use pooling::{AdditiveAttention, DotProductAttention};
pub use softmax::masked_softmax;
