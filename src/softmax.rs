//! Softmax restricted to a valid prefix of key positions per row.

use candle_core::Tensor;
use candle_nn::ops::softmax_last_dim;

use crate::core::AttentionError;
use crate::masks::{sequence_mask, valid_lens_to_rows, MASK_FILL};

/// Softmax over the key axis, with probability mass restricted to each
/// row's valid key prefix.
///
/// `scores` must be rank-3 `(batch, queries, keys)`. When `valid_lens` is
/// absent the result is the plain softmax over the last axis. Otherwise the
/// scores are flattened to `(batch * queries, keys)` rows, positions past
/// each row's valid length are overwritten with [`MASK_FILL`], and the
/// softmax runs over the masked rows before reshaping back.
///
/// A valid length of zero masks the entire row; the result is the
/// degenerate softmax over sentinel values (a uniform row), not NaN.
pub fn masked_softmax(
    scores: &Tensor,
    valid_lens: Option<&Tensor>,
) -> Result<Tensor, AttentionError> {
    let (batch, queries, keys) = scores
        .dims3()
        .map_err(|_| AttentionError::shape("scores must be rank 3 (batch, queries, keys)"))?;

    let Some(valid_lens) = valid_lens else {
        return Ok(softmax_last_dim(scores)?);
    };

    let rows = valid_lens_to_rows(valid_lens, batch, queries, keys)?;
    let flat = scores.reshape((batch * queries, keys))?;
    let masked = sequence_mask(&flat, &rows, MASK_FILL)?;
    let probs = softmax_last_dim(&masked)?;
    Ok(probs.reshape((batch, queries, keys))?)
}
