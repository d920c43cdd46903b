//! Masking utilities shared by the pooling implementations.
//!
//! Masking here is value substitution, not additive biasing: positions past
//! a row's valid length are overwritten with [`MASK_FILL`] before the
//! softmax. The sentinel is finite so that a fully masked row still yields
//! a well-defined (uniform) softmax instead of NaN.

use candle_core::{DType, Tensor};

use crate::core::AttentionError;

/// Sentinel written over positions past the valid length.
///
/// Large enough that surviving positions dominate after exponentiation,
/// finite so an all-masked row stays numerically well-defined.
pub const MASK_FILL: f32 = -1e6;

/// Replace positions at column index >= the row's valid length with `fill`.
///
/// `x` must be rank-2 `(rows, cols)` and `valid_lens` must supply one length
/// per row. Lengths beyond the column count are clamped.
pub fn sequence_mask(x: &Tensor, valid_lens: &[usize], fill: f32) -> Result<Tensor, AttentionError> {
    let (rows, cols) = x
        .dims2()
        .map_err(|_| AttentionError::shape("sequence_mask input must be rank 2 (rows, cols)"))?;
    if valid_lens.len() != rows {
        return Err(AttentionError::InvalidShape {
            context: format!(
                "sequence_mask lengths: expected {rows} entries, got {}",
                valid_lens.len()
            ),
        });
    }

    let mut keep = vec![0u8; rows * cols];
    for (row, &valid) in valid_lens.iter().enumerate() {
        let valid = valid.min(cols);
        for col in 0..valid {
            keep[row * cols + col] = 1;
        }
    }

    let keep = Tensor::from_vec(keep, (rows, cols), x.device())?;
    let filled = Tensor::full(fill, (rows, cols), x.device())?.to_dtype(x.dtype())?;
    Ok(keep.where_cond(x, &filled)?)
}

/// Decode a rank-1 or rank-2 valid-length tensor into one clamped host-side
/// length per flattened `(batch * queries)` row.
///
/// Rank-1 entries apply to every query row of their batch element; rank-2
/// entries are used per query row. Any other rank is rejected.
pub fn valid_lens_to_rows(
    valid_lens: &Tensor,
    batch: usize,
    queries: usize,
    keys: usize,
) -> Result<Vec<usize>, AttentionError> {
    let host = valid_lens
        .to_dtype(DType::F32)?
        .flatten_all()?
        .to_vec1::<f32>()?;
    let clamp = |len: f32| (len.max(0.0) as usize).min(keys);

    match valid_lens.dims() {
        [n] => {
            if *n != batch {
                return Err(AttentionError::InvalidShape {
                    context: format!("rank-1 valid lengths: expected {batch} entries, got {n}"),
                });
            }
            let mut rows = Vec::with_capacity(batch * queries);
            for &len in &host {
                let len = clamp(len);
                rows.extend(std::iter::repeat(len).take(queries));
            }
            Ok(rows)
        }
        [b, q] => {
            if *b != batch || *q != queries {
                return Err(AttentionError::InvalidShape {
                    context: format!(
                        "rank-2 valid lengths: expected ({batch}, {queries}), got ({b}, {q})"
                    ),
                });
            }
            Ok(host.into_iter().map(clamp).collect())
        }
        dims => Err(AttentionError::InvalidValidLens { rank: dims.len() }),
    }
}
