//! Scaled dot-product attention pooling.

use std::sync::{Mutex, OnceLock};

use candle_core::{Tensor, D};
use candle_nn::Dropout;

use crate::core::{AttentionError, AttentionPooling, DotProductAttentionConfig, Pooled};
use crate::softmax::masked_softmax;

/// Attention pooling scored by scaled query/key dot products.
///
/// Queries and keys must share their feature dimension `d`. The raw scores
/// `queries . keys^T` are multiplied by the configured scale, which defaults
/// to `1 / sqrt(d)` with `d` read from the query tensor at call time. There
/// are no learned parameters, which makes this cheaper per pooling call than
/// additive attention when the dimensions already line up.
#[derive(Debug)]
pub struct DotProductAttention {
    dropout: Dropout,
    config: DotProductAttentionConfig,
    last_weights: Mutex<Option<Tensor>>,
    first_call: OnceLock<()>,
}

impl DotProductAttention {
    pub fn new(config: DotProductAttentionConfig) -> Result<Self, AttentionError> {
        if let Some(p) = config.dropout_p {
            if !(0.0..1.0).contains(&p) {
                return Err(AttentionError::InvalidDropout { p });
            }
        }

        Ok(Self {
            dropout: Dropout::new(config.dropout_p.unwrap_or(0.0)),
            config,
            last_weights: Mutex::new(None),
            first_call: OnceLock::new(),
        })
    }

    /// Attention weights from the most recent forward pass, for inspection
    /// and visualization tooling.
    pub fn last_attention_weights(&self) -> Option<Tensor> {
        self.last_weights.lock().ok().and_then(|guard| guard.clone())
    }

    fn validate(
        &self,
        queries: &Tensor,
        keys: &Tensor,
        values: &Tensor,
    ) -> Result<usize, AttentionError> {
        let (qb, _nq, qd) = queries
            .dims3()
            .map_err(|_| AttentionError::shape("queries must be rank 3 (batch, n_queries, feature)"))?;
        let (kb, nk, kd) = keys
            .dims3()
            .map_err(|_| AttentionError::shape("keys must be rank 3 (batch, n_keys, feature)"))?;
        let (vb, nv, _vd) = values
            .dims3()
            .map_err(|_| AttentionError::shape("values must be rank 3 (batch, n_keys, feature)"))?;

        if kd != qd {
            return Err(AttentionError::InvalidShape {
                context: format!("dot-product scoring needs matching feature dims, queries {qd} vs keys {kd}"),
            });
        }
        if kb != qb || vb != qb {
            return Err(AttentionError::InvalidShape {
                context: format!("batch sizes disagree: queries {qb}, keys {kb}, values {vb}"),
            });
        }
        if nv != nk {
            return Err(AttentionError::InvalidShape {
                context: format!("values: expected {nk} rows to match keys, got {nv}"),
            });
        }

        Ok(qd)
    }
}

impl AttentionPooling for DotProductAttention {
    fn forward(
        &self,
        queries: &Tensor,
        keys: &Tensor,
        values: &Tensor,
        valid_lens: Option<&Tensor>,
        train: bool,
    ) -> Result<Pooled, AttentionError> {
        if self.first_call.set(()).is_ok() {
            log::info!(
                "pooling::dot_product init scale={:?} dropout_p={:?}",
                self.config.scale,
                self.config.dropout_p
            );
        }

        let feature_dim = self.validate(queries, keys, values)?;
        let scale = self
            .config
            .scale
            .unwrap_or_else(|| 1.0 / (feature_dim as f64).sqrt());

        let keys_t = keys.transpose(D::Minus2, D::Minus1)?;
        let scores = queries.matmul(&keys_t)?.affine(scale, 0.0)?;

        let weights = masked_softmax(&scores, valid_lens)?;
        if let Ok(mut guard) = self.last_weights.lock() {
            *guard = Some(weights.clone());
        }

        let combined = if train {
            self.dropout.forward(&weights, train)?
        } else {
            weights.clone()
        };
        let output = combined.matmul(values)?;

        Ok(Pooled { output, weights })
    }
}
