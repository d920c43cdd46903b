//! Additive (MLP) attention pooling.

use std::sync::{Mutex, OnceLock};

use candle_core::{Tensor, D};
use candle_nn::{Dropout, Linear, Module, VarBuilder};

use crate::core::{AdditiveAttentionConfig, AttentionError, AttentionPooling, Pooled};
use crate::softmax::masked_softmax;

/// Attention pooling with a learned additive scoring function.
///
/// Queries and keys may have different feature dimensionality; both are
/// projected (bias-free) into a shared hidden space, summed with
/// broadcasting, squashed through `tanh`, and reduced to a scalar score per
/// query/key pair by a third projection.
#[derive(Debug)]
pub struct AdditiveAttention {
    w_q: Linear,
    w_k: Linear,
    w_v: Linear,
    dropout: Dropout,
    config: AdditiveAttentionConfig,
    last_weights: Mutex<Option<Tensor>>,
    first_call: OnceLock<()>,
}

impl AdditiveAttention {
    /// Construct the scoring projections under `vb`.
    pub fn new(config: AdditiveAttentionConfig, vb: VarBuilder) -> Result<Self, AttentionError> {
        if let Some(p) = config.dropout_p {
            if !(0.0..1.0).contains(&p) {
                return Err(AttentionError::InvalidDropout { p });
            }
        }

        let w_q = candle_nn::linear_no_bias(config.query_dim, config.hidden_dim, vb.pp("w_q"))?;
        let w_k = candle_nn::linear_no_bias(config.key_dim, config.hidden_dim, vb.pp("w_k"))?;
        let w_v = candle_nn::linear_no_bias(config.hidden_dim, 1, vb.pp("w_v"))?;
        let dropout = Dropout::new(config.dropout_p.unwrap_or(0.0));

        Ok(Self {
            w_q,
            w_k,
            w_v,
            dropout,
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
    ) -> Result<(), AttentionError> {
        let (qb, _nq, qd) = queries
            .dims3()
            .map_err(|_| AttentionError::shape("queries must be rank 3 (batch, n_queries, feature)"))?;
        let (kb, nk, kd) = keys
            .dims3()
            .map_err(|_| AttentionError::shape("keys must be rank 3 (batch, n_keys, feature)"))?;
        let (vb, nv, _vd) = values
            .dims3()
            .map_err(|_| AttentionError::shape("values must be rank 3 (batch, n_keys, feature)"))?;

        if qd != self.config.query_dim {
            return Err(AttentionError::InvalidShape {
                context: format!(
                    "queries: expected feature dim {}, got {qd}",
                    self.config.query_dim
                ),
            });
        }
        if kd != self.config.key_dim {
            return Err(AttentionError::InvalidShape {
                context: format!("keys: expected feature dim {}, got {kd}", self.config.key_dim),
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

        Ok(())
    }
}

impl AttentionPooling for AdditiveAttention {
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
                "pooling::additive init query_dim={} key_dim={} hidden_dim={} dropout_p={:?}",
                self.config.query_dim,
                self.config.key_dim,
                self.config.hidden_dim,
                self.config.dropout_p
            );
        }

        self.validate(queries, keys, values)?;

        let q_proj = self.w_q.forward(queries)?;
        let k_proj = self.w_k.forward(keys)?;

        // (batch, nq, 1, h) + (batch, 1, nk, h) -> (batch, nq, nk, h)
        let features = q_proj
            .unsqueeze(2)?
            .broadcast_add(&k_proj.unsqueeze(1)?)?
            .tanh()?;
        let scores = self.w_v.forward(&features)?.squeeze(D::Minus1)?;

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
