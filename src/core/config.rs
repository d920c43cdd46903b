//! Configuration options for the pooling implementations.
//!
//! Dropout is expressed as `Option<f32>`; `None` disables it entirely and
//! keeps the computation deterministic regardless of the training flag.

/// Configuration for [`AdditiveAttention`](crate::pooling::AdditiveAttention).
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveAttentionConfig {
    /// Feature dimension of incoming queries.
    pub query_dim: usize,
    /// Feature dimension of incoming keys.
    pub key_dim: usize,
    /// Shared hidden dimension both projections map into.
    pub hidden_dim: usize,
    /// Probability for dropout applied to attention weights during training.
    pub dropout_p: Option<f32>,
}

impl AdditiveAttentionConfig {
    /// Creates a configuration with dropout disabled.
    pub fn new(query_dim: usize, key_dim: usize, hidden_dim: usize) -> Self {
        Self {
            query_dim,
            key_dim,
            hidden_dim,
            dropout_p: None,
        }
    }

    /// Enables dropout with the supplied probability.
    pub fn with_dropout(mut self, p: f32) -> Self {
        self.dropout_p = Some(p);
        self
    }
}

/// Configuration for [`DotProductAttention`](crate::pooling::DotProductAttention).
#[derive(Debug, Clone, PartialEq)]
pub struct DotProductAttentionConfig {
    /// Multiplier applied to the raw scores.
    ///
    /// `None` selects `1 / sqrt(query feature dim)`, derived from the query
    /// tensor on each call.
    pub scale: Option<f64>,
    /// Probability for dropout applied to attention weights during training.
    pub dropout_p: Option<f32>,
}

impl Default for DotProductAttentionConfig {
    fn default() -> Self {
        Self {
            scale: None,
            dropout_p: None,
        }
    }
}

impl DotProductAttentionConfig {
    /// Overrides the default `1/sqrt(d)` scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Enables dropout with the supplied probability.
    pub fn with_dropout(mut self, p: f32) -> Self {
        self.dropout_p = Some(p);
        self
    }
}
