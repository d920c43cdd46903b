use attention_pooling::{
    AdditiveAttention, AdditiveAttentionConfig, AttentionPooling, DotProductAttention,
    DotProductAttentionConfig, Pooled,
};
use candle_core::{DType, Device, Result, Tensor};
use candle_nn::{VarBuilder, VarMap};

fn implementations(device: &Device, feature_dim: usize) -> Vec<Box<dyn AttentionPooling>> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let additive = AdditiveAttention::new(
        AdditiveAttentionConfig::new(feature_dim, feature_dim, 8),
        vb,
    )
    .unwrap();
    let dot_product = DotProductAttention::new(DotProductAttentionConfig::default()).unwrap();
    vec![Box::new(additive), Box::new(dot_product)]
}

fn pool(
    attention: &dyn AttentionPooling,
    queries: &Tensor,
    keys: &Tensor,
    values: &Tensor,
    valid_lens: Option<&Tensor>,
) -> Pooled {
    attention
        .forward(queries, keys, values, valid_lens, false)
        .unwrap()
}

#[test]
fn implementations_swap_behind_the_trait() -> Result<()> {
    let device = Device::Cpu;
    let queries = Tensor::randn(0f32, 1.0, (2, 3, 4), &device)?;
    let keys = Tensor::randn(0f32, 1.0, (2, 5, 4), &device)?;
    let values = Tensor::randn(0f32, 1.0, (2, 5, 6), &device)?;
    let lens = Tensor::from_vec(vec![2u32, 4], (2,), &device)?;

    for attention in implementations(&device, 4) {
        let pooled = pool(attention.as_ref(), &queries, &keys, &values, Some(&lens));

        assert_eq!(pooled.output.dims(), &[2, 3, 6]);
        assert_eq!(pooled.weights.dims(), &[2, 3, 5]);

        let weights = pooled.weights.flatten_all()?.to_vec1::<f32>()?;
        for (row_idx, row) in weights.chunks(5).enumerate() {
            let valid = if row_idx < 3 { 2 } else { 4 };
            let sum: f32 = row[..valid].iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "row {row_idx} sums to {sum}");
            for &w in &row[valid..] {
                assert_eq!(w, 0.0, "row {row_idx} leaked mass past {valid}");
            }
        }
    }
    Ok(())
}

#[test]
fn per_query_lengths_are_honored_by_both_implementations() -> Result<()> {
    let device = Device::Cpu;
    let queries = Tensor::randn(0f32, 1.0, (1, 2, 4), &device)?;
    let keys = Tensor::randn(0f32, 1.0, (1, 4, 4), &device)?;
    let values = Tensor::randn(0f32, 1.0, (1, 4, 2), &device)?;
    let lens = Tensor::from_vec(vec![1u32, 3], (1, 2), &device)?;

    for attention in implementations(&device, 4) {
        let pooled = pool(attention.as_ref(), &queries, &keys, &values, Some(&lens));
        let weights = pooled.weights.flatten_all()?.to_vec1::<f32>()?;

        // First query row attends to a single key.
        assert!((weights[0] - 1.0).abs() < 1e-6);
        assert_eq!(&weights[1..4], &[0.0, 0.0, 0.0]);
        // Second query row keeps three keys.
        let sum: f32 = weights[4..7].iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(weights[7], 0.0);
    }
    Ok(())
}

#[test]
fn absent_lengths_use_every_key() -> Result<()> {
    let device = Device::Cpu;
    let queries = Tensor::randn(0f32, 1.0, (2, 2, 4), &device)?;
    let keys = Tensor::randn(0f32, 1.0, (2, 3, 4), &device)?;
    let values = Tensor::randn(0f32, 1.0, (2, 3, 2), &device)?;

    for attention in implementations(&device, 4) {
        let pooled = pool(attention.as_ref(), &queries, &keys, &values, None);
        let weights = pooled.weights.flatten_all()?.to_vec1::<f32>()?;
        for row in weights.chunks(3) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            assert!(row.iter().all(|&w| w > 0.0));
        }
    }
    Ok(())
}
