use anyhow::{Result, bail};
use burn::tensor::{Tensor, TensorData, backend::Backend};

/// Stack equally sized rows into a `[rows, width]` tensor
///
/// Used for both state batches and target batches. Every row must have
/// exactly `width` values; a mismatch means the rows come from a grid of a
/// different size.
pub fn batch_tensor<B: Backend>(
    rows: &[Vec<f32>],
    width: usize,
    device: &B::Device,
) -> Result<Tensor<B, 2>> {
    let mut data = Vec::with_capacity(rows.len() * width);

    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            bail!("row {} has length {}, expected {}", i, row.len(), width);
        }
        data.extend_from_slice(row);
    }

    let tensor_data = TensorData::new(data, [rows.len(), width]);

    Ok(Tensor::<B, 2>::from_data(tensor_data, device))
}

/// Split a flat `[rows * width]` buffer back into rows
pub fn split_rows(values: Vec<f32>, width: usize) -> Vec<Vec<f32>> {
    if width == 0 {
        return Vec::new();
    }
    values.chunks(width).map(<[f32]>::to_vec).collect()
}
