//! Row-major <-> chunk-major permutations.
//!
//! Raster sample `(y, x)` with `cy = y / c`, `iy = y % c`, `cx = x / c`,
//! `ix = x % c` is stored in a chunked buffer at
//! `((cy * chunks_x + cx) * c + iy) * c + ix`. [`to_tiled`] and [`to_raster`]
//! apply that permutation in opposite directions and are exact inverses.

use crate::error::{DemPyramidError, Result};
use crate::types::GridShape;

fn check_len(len: usize, chunk_size: usize, grid: GridShape) -> Result<()> {
    if chunk_size == 0 || len != grid.total_samples(chunk_size) {
        return Err(DemPyramidError::shape(
            len,
            format!(
                "{}x{} chunks of {}x{}",
                grid.chunks_y, grid.chunks_x, chunk_size, chunk_size
            ),
        ));
    }
    Ok(())
}

/// Rearrange a row-major raster into chunk-major order.
pub fn to_tiled(raster: &[f32], chunk_size: usize, grid: GridShape) -> Result<Vec<f32>> {
    check_len(raster.len(), chunk_size, grid)?;
    let width = grid.chunks_x * chunk_size;
    let mut tiled = Vec::with_capacity(raster.len());

    for cy in 0..grid.chunks_y {
        for cx in 0..grid.chunks_x {
            for iy in 0..chunk_size {
                let start = (cy * chunk_size + iy) * width + cx * chunk_size;
                tiled.extend_from_slice(&raster[start..start + chunk_size]);
            }
        }
    }

    Ok(tiled)
}

/// Rearrange a chunk-major buffer back into a row-major raster.
pub fn to_raster(tiled: &[f32], chunk_size: usize, grid: GridShape) -> Result<Vec<f32>> {
    check_len(tiled.len(), chunk_size, grid)?;
    let width = grid.chunks_x * chunk_size;
    let mut raster = vec![0.0f32; tiled.len()];

    for (chunk_idx, chunk) in tiled.chunks_exact(chunk_size * chunk_size).enumerate() {
        let cy = chunk_idx / grid.chunks_x;
        let cx = chunk_idx % grid.chunks_x;
        for (iy, row) in chunk.chunks_exact(chunk_size).enumerate() {
            let start = (cy * chunk_size + iy) * width + cx * chunk_size;
            raster[start..start + chunk_size].copy_from_slice(row);
        }
    }

    Ok(raster)
}
