//! Chunk grid inference.
//!
//! A chunked file only tells us how many chunks it holds. Many grid shapes
//! share that count, so the aspect ratio of the tile's geographic span picks
//! the intended one.

use tracing::debug;

use crate::error::{DemPyramidError, Result};
use crate::types::{GeoSpan, GridShape};

/// Derive `(chunks_y, chunks_x)` from a sample count, chunk size and span.
///
/// `name` is only used to label errors.
pub fn resolve_grid(
    name: &str,
    total_samples: usize,
    chunk_size: usize,
    span: GeoSpan,
) -> Result<GridShape> {
    if chunk_size == 0 {
        return Err(DemPyramidError::grid(name, "chunk size is zero"));
    }
    let samples_per_chunk = chunk_size
        .checked_mul(chunk_size)
        .ok_or_else(|| DemPyramidError::grid(name, "chunk size squared overflows"))?;
    if total_samples % samples_per_chunk != 0 {
        return Err(DemPyramidError::grid(
            name,
            format!(
                "{} samples is not a multiple of {}x{} chunks",
                total_samples, chunk_size, chunk_size
            ),
        ));
    }
    let total_chunks = total_samples / samples_per_chunk;

    let estimate = (total_chunks as f64 * span.aspect_ratio()).sqrt();
    let chunks_x = if estimate.is_finite() {
        estimate.round_ties_even() as usize
    } else {
        0
    };
    if chunks_x == 0 {
        return Err(DemPyramidError::grid(
            name,
            format!("derived grid width is zero ({} chunks)", total_chunks),
        ));
    }
    if total_chunks % chunks_x != 0 {
        return Err(DemPyramidError::grid(
            name,
            format!(
                "{} chunks not divisible by inferred width {}",
                total_chunks, chunks_x
            ),
        ));
    }
    let chunks_y = total_chunks / chunks_x;
    if chunks_y == 0 || chunks_x * chunks_y != total_chunks {
        return Err(DemPyramidError::grid(
            name,
            format!(
                "grid {}x{} does not multiply back to {} chunks",
                chunks_y, chunks_x, total_chunks
            ),
        ));
    }

    debug!(
        file = name,
        chunk_size,
        total_chunks,
        chunks_y,
        chunks_x,
        "Resolved chunk grid"
    );

    Ok(GridShape::new(chunks_y, chunks_x))
}
