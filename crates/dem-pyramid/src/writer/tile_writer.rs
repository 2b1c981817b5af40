//! Chunk-major writer for raw DEM rasters.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TileWriterConfig;
use crate::error::{DemPyramidError, IoContext, Result};
use crate::io::{file_len, AtomicOutput};
use crate::types::{RasterDims, SAMPLE_BYTES};

/// What happened to one raw raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TileOutcome {
    /// The chunked file was written.
    Written { chunks: usize, bytes_written: u64 },
    /// The raster's size does not match the configured dimensions.
    Skipped { expected_bytes: u64, actual_bytes: u64 },
}

/// Writer that rewrites row-major rasters chunk by chunk.
pub struct TileWriter {
    config: TileWriterConfig,
}

impl TileWriter {
    /// Create a new TileWriter with the given configuration.
    pub fn new(config: TileWriterConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &TileWriterConfig {
        &self.config
    }

    /// Rewrite `raster_path` into chunk-major order at `dest_path`.
    ///
    /// A raster whose size does not match the configured dimensions is
    /// reported as [`TileOutcome::Skipped`] rather than as an error: that is
    /// a data-quality problem of one file, not of the batch. Dimensions that
    /// do not divide into whole chunks are a configuration error.
    ///
    /// The source stays memory-mapped; only one chunk is buffered at a time.
    /// The destination appears atomically once every chunk has been written.
    pub fn write_chunks(&self, raster_path: &Path, dest_path: &Path) -> Result<TileOutcome> {
        self.config.validate().map_err(DemPyramidError::Config)?;

        let dims = self.config.dims;
        let chunk_size = self.config.chunk_size;
        let expected_bytes = dims.byte_len();
        let actual_bytes = file_len(raster_path)?;
        if actual_bytes != expected_bytes {
            warn!(
                path = %raster_path.display(),
                expected_bytes,
                actual_bytes,
                "Unexpected raster size, skipping"
            );
            return Ok(TileOutcome::Skipped {
                expected_bytes,
                actual_bytes,
            });
        }

        let file = File::open(raster_path).with_path(raster_path)?;
        // SAFETY: the source raster is read-only input owned by the data
        // source and is not modified while the batch runs.
        let source = unsafe { Mmap::map(&file) }.with_path(raster_path)?;

        let (chunks_y, chunks_x) = self.config.chunk_counts();
        let total_chunks = chunks_y * chunks_x;
        info!(
            source = %raster_path.display(),
            dest = %dest_path.display(),
            width = dims.width,
            height = dims.height,
            chunks_x,
            chunks_y,
            total_chunks,
            "Writing chunked raster"
        );

        let bytes_written = copy_chunks(&source, dims, chunk_size, dest_path)?;

        info!(
            dest = %dest_path.display(),
            bytes_written,
            "Chunked raster written"
        );

        Ok(TileOutcome::Written {
            chunks: total_chunks,
            bytes_written,
        })
    }
}

/// Copy every chunk of a row-major byte view to `dest_path` in row-major tile order.
fn copy_chunks(
    source: &[u8],
    dims: RasterDims,
    chunk_size: usize,
    dest_path: &Path,
) -> Result<u64> {
    let chunks_y = dims.height / chunk_size;
    let chunks_x = dims.width / chunk_size;
    let row_bytes = dims.width * SAMPLE_BYTES;
    let chunk_row_bytes = chunk_size * SAMPLE_BYTES;

    let mut out = AtomicOutput::create(dest_path)?;
    let mut chunk = Vec::with_capacity(chunk_size * chunk_row_bytes);

    for cy in 0..chunks_y {
        for cx in 0..chunks_x {
            chunk.clear();
            for iy in 0..chunk_size {
                let start = (cy * chunk_size + iy) * row_bytes + cx * chunk_row_bytes;
                chunk.extend_from_slice(&source[start..start + chunk_row_bytes]);
            }
            out.write_all(&chunk)?;
        }
        debug!(
            dest = %dest_path.display(),
            progress_pct = (cy + 1) * 100 / chunks_y,
            "Chunk row written"
        );
    }

    out.commit()
}

/// Rewrite a `width` x `height` raster into `chunk_size` chunks.
///
/// Convenience wrapper around [`TileWriter::write_chunks`].
pub fn write_chunks(
    raster_path: &Path,
    dest_path: &Path,
    width: usize,
    height: usize,
    chunk_size: usize,
) -> Result<TileOutcome> {
    TileWriter::new(TileWriterConfig {
        dims: RasterDims::new(width, height),
        chunk_size,
    })
    .write_chunks(raster_path, dest_path)
}
