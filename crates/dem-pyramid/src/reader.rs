//! Memory-mapped access to chunk-major files.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::error::{DemPyramidError, IoContext, Result};
use crate::grid::resolve_grid;
use crate::io::{decode_le, decode_le_into};
use crate::naming;
use crate::types::{ChunkedFileMeta, GridShape, Raster, SAMPLE_BYTES};

/// Read-only view of a chunked file.
///
/// Chunk size and grid shape are recovered from the file name and length
/// when the file is opened.
pub struct ChunkedReader {
    meta: ChunkedFileMeta,
    grid: GridShape,
    mmap: Mmap,
}

impl ChunkedReader {
    /// Open a chunked file, parsing its name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_meta(ChunkedFileMeta::from_path(path)?)
    }

    /// Open a chunked file whose metadata has already been parsed.
    pub fn with_meta(meta: ChunkedFileMeta) -> Result<Self> {
        let path = meta.path.as_path();
        let file = File::open(path).with_path(path)?;
        let len = file.metadata().with_path(path)?.len();
        if len % SAMPLE_BYTES as u64 != 0 {
            return Err(DemPyramidError::misaligned(
                path,
                len,
                "length is not a whole number of f32 samples",
            ));
        }

        let name = naming::file_name(path)?;
        let total_samples = (len / SAMPLE_BYTES as u64) as usize;
        let grid = resolve_grid(name, total_samples, meta.chunk_size, meta.span)?;

        // SAFETY: the file is opened read-only and chunked files are never
        // modified in place; outputs are replaced by rename.
        let mmap = unsafe { Mmap::map(&file) }.with_path(path)?;

        debug!(
            path = %path.display(),
            chunk_size = meta.chunk_size,
            chunks_y = grid.chunks_y,
            chunks_x = grid.chunks_x,
            "Opened chunked file"
        );

        Ok(Self { meta, grid, mmap })
    }

    /// Parsed file metadata.
    pub fn meta(&self) -> &ChunkedFileMeta {
        &self.meta
    }

    /// Chunk size of this file.
    pub fn chunk_size(&self) -> usize {
        self.meta.chunk_size
    }

    /// Resolved tile grid.
    pub fn grid(&self) -> GridShape {
        self.grid
    }

    /// Read the chunk at tile row `cy`, tile column `cx` as row-major samples.
    pub fn read_chunk(&self, cy: usize, cx: usize) -> Result<Vec<f32>> {
        if cy >= self.grid.chunks_y || cx >= self.grid.chunks_x {
            return Err(DemPyramidError::ChunkOutOfBounds {
                path: self.meta.path.clone(),
                cy,
                cx,
                chunks_y: self.grid.chunks_y,
                chunks_x: self.grid.chunks_x,
            });
        }
        let chunk_bytes = self.meta.chunk_size * self.meta.chunk_size * SAMPLE_BYTES;
        let start = (cy * self.grid.chunks_x + cx) * chunk_bytes;
        Ok(decode_le(&self.mmap[start..start + chunk_bytes]))
    }

    /// Reconstruct the full row-major raster.
    ///
    /// Tile rows are decoded from the mapping straight into place, so the
    /// only allocation is the raster itself.
    pub fn read_full(&self) -> Result<Raster> {
        let chunk_size = self.meta.chunk_size;
        let dims = self.grid.raster_dims(chunk_size);
        let mut data = vec![0.0f32; dims.len()];
        let row_bytes = chunk_size * SAMPLE_BYTES;

        for (chunk_idx, chunk) in self.mmap.chunks_exact(chunk_size * row_bytes).enumerate() {
            let cy = chunk_idx / self.grid.chunks_x;
            let cx = chunk_idx % self.grid.chunks_x;
            for (iy, row) in chunk.chunks_exact(row_bytes).enumerate() {
                let start = (cy * chunk_size + iy) * dims.width + cx * chunk_size;
                decode_le_into(row, &mut data[start..start + chunk_size]);
            }
        }

        Raster::new(data, dims.width, dims.height)
    }
}
