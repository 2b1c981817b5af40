//! Configuration for retiling and pyramid generation.

use serde::{Deserialize, Serialize};

use crate::types::RasterDims;

/// Width of an SLDEM2015 tile in samples.
pub const DEFAULT_RASTER_WIDTH: usize = 23040;
/// Height of an SLDEM2015 tile in samples.
pub const DEFAULT_RASTER_HEIGHT: usize = 15360;
/// Chunk size of level-0 chunked files.
pub const DEFAULT_CHUNK_SIZE: usize = 512;
/// Smallest chunk size a pyramid goes down to.
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 2;

/// Configuration for the tile writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileWriterConfig {
    /// Dimensions of every raw raster in the batch.
    pub dims: RasterDims,

    /// Square chunk dimension of the level-0 output.
    pub chunk_size: usize,
}

impl Default for TileWriterConfig {
    fn default() -> Self {
        Self {
            dims: RasterDims::new(DEFAULT_RASTER_WIDTH, DEFAULT_RASTER_HEIGHT),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl TileWriterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DEM_RASTER_WIDTH") {
            if let Ok(width) = val.parse() {
                config.dims.width = width;
            }
        }

        if let Ok(val) = std::env::var("DEM_RASTER_HEIGHT") {
            if let Ok(height) = val.parse() {
                config.dims.height = height;
            }
        }

        if let Ok(val) = std::env::var("DEM_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                config.chunk_size = size;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        if self.dims.is_empty() {
            return Err(format!(
                "raster dimensions must be non-zero (got {}x{})",
                self.dims.width, self.dims.height
            ));
        }

        if self.dims.width % self.chunk_size != 0 || self.dims.height % self.chunk_size != 0 {
            return Err(format!(
                "raster {}x{} is not divisible into {}x{} chunks",
                self.dims.width, self.dims.height, self.chunk_size, self.chunk_size
            ));
        }

        Ok(())
    }

    /// Number of chunks along each axis as `(chunks_y, chunks_x)`.
    pub fn chunk_counts(&self) -> (usize, usize) {
        (
            self.dims.height / self.chunk_size,
            self.dims.width / self.chunk_size,
        )
    }
}

// ============================================================================
// Pyramid Configuration
// ============================================================================

/// Configuration for multi-resolution pyramid generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    /// Stop halving once the chunk size reaches this value.
    pub min_chunk_size: usize,

    /// Chunk size of the files a batch starts pyramids from.
    pub base_chunk_size: usize,

    /// Rewrite levels that already exist on disk.
    pub overwrite: bool,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            base_chunk_size: DEFAULT_CHUNK_SIZE,
            overwrite: false,
        }
    }
}

impl PyramidConfig {
    /// Load pyramid configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PYRAMID_MIN_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                config.min_chunk_size = size;
            }
        }

        if let Ok(val) = std::env::var("PYRAMID_BASE_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                config.base_chunk_size = size;
            }
        }

        if let Ok(val) = std::env::var("PYRAMID_OVERWRITE") {
            config.overwrite = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the pyramid configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_chunk_size == 0 {
            return Err("pyramid min_chunk_size must be > 0".to_string());
        }

        if self.base_chunk_size == 0 {
            return Err("pyramid base_chunk_size must be > 0".to_string());
        }

        Ok(())
    }

    /// Chunk sizes a pyramid starting at `chunk_size` would write, largest first.
    ///
    /// Halving stops after the first odd size; the builder rejects a chain
    /// that reaches an odd size above the floor before writing anything.
    pub fn level_sizes(&self, chunk_size: usize) -> Vec<usize> {
        let mut sizes = Vec::new();
        let mut current = chunk_size;
        while current > self.min_chunk_size && current % 2 == 0 {
            current /= 2;
            sizes.push(current);
        }
        sizes
    }
}
