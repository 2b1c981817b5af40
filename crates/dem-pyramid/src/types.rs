//! Core types for chunked DEM files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DemPyramidError, Result};
use crate::naming;

/// Size of one stored sample in bytes (little-endian f32).
pub const SAMPLE_BYTES: usize = 4;

/// Angular extent of a tile in degrees.
///
/// Only used to break the ambiguity of a chunk grid's shape; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoSpan {
    pub lat_span: f64,
    pub lon_span: f64,
}

impl GeoSpan {
    /// Create a new span.
    pub fn new(lat_span: f64, lon_span: f64) -> Self {
        Self { lat_span, lon_span }
    }

    /// Width over height of the covered area.
    pub fn aspect_ratio(&self) -> f64 {
        self.lon_span / self.lat_span
    }
}

/// Shape of a tile grid, in chunks.
///
/// The shape is fixed for every level of a pyramid; only the chunk size shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    pub chunks_y: usize,
    pub chunks_x: usize,
}

impl GridShape {
    /// Create a new grid shape.
    pub fn new(chunks_y: usize, chunks_x: usize) -> Self {
        Self { chunks_y, chunks_x }
    }

    /// Total number of chunks.
    pub fn total_chunks(&self) -> usize {
        self.chunks_y * self.chunks_x
    }

    /// Raster dimensions covered by this grid at the given chunk size.
    pub fn raster_dims(&self, chunk_size: usize) -> RasterDims {
        RasterDims::new(self.chunks_x * chunk_size, self.chunks_y * chunk_size)
    }

    /// Number of samples stored at the given chunk size.
    pub fn total_samples(&self, chunk_size: usize) -> usize {
        self.total_chunks() * chunk_size * chunk_size
    }
}

/// Raster dimensions in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterDims {
    pub width: usize,
    pub height: usize,
}

impl RasterDims {
    /// Create new dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check for a zero-sized raster.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expected file size of a raster with these dimensions.
    pub fn byte_len(&self) -> u64 {
        (self.len() * SAMPLE_BYTES) as u64
    }
}

/// A fully resident row-major raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Samples in row-major order (row 0 first).
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Raster {
    /// Wrap row-major samples, checking the length against the dimensions.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> Result<Self> {
        if data.len() != width * height {
            return Err(DemPyramidError::shape(
                data.len(),
                format!("{}x{}", width, height),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Dimensions of the raster.
    pub fn dims(&self) -> RasterDims {
        RasterDims::new(self.width, self.height)
    }

    /// Get the value at a specific grid coordinate.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Arithmetic mean of all samples, accumulated in f64.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return f64::NAN;
        }
        let sum: f64 = self.data.iter().map(|&v| v as f64).sum();
        sum / self.data.len() as f64
    }
}

/// Metadata recovered from a chunked file's name.
///
/// Parsed once and handed to the reader and the pyramid builder instead of
/// re-parsing the name at every call site.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkedFileMeta {
    pub path: PathBuf,
    pub chunk_size: usize,
    pub span: GeoSpan,
}

impl ChunkedFileMeta {
    /// Parse chunk size and geographic span from the file name of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = naming::file_name(path)?;
        let chunk_size = naming::parse_chunk_size(name)?;
        let span = naming::parse_span(name)?;
        Ok(Self {
            path: path.to_path_buf(),
            chunk_size,
            span,
        })
    }

    /// Path of the same file at another chunk size.
    pub fn level_path(&self, chunk_size: usize) -> Result<PathBuf> {
        naming::rewrite_chunk_size_in_path(&self.path, chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_shape_dims() {
        let grid = GridShape::new(30, 45);
        assert_eq!(grid.total_chunks(), 1350);
        assert_eq!(grid.raster_dims(512), RasterDims::new(23040, 15360));
        assert_eq!(grid.total_samples(2), 1350 * 4);
    }

    #[test]
    fn test_raster_new_checks_length() {
        assert!(Raster::new(vec![0.0; 6], 3, 2).is_ok());
        assert!(Raster::new(vec![0.0; 5], 3, 2).is_err());
    }

    #[test]
    fn test_raster_get() {
        let raster = Raster::new((0..6).map(|v| v as f32).collect(), 3, 2).unwrap();
        assert_eq!(raster.get(0, 0), Some(0.0));
        assert_eq!(raster.get(2, 1), Some(5.0));
        assert_eq!(raster.get(3, 0), None);
        assert_eq!(raster.get(0, 2), None);
    }

    #[test]
    fn test_raster_mean() {
        let raster = Raster::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        assert!((raster.mean() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_meta_from_path() {
        let meta =
            ChunkedFileMeta::from_path("/data/SLDEM2015_512_00N_30N_000_045_CHUNKED_512.DAT")
                .unwrap();
        assert_eq!(meta.chunk_size, 512);
        assert_eq!(meta.span, GeoSpan::new(30.0, 45.0));
        assert_eq!(
            meta.level_path(256).unwrap(),
            PathBuf::from("/data/SLDEM2015_512_00N_30N_000_045_CHUNKED_256.DAT")
        );
    }
}
