//! Test data generators for synthetic elevation rasters.
//!
//! These generators create predictable, verifiable patterns that can be
//! used across the test suite, plus helpers to put them on disk in the raw
//! little-endian layout the pipeline consumes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Creates a test raster with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data survives retiling by checking
/// that raster[row][col] == col * 1000 + row.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
///
/// # Returns
///
/// A `Vec<f32>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_raster;
///
/// let raster = create_test_raster(10, 5);
/// assert_eq!(raster.len(), 50); // 10 * 5
/// assert_eq!(raster[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(raster[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(raster[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_raster(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a terrain-like raster in kilometres.
///
/// Combines a regional slope with crater-like bowls so that neighbouring
/// samples differ and averaging is not trivially exact.
pub fn create_terrain_raster(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x = col as f32 / width.max(1) as f32;
            let y = row as f32 / height.max(1) as f32;
            let slope = -2.0 + 4.0 * x - 1.5 * y;
            let crater = ((x * 17.0).sin() * (y * 11.0).cos()) * 0.75;
            data.push(slope + crater);
        }
    }
    data
}

/// Creates a raster where every cell has the same value.
pub fn create_constant_raster(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Encodes samples as little-endian f32 bytes.
pub fn to_le_bytes(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decodes little-endian f32 bytes.
pub fn from_le_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Writes samples as a raw little-endian file `dir/name` and returns its path.
pub fn write_raw_file(dir: &Path, name: &str, samples: &[f32]) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, to_le_bytes(samples))?;
    Ok(path)
}

/// Reads a raw little-endian file written by the pipeline.
pub fn read_raw_file(path: &Path) -> io::Result<Vec<f32>> {
    Ok(from_le_bytes(&fs::read(path)?))
}

/// Arithmetic mean accumulated in f64.
pub fn mean(samples: &[f32]) -> f64 {
    samples.iter().map(|&v| v as f64).sum::<f64>() / samples.len() as f64
}
