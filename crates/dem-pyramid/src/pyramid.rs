//! Multi-resolution pyramid generation for chunked DEM files.
//!
//! Starting from a level-0 chunked file, each level averages 2x2 blocks of
//! the previous one and is stored with half the chunk size, keeping the tile
//! grid shape unchanged:
//!
//! ```text
//! X_CHUNKED_512.DAT ──► X_CHUNKED_256.DAT ──► ... ──► X_CHUNKED_<min>.DAT
//!   (30x45 chunks)        (30x45 chunks)               (30x45 chunks)
//! ```
//!
//! Only level 0 is read from disk; later levels are derived from the
//! in-memory raster, so peak memory is one full-resolution raster.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PyramidConfig;
use crate::downsample::downsample_2x;
use crate::error::{DemPyramidError, Result};
use crate::io::{file_len, write_samples_atomic};
use crate::layout::to_tiled;
use crate::naming;
use crate::reader::ChunkedReader;
use crate::types::{ChunkedFileMeta, GridShape, SAMPLE_BYTES};

/// What happened to one pyramid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelOutcome {
    /// The level was written (fresh, or replacing an existing file on overwrite).
    Written,
    /// A complete file already existed and overwrite was off.
    Skipped,
    /// An existing file had the wrong size and was replaced.
    Rewritten,
}

/// Result of generating a single level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub chunk_size: usize,
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub outcome: LevelOutcome,
}

/// Result of generating all levels below one level-0 file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidReport {
    pub source: PathBuf,
    /// Tile grid shared by all levels; `None` when nothing had to be done.
    pub grid: Option<GridShape>,
    pub levels: Vec<LevelReport>,
}

impl PyramidReport {
    fn empty(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            grid: None,
            levels: Vec::new(),
        }
    }

    /// Number of levels actually written to disk.
    pub fn written(&self) -> usize {
        self.levels
            .iter()
            .filter(|l| l.outcome != LevelOutcome::Skipped)
            .count()
    }
}

/// Check that every chunk size above the floor can be halved.
fn check_chain(path: &Path, chunk_size: usize, min_chunk_size: usize) -> Result<()> {
    let mut current = chunk_size;
    while current > min_chunk_size {
        if current % 2 != 0 {
            return Err(DemPyramidError::OddChunkSize {
                path: path.to_path_buf(),
                chunk_size: current,
                min_chunk_size,
            });
        }
        current /= 2;
    }
    Ok(())
}

/// Build every pyramid level below `level0_path` down to `min_chunk_size`.
///
/// The whole chain of chunk sizes is checked before anything is written, so
/// an odd chunk size above the floor fails without producing output.
/// Existing levels are kept when `overwrite` is false and their size matches
/// the expected size; the downsampled raster still feeds the next level.
pub fn build_pyramid(
    level0_path: &Path,
    min_chunk_size: usize,
    overwrite: bool,
) -> Result<PyramidReport> {
    let base_chunk = naming::parse_chunk_size(naming::file_name(level0_path)?)?;
    if base_chunk <= min_chunk_size {
        return Ok(PyramidReport::empty(level0_path));
    }
    check_chain(level0_path, base_chunk, min_chunk_size)?;

    let meta = ChunkedFileMeta::from_path(level0_path)?;
    let reader = ChunkedReader::with_meta(meta.clone())?;
    let grid = reader.grid();

    info!(
        path = %level0_path.display(),
        chunk_size = base_chunk,
        min_chunk_size,
        chunks_y = grid.chunks_y,
        chunks_x = grid.chunks_x,
        "Building pyramid"
    );

    let mut raster = reader.read_full()?;
    drop(reader);

    let mut report = PyramidReport {
        source: level0_path.to_path_buf(),
        grid: Some(grid),
        levels: Vec::new(),
    };
    let mut current_chunk = base_chunk;

    while current_chunk > min_chunk_size {
        let next_chunk = current_chunk / 2;
        raster = downsample_2x(&raster)?;
        let output_path = meta.level_path(next_chunk)?;
        let expected_bytes = (grid.total_samples(next_chunk) * SAMPLE_BYTES) as u64;

        let existing_bytes = if output_path.exists() {
            Some(file_len(&output_path)?)
        } else {
            None
        };

        let outcome = match existing_bytes {
            Some(len) if !overwrite && len == expected_bytes => {
                info!(path = %output_path.display(), "Skipping existing level");
                LevelOutcome::Skipped
            }
            Some(len) if !overwrite => {
                warn!(
                    path = %output_path.display(),
                    expected_bytes,
                    actual_bytes = len,
                    "Existing level has the wrong size, rewriting"
                );
                write_level(&raster.data, next_chunk, grid, &output_path)?;
                LevelOutcome::Rewritten
            }
            _ => {
                write_level(&raster.data, next_chunk, grid, &output_path)?;
                LevelOutcome::Written
            }
        };

        if outcome != LevelOutcome::Skipped {
            info!(
                path = %output_path.display(),
                width = raster.width,
                height = raster.height,
                "Wrote level"
            );
        }

        report.levels.push(LevelReport {
            chunk_size: next_chunk,
            path: output_path,
            width: raster.width,
            height: raster.height,
            outcome,
        });
        current_chunk = next_chunk;
    }

    Ok(report)
}

fn write_level(data: &[f32], chunk_size: usize, grid: GridShape, path: &Path) -> Result<()> {
    let tiled = to_tiled(data, chunk_size, grid)?;
    write_samples_atomic(path, &tiled)?;
    Ok(())
}

/// Pyramid generation driven by a [`PyramidConfig`].
pub struct PyramidBuilder {
    config: PyramidConfig,
}

impl PyramidBuilder {
    /// Create a new builder.
    pub fn new(config: PyramidConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &PyramidConfig {
        &self.config
    }

    /// Whether `name` is a level-0 file this builder starts pyramids from.
    pub fn is_base_level(&self, name: &str) -> bool {
        naming::is_chunked_name(name)
            && naming::parse_chunk_size(name)
                .map(|size| size == self.config.base_chunk_size)
                .unwrap_or(false)
    }

    /// Build the pyramid below `level0_path`.
    pub fn build(&self, level0_path: &Path) -> Result<PyramidReport> {
        build_pyramid(
            level0_path,
            self.config.min_chunk_size,
            self.config.overwrite,
        )
    }
}
