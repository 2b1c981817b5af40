//! Directory-level batch processing.
//!
//! Every input file owns its own output paths, so files are processed in
//! parallel on the rayon pool. A failing file is logged and recorded; it
//! never stops the rest of the batch.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use dem_pyramid::naming;
use dem_pyramid::{
    DemPyramidError, PyramidBuilder, PyramidConfig, PyramidReport, TileOutcome, TileWriter,
    TileWriterConfig,
};

/// Outcome for one input file.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileStatus {
    Tiled { dest: PathBuf, outcome: TileOutcome },
    Pyramid { report: PyramidReport },
    Failed { error: String, structural: bool },
}

/// Result for one input file.
#[derive(Debug, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub status: FileStatus,
}

impl FileResult {
    fn failed(path: &Path, err: &DemPyramidError) -> Self {
        error!(
            path = %path.display(),
            error = %err,
            structural = err.is_structural(),
            "File failed"
        );
        Self {
            path: path.to_path_buf(),
            status: FileStatus::Failed {
                error: err.to_string(),
                structural: err.is_structural(),
            },
        }
    }
}

/// Results of one batch step.
#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    pub step: String,
    pub results: Vec<FileResult>,
}

impl BatchSummary {
    /// Number of files that failed.
    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, FileStatus::Failed { .. }))
            .count()
    }

    /// Number of raw rasters skipped for a size mismatch.
    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    FileStatus::Tiled {
                        outcome: TileOutcome::Skipped { .. },
                        ..
                    }
                )
            })
            .count()
    }

    fn log(&self) {
        info!(
            step = %self.step,
            files = self.results.len(),
            failed = self.failed(),
            skipped = self.skipped(),
            "Batch step complete"
        );
    }
}

/// List regular files directly inside `dir` whose name satisfies `accept`, sorted by name.
///
/// Symlinks are resolved, so a linked raster counts as a file.
pub fn discover(dir: &Path, accept: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str().map(&accept).unwrap_or(false) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Retile every `*_FLOAT.IMG` in `input_dir` into `output_dir`.
pub fn tile_directory(
    input_dir: &Path,
    output_dir: &Path,
    config: &TileWriterConfig,
) -> Result<BatchSummary> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let files = discover(input_dir, naming::is_raw_raster_name)?;
    if files.is_empty() {
        warn!(dir = %input_dir.display(), suffix = naming::RAW_SUFFIX, "No raw rasters found");
    }
    info!(count = files.len(), dir = %input_dir.display(), "Retiling rasters");

    let writer = TileWriter::new(config.clone());
    let results = files
        .par_iter()
        .map(|path| {
            let dest = naming::file_name(path)
                .and_then(|name| naming::level0_name(name, config.chunk_size))
                .map(|name| output_dir.join(name));
            match dest.and_then(|dest| writer.write_chunks(path, &dest).map(|o| (dest, o))) {
                Ok((dest, outcome)) => FileResult {
                    path: path.clone(),
                    status: FileStatus::Tiled { dest, outcome },
                },
                Err(e) => FileResult::failed(path, &e),
            }
        })
        .collect();

    let summary = BatchSummary {
        step: "tile".to_string(),
        results,
    };
    summary.log();
    Ok(summary)
}

/// Build pyramids for every base-level chunked file in `source_dir`.
pub fn pyramid_directory(source_dir: &Path, config: &PyramidConfig) -> Result<BatchSummary> {
    let builder = PyramidBuilder::new(config.clone());
    let files = discover(source_dir, |name| builder.is_base_level(name))?;
    if files.is_empty() {
        warn!(
            dir = %source_dir.display(),
            base_chunk_size = config.base_chunk_size,
            "No level-0 chunked files found"
        );
    }
    info!(
        count = files.len(),
        min_chunk_size = config.min_chunk_size,
        overwrite = config.overwrite,
        "Building pyramids"
    );

    let results = files
        .par_iter()
        .map(|path| match builder.build(path) {
            Ok(report) => FileResult {
                path: path.clone(),
                status: FileStatus::Pyramid { report },
            },
            Err(e) => FileResult::failed(path, &e),
        })
        .collect();

    let summary = BatchSummary {
        step: "pyramid".to_string(),
        results,
    };
    summary.log();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dem_pyramid::{to_tiled, GridShape, LevelOutcome, RasterDims};
    use test_utils::fixtures::{names, rasters};
    use test_utils::{create_test_raster, write_raw_file};

    fn small_tile_config() -> TileWriterConfig {
        let spec = rasters::SMALL_TILE;
        TileWriterConfig {
            dims: RasterDims::new(spec.width, spec.height),
            chunk_size: spec.chunk_size,
        }
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write_raw_file(dir.path(), &names::raw("30N", "60N", "000", "045"), &[0.0]).unwrap();
        write_raw_file(dir.path(), names::EQUATORIAL_RAW, &[0.0]).unwrap();
        write_raw_file(dir.path(), names::LABEL, &[0.0]).unwrap();
        fs::create_dir(dir.path().join("nested_FLOAT.IMG")).unwrap();

        let files = discover(dir.path(), naming::is_raw_raster_name).unwrap();
        let found: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            found,
            vec![
                names::EQUATORIAL_RAW.to_string(),
                names::raw("30N", "60N", "000", "045"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_symlinks() {
        let store = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = write_raw_file(store.path(), names::EQUATORIAL_RAW, &[0.0]).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join(names::WRAPPING_RAW)).unwrap();

        let files = discover(dir.path(), naming::is_raw_raster_name).unwrap();
        assert_eq!(files, vec![dir.path().join(names::WRAPPING_RAW)]);
    }

    #[test]
    fn test_tile_directory_continues_past_bad_file() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let spec = rasters::SMALL_TILE;

        let data = create_test_raster(spec.width, spec.height);
        write_raw_file(input.path(), names::EQUATORIAL_RAW, &data).unwrap();
        // wrong size: skipped, not failed
        write_raw_file(input.path(), names::WRAPPING_RAW, &[0.0; 3]).unwrap();

        let summary = tile_directory(input.path(), output.path(), &small_tile_config()).unwrap();
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.failed(), 0);
        assert_eq!(summary.skipped(), 1);

        let level0 = names::chunked("00N", "30N", "000", "045", 16);
        assert!(output.path().join(level0).exists());
        assert!(!output
            .path()
            .join(naming::level0_name(names::WRAPPING_RAW, 16).unwrap())
            .exists());
    }

    #[test]
    fn test_pyramid_directory_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        let grid = GridShape::new(2, 3);
        let data = create_test_raster(48, 32);
        let tiled = to_tiled(&data, 16, grid).unwrap();
        let good = names::chunked("00N", "30N", "000", "045", 16);
        write_raw_file(dir.path(), &good, &tiled).unwrap();
        // grid cannot be resolved: 5 chunks on a 2:3 span
        let bad = names::chunked("30N", "60N", "000", "045", 16);
        write_raw_file(dir.path(), &bad, &vec![0.0; 5 * 256]).unwrap();
        // not a base level: ignored
        let lower = names::chunked("60N", "90N", "000", "045", 8);
        write_raw_file(dir.path(), &lower, &[0.0; 64]).unwrap();

        let config = PyramidConfig {
            base_chunk_size: 16,
            min_chunk_size: 4,
            overwrite: false,
        };
        let summary = pyramid_directory(dir.path(), &config).unwrap();
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.failed(), 1);

        let report = summary
            .results
            .iter()
            .find_map(|r| match &r.status {
                FileStatus::Pyramid { report } => Some(report),
                _ => None,
            })
            .unwrap();
        let outcomes: Vec<_> = report.levels.iter().map(|l| (l.chunk_size, l.outcome)).collect();
        assert_eq!(outcomes, vec![(8, LevelOutcome::Written), (4, LevelOutcome::Written)]);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"kind\":\"failed\""));
    }
}
