//! Integration test: retile a raw raster and build its pyramid on disk.
//!
//! This test verifies the full pipeline end-to-end:
//! 1. Write a synthetic row-major raster with the SLDEM naming convention
//! 2. Retile it into a level-0 chunked file
//! 3. Build every pyramid level down to the floor
//! 4. Verify layout, averaging and idempotence against the in-memory source

use std::fs;
use std::path::{Path, PathBuf};

use dem_pyramid::{
    build_pyramid, naming, to_raster, to_tiled, ChunkedReader, DemPyramidError, GridShape,
    LevelOutcome, PyramidBuilder, PyramidConfig, RasterDims, TileOutcome, TileWriter,
    TileWriterConfig,
};
use test_utils::fixtures::{names, rasters};
use test_utils::{
    assert_approx_eq, create_constant_raster, create_terrain_raster, create_test_raster, mean,
    read_raw_file, write_raw_file,
};

/// Write a small raster under an equatorial (30x45 degree) name and retile it.
fn retile_small_tile(dir: &Path, data: &[f32]) -> PathBuf {
    let spec = rasters::SMALL_TILE;
    let raw = write_raw_file(dir, names::EQUATORIAL_RAW, data).expect("Failed to write raster");
    let level0 = dir
        .join("proc")
        .join(naming::level0_name(names::EQUATORIAL_RAW, spec.chunk_size).unwrap());

    let writer = TileWriter::new(TileWriterConfig {
        dims: RasterDims::new(spec.width, spec.height),
        chunk_size: spec.chunk_size,
    });
    let outcome = writer.write_chunks(&raw, &level0).expect("Failed to retile");
    assert_eq!(
        outcome,
        TileOutcome::Written {
            chunks: 6,
            bytes_written: (spec.size() * 4) as u64,
        }
    );
    level0
}

#[test]
fn test_tiling_roundtrip_through_files() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let spec = rasters::SMALL_TILE;
    let original = create_test_raster(spec.width, spec.height);

    let level0 = retile_small_tile(temp_dir.path(), &original);

    let reader = ChunkedReader::open(&level0).expect("Failed to open level 0");
    assert_eq!(reader.grid(), GridShape::new(2, 3));
    let full = reader.read_full().unwrap();
    assert_eq!((full.width, full.height), (spec.width, spec.height));
    assert_eq!(full.data, original);

    // the on-disk bytes are exactly the chunk-major permutation
    let on_disk = read_raw_file(&level0).unwrap();
    assert_eq!(on_disk, to_tiled(&original, spec.chunk_size, reader.grid()).unwrap());
    assert_eq!(to_raster(&on_disk, spec.chunk_size, reader.grid()).unwrap(), original);

    // chunk (1, 2) is the bottom-right 16x16 block: value = col * 1000 + row
    let chunk = reader.read_chunk(1, 2).unwrap();
    assert_eq!(chunk[0], (32 * 1000 + 16) as f32);
    assert_eq!(chunk[16 * 16 - 1], (47 * 1000 + 31) as f32);
}

#[test]
fn test_pyramid_levels_and_mean_preservation() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let spec = rasters::SMALL_TILE;
    let original = create_terrain_raster(spec.width, spec.height);
    let level0 = retile_small_tile(temp_dir.path(), &original);

    let report = build_pyramid(&level0, 2, false).expect("Failed to build pyramid");
    assert_eq!(report.grid, Some(GridShape::new(2, 3)));

    let sizes: Vec<usize> = report.levels.iter().map(|l| l.chunk_size).collect();
    assert_eq!(sizes, vec![8, 4, 2]);

    let mut previous_mean = mean(&original);
    let mut previous_width = spec.width;
    for level in &report.levels {
        assert_eq!(level.outcome, LevelOutcome::Written);
        assert_eq!(level.width, previous_width / 2);
        assert_eq!(level.width, 3 * level.chunk_size);
        assert_eq!(level.height, 2 * level.chunk_size);

        let reader = ChunkedReader::open(&level.path).expect("Failed to open level");
        assert_eq!(reader.grid(), GridShape::new(2, 3));
        let raster = reader.read_full().unwrap();
        assert_approx_eq!(raster.mean(), previous_mean, 1e-4);

        previous_mean = raster.mean();
        previous_width = level.width;
    }
}

#[test]
fn test_level_values_are_block_means() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let spec = rasters::SMALL_TILE;
    let original = create_test_raster(spec.width, spec.height);
    let level0 = retile_small_tile(temp_dir.path(), &original);

    let report = build_pyramid(&level0, 8, false).unwrap();
    assert_eq!(report.levels.len(), 1);

    let level = ChunkedReader::open(&report.levels[0].path)
        .unwrap()
        .read_full()
        .unwrap();
    for row in 0..level.height {
        for col in 0..level.width {
            // mean of col*1000+row over a 2x2 block
            let expected = ((2 * col) as f32 + 0.5) * 1000.0 + (2 * row) as f32 + 0.5;
            assert_eq!(level.get(col, row), Some(expected));
        }
    }
}

#[test]
fn test_constant_raster_stays_constant() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let spec = rasters::SINGLE_CHUNK;
    let data = create_constant_raster(spec.width, spec.height, -1.75);
    let name = names::chunked("00N", "01N", "000", "001", spec.chunk_size);
    let path = write_raw_file(temp_dir.path(), &name, &data).unwrap();

    let report = build_pyramid(&path, 1, false).unwrap();
    assert_eq!(report.levels.len(), 2);
    for level in &report.levels {
        let samples = read_raw_file(&level.path).unwrap();
        assert_eq!(samples.len(), level.chunk_size * level.chunk_size);
        assert!(samples.iter().all(|&v| v == -1.75));
    }
}

#[test]
fn test_idempotent_without_overwrite() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let spec = rasters::SMALL_TILE;
    let level0 = retile_small_tile(
        temp_dir.path(),
        &create_terrain_raster(spec.width, spec.height),
    );

    let builder = PyramidBuilder::new(PyramidConfig::default());
    let first = builder.build(&level0).unwrap();
    let first_bytes: Vec<Vec<u8>> = first
        .levels
        .iter()
        .map(|l| fs::read(&l.path).unwrap())
        .collect();

    let second = builder.build(&level0).unwrap();
    assert_eq!(second.written(), 0);
    assert!(second
        .levels
        .iter()
        .all(|l| l.outcome == LevelOutcome::Skipped));

    for (level, bytes) in second.levels.iter().zip(&first_bytes) {
        assert_eq!(&fs::read(&level.path).unwrap(), bytes);
    }
}

#[test]
fn test_wrapping_longitude_resolves_grid() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    // 315..000 spans 45 degrees; 30S..00S spans 30 -> 2x3 chunks
    let data = create_test_raster(12, 8);
    let tiled = to_tiled(&data, 4, GridShape::new(2, 3)).unwrap();
    let name = names::chunked("30S", "00S", "315", "000", 4);
    let path = write_raw_file(temp_dir.path(), &name, &tiled).unwrap();

    let reader = ChunkedReader::open(&path).unwrap();
    assert_eq!(reader.grid(), GridShape::new(2, 3));
    assert_eq!(reader.read_full().unwrap().data, data);
}

#[test]
fn test_odd_chunk_size_above_floor_fails() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let name = names::chunked("00N", "30N", "000", "045", 5);
    let path = write_raw_file(temp_dir.path(), &name, &vec![0.0; 6 * 25]).unwrap();

    let err = build_pyramid(&path, 2, false).unwrap_err();
    assert!(matches!(err, DemPyramidError::OddChunkSize { chunk_size: 5, .. }));
    assert!(err.to_string().contains(&name));

    let produced: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
    assert_eq!(produced.len(), 1);
}

#[test]
fn test_unparsable_name_is_structural() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = write_raw_file(temp_dir.path(), "tile_CHUNKED_4.DAT", &[0.0; 16]).unwrap();

    let err = build_pyramid(&path, 2, false).unwrap_err();
    assert!(matches!(err, DemPyramidError::Format { .. }));
    assert!(err.is_structural());
}

#[test]
fn test_huge_chunk_token_is_structural() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let name = format!("SLDEM2015_512_00N_30N_000_045_CHUNKED_{}.DAT", 1u64 << 32);
    let path = write_raw_file(temp_dir.path(), &name, &[0.0; 16]).unwrap();

    let err = build_pyramid(&path, 2, false).unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains(&name));
}

#[test]
fn test_misaligned_level0_is_structural() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let name = names::chunked("00N", "30N", "000", "045", 4);
    // 7 chunks of 4x4: not a 2:3 grid
    let path = write_raw_file(temp_dir.path(), &name, &vec![0.0; 7 * 16]).unwrap();

    let err = build_pyramid(&path, 2, false).unwrap_err();
    assert!(matches!(err, DemPyramidError::GridResolution { .. }));
    assert!(err.is_structural());
}

#[test]
fn test_raw_size_mismatch_skips_file() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let raw = write_raw_file(temp_dir.path(), names::EQUATORIAL_RAW, &[0.0; 10]).unwrap();
    let dest = temp_dir.path().join(names::EQUATORIAL_LEVEL0);

    let outcome = TileWriter::new(TileWriterConfig::default())
        .write_chunks(&raw, &dest)
        .unwrap();
    assert!(matches!(outcome, TileOutcome::Skipped { actual_bytes: 40, .. }));
    assert!(!dest.exists());
}
