//! Out-of-core DEM retiling and resolution pyramids.
//!
//! This crate turns very large row-major `f32` elevation rasters into
//! chunk-major files and derives a pyramid of lower-resolution levels from
//! them:
//!
//! - **Retiling**: the raw raster is memory-mapped and copied one chunk at a
//!   time, so it never has to fit in memory
//! - **Pyramids**: each level averages 2x2 blocks of the previous one and
//!   halves the chunk size, keeping the tile grid shape
//! - **Self-describing names**: chunk size and geographic span live in the
//!   file name; the grid shape is inferred from file size and span
//!
//! # Architecture
//!
//! ```text
//! X_FLOAT.IMG (row-major, memory-mapped)
//!      │
//!      ▼
//! TileWriter::write_chunks
//!      │
//!      ▼
//! X_CHUNKED_512.DAT ──► ChunkedFileMeta::from_path (naming)
//!      │                      │
//!      │                      ▼
//!      │                resolve_grid (file size + span)
//!      ▼                      │
//! ChunkedReader::read_full ◄──┘
//!      │
//!      ▼
//! downsample_2x ──► to_tiled ──► X_CHUNKED_256.DAT ──► ... ──► X_CHUNKED_<min>.DAT
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use dem_pyramid::{build_pyramid, write_chunks, TileOutcome};
//!
//! let raw = Path::new("SLDEM2015_512_00N_30N_000_045_FLOAT.IMG");
//! let level0 = Path::new("proc/SLDEM2015_512_00N_30N_000_045_CHUNKED_512.DAT");
//!
//! if let TileOutcome::Written { .. } = write_chunks(raw, level0, 23040, 15360, 512)? {
//!     let report = build_pyramid(level0, 2, false)?;
//!     println!("{} levels written", report.written());
//! }
//! # Ok::<(), dem_pyramid::DemPyramidError>(())
//! ```

pub mod config;
pub mod downsample;
pub mod error;
pub mod grid;
pub mod io;
pub mod layout;
pub mod naming;
pub mod pyramid;
pub mod reader;
pub mod types;
pub mod writer;

// Re-export commonly used types at crate root
pub use config::{PyramidConfig, TileWriterConfig};
pub use downsample::downsample_2x;
pub use error::{DemPyramidError, Result};
pub use grid::resolve_grid;
pub use layout::{to_raster, to_tiled};
pub use naming::{parse_chunk_size, parse_span, rewrite_chunk_size};
pub use pyramid::{build_pyramid, LevelOutcome, LevelReport, PyramidBuilder, PyramidReport};
pub use reader::ChunkedReader;
pub use types::{ChunkedFileMeta, GeoSpan, GridShape, Raster, RasterDims};
pub use writer::{write_chunks, TileOutcome, TileWriter};
