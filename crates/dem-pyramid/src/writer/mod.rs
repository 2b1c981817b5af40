//! Writer for converting row-major rasters to chunk-major files.
//!
//! This module produces level 0 of every pyramid; the source raster is
//! memory-mapped so it never has to be resident.

mod tile_writer;

pub use tile_writer::{write_chunks, TileOutcome, TileWriter};
