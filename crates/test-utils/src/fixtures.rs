//! Common test fixtures for lunar-dem tests.
//!
//! File names follow the SLDEM2015 convention: latitude bounds at tokens
//! 2 and 3, longitude bounds at tokens 4 and 5.

/// Raw raster and level-0 file names.
pub mod names {
    /// Equatorial tile, 30 degrees tall and 45 wide.
    pub const EQUATORIAL_RAW: &str = "SLDEM2015_512_00N_30N_000_045_FLOAT.IMG";
    pub const EQUATORIAL_LEVEL0: &str = "SLDEM2015_512_00N_30N_000_045_CHUNKED_512.DAT";

    /// Southern tile in the last longitude sector, wrapping past 360.
    pub const WRAPPING_RAW: &str = "SLDEM2015_512_30S_00S_315_000_FLOAT.IMG";
    pub const WRAPPING_LEVEL0: &str = "SLDEM2015_512_30S_00S_315_000_CHUNKED_512.DAT";

    /// Label file shipped next to every raster; never a pipeline input.
    pub const LABEL: &str = "SLDEM2015_512_00N_30N_000_045_FLOAT.LBL";

    /// A chunked name with the given span tokens and chunk size.
    pub fn chunked(lat_a: &str, lat_b: &str, lon_a: &str, lon_b: &str, chunk_size: usize) -> String {
        format!(
            "SLDEM2015_512_{}_{}_{}_{}_CHUNKED_{}.DAT",
            lat_a, lat_b, lon_a, lon_b, chunk_size
        )
    }

    /// A raw raster name with the given span tokens.
    pub fn raw(lat_a: &str, lat_b: &str, lon_a: &str, lon_b: &str) -> String {
        format!("SLDEM2015_512_{}_{}_{}_{}_FLOAT.IMG", lat_a, lat_b, lon_a, lon_b)
    }
}

/// Common raster specifications for testing.
pub mod rasters {
    /// Raster specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct RasterSpec {
        pub width: usize,
        pub height: usize,
        pub chunk_size: usize,
    }

    impl RasterSpec {
        /// Returns the total number of samples.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Returns the chunk grid as (chunks_y, chunks_x).
        pub fn grid(&self) -> (usize, usize) {
            (self.height / self.chunk_size, self.width / self.chunk_size)
        }
    }

    /// Full-size SLDEM2015 tile (30x45 degrees at 512 px/degree).
    pub const SLDEM_TILE: RasterSpec = RasterSpec {
        width: 23040,
        height: 15360,
        chunk_size: 512,
    };

    /// Scaled-down tile with the same 2:3 chunk grid as a real tile.
    pub const SMALL_TILE: RasterSpec = RasterSpec {
        width: 48,
        height: 32,
        chunk_size: 16,
    };

    /// Single chunk.
    pub const SINGLE_CHUNK: RasterSpec = RasterSpec {
        width: 4,
        height: 4,
        chunk_size: 4,
    };
}
