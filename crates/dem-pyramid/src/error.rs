//! Error types for DEM chunking and pyramid generation.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while retiling a raster or building a pyramid.
///
/// Every variant names the offending file (or file name) and the invariant
/// that was violated so that a batch run can be triaged from the log alone.
#[derive(Error, Debug)]
pub enum DemPyramidError {
    /// The file name does not follow the `<..>_<lat>_<lat>_<lon>_<lon>_.._CHUNKED_<n>` convention.
    #[error("cannot parse file name {name}: {reason}")]
    Format { name: String, reason: String },

    /// The chunk grid could not be derived from sample count and geographic span.
    #[error("cannot resolve chunk grid for {name}: {reason}")]
    GridResolution { name: String, reason: String },

    /// An odd chunk size was reached before the configured floor.
    #[error("{path}: chunk size {chunk_size} is odd and above the floor {min_chunk_size}, cannot halve")]
    OddChunkSize {
        path: PathBuf,
        chunk_size: usize,
        min_chunk_size: usize,
    },

    /// A file's byte length does not fit the expected sample layout.
    #[error("{path}: {reason} (file has {actual} bytes)")]
    Misaligned {
        path: PathBuf,
        actual: u64,
        reason: String,
    },

    /// An in-memory buffer does not match the shape it is being interpreted as.
    #[error("buffer of {actual} samples does not match shape {expected_shape}")]
    Shape {
        actual: usize,
        expected_shape: String,
    },

    /// A tile coordinate outside the resolved grid was requested.
    #[error("{path}: chunk ({cy}, {cx}) is outside the {chunks_y}x{chunks_x} grid")]
    ChunkOutOfBounds {
        path: PathBuf,
        cy: usize,
        cx: usize,
        chunks_y: usize,
        chunks_x: usize,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error, tagged with the path being accessed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DemPyramidError {
    /// Create a Format error.
    pub fn format(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a GridResolution error.
    pub fn grid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GridResolution {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a Misaligned error.
    pub fn misaligned(path: &Path, actual: u64, reason: impl Into<String>) -> Self {
        Self::Misaligned {
            path: path.to_path_buf(),
            actual,
            reason: reason.into(),
        }
    }

    /// Create a Shape error.
    pub fn shape(actual: usize, expected_shape: impl Into<String>) -> Self {
        Self::Shape {
            actual,
            expected_shape: expected_shape.into(),
        }
    }

    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the error is a violated precondition of the pipeline.
    ///
    /// Structural errors abort the whole chain for one file; anything else
    /// (filesystem trouble) may be transient and left to the batch driver.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

/// Attach a path to `std::io::Result`s.
pub(crate) trait IoContext<T> {
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| DemPyramidError::io(path, e))
    }
}

/// Result type for DEM pyramid operations.
pub type Result<T> = std::result::Result<T, DemPyramidError>;
