//! Preprocessing configuration.
//!
//! Loaded from a YAML file when one is given, otherwise from environment
//! variables; command-line flags are applied on top by `main`.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use dem_pyramid::{PyramidConfig, TileWriterConfig};

/// Top-level preprocessing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Raw raster retiling.
    pub tile: TileWriterConfig,

    /// Pyramid generation.
    pub pyramid: PyramidConfig,

    /// Worker threads for per-file parallelism (default: all cores).
    pub threads: Option<usize>,
}

impl PreprocessConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            tile: TileWriterConfig::from_env(),
            pyramid: PyramidConfig::from_env(),
            threads: std::env::var("DEM_THREADS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), ?config, "Loaded configuration file");
        Ok(config)
    }

    /// Load from `path` if given, otherwise from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_yaml(path),
            None => Ok(Self::from_env()),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.tile.validate().map_err(|e| anyhow!("tile: {}", e))?;
        self.pyramid.validate().map_err(|e| anyhow!("pyramid: {}", e))?;
        if self.threads == Some(0) {
            return Err(anyhow!("threads must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocess.yaml");
        std::fs::write(
            &path,
            "tile:\n  dims:\n    width: 1024\n    height: 512\n  chunk_size: 256\npyramid:\n  min_chunk_size: 8\nthreads: 2\n",
        )
        .unwrap();

        let config = PreprocessConfig::from_yaml(&path).unwrap();
        assert_eq!(config.tile.dims.width, 1024);
        assert_eq!(config.tile.dims.height, 512);
        assert_eq!(config.tile.chunk_size, 256);
        assert_eq!(config.pyramid.min_chunk_size, 8);
        assert_eq!(config.pyramid.base_chunk_size, 512);
        assert!(!config.pyramid.overwrite);
        assert_eq!(config.threads, Some(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_missing_file() {
        let err = PreprocessConfig::from_yaml(Path::new("/no/such/config.yaml")).unwrap_err();
        assert!(err.to_string().contains("/no/such/config.yaml"));
    }

    // the only test in this crate that touches the process environment
    #[test]
    fn test_load_without_file_reads_env() {
        let vars = [
            ("DEM_THREADS", "3"),
            ("DEM_CHUNK_SIZE", "256"),
            ("PYRAMID_MIN_CHUNK_SIZE", "16"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        let config = PreprocessConfig::load(None);
        for (key, _) in vars {
            std::env::remove_var(key);
        }

        let config = config.unwrap();
        assert_eq!(config.threads, Some(3));
        assert_eq!(config.tile.chunk_size, 256);
        assert_eq!(config.tile.dims.width, 23040);
        assert_eq!(config.pyramid.min_chunk_size, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let config = PreprocessConfig {
            threads: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
