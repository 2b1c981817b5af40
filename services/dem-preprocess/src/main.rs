//! Lunar DEM preprocessing service.
//!
//! Batch driver over directories of SLDEM2015 tiles:
//! - `tile`: retile raw row-major `*_FLOAT.IMG` rasters into chunk-major files
//! - `pyramid`: build the 2x2-mean pyramid below every level-0 chunked file
//! - `run`: both steps in sequence
//!
//! Files are processed in parallel; a failing file is logged and the batch
//! continues. The process exits non-zero if any file failed.

mod batch;
mod config;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use batch::BatchSummary;
use config::PreprocessConfig;
use dem_pyramid::{PyramidConfig, RasterDims, TileWriterConfig};

#[derive(Parser, Debug)]
#[command(name = "dem-preprocess")]
#[command(about = "Retile lunar DEM rasters and build multi-resolution pyramids")]
struct Args {
    /// YAML configuration file (default: environment variables)
    #[arg(long, global = true, env = "DEM_CONFIG")]
    config: Option<PathBuf>,

    /// Worker threads (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Write a JSON report of per-file results to this path
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Retile raw rasters into level-0 chunked files
    Tile {
        /// Directory containing *_FLOAT.IMG rasters
        #[arg(long)]
        input_dir: PathBuf,

        /// Directory for level-0 chunked files
        #[arg(long)]
        output_dir: PathBuf,

        #[command(flatten)]
        raster: RasterArgs,
    },

    /// Build pyramids below level-0 chunked files
    Pyramid {
        /// Directory containing level-0 chunked files
        #[arg(long)]
        source_dir: PathBuf,

        #[command(flatten)]
        pyramid: PyramidArgs,
    },

    /// Retile, then build pyramids in the output directory
    Run {
        #[arg(long)]
        input_dir: PathBuf,

        #[arg(long)]
        output_dir: PathBuf,

        #[command(flatten)]
        raster: RasterArgs,

        #[command(flatten)]
        pyramid: PyramidArgs,
    },
}

#[derive(clap::Args, Debug)]
struct RasterArgs {
    /// Raster width in samples
    #[arg(long)]
    width: Option<usize>,

    /// Raster height in samples
    #[arg(long)]
    height: Option<usize>,

    /// Level-0 chunk edge length
    #[arg(long)]
    chunk_size: Option<usize>,
}

impl RasterArgs {
    fn apply(&self, config: &mut TileWriterConfig) {
        let width = self.width.unwrap_or(config.dims.width);
        let height = self.height.unwrap_or(config.dims.height);
        config.dims = RasterDims::new(width, height);
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
    }
}

#[derive(clap::Args, Debug)]
struct PyramidArgs {
    /// Rewrite levels that already exist
    #[arg(long)]
    overwrite: bool,

    /// Stop once the chunk size reaches this value
    #[arg(long)]
    min_chunk: Option<usize>,

    /// Chunk size of the level-0 files to start from
    #[arg(long)]
    base_chunk: Option<usize>,
}

impl PyramidArgs {
    fn apply(&self, config: &mut PyramidConfig) {
        if self.overwrite {
            config.overwrite = true;
        }
        if let Some(min_chunk) = self.min_chunk {
            config.min_chunk_size = min_chunk;
        }
        if let Some(base_chunk) = self.base_chunk {
            config.base_chunk_size = base_chunk;
        }
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let result = if args.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

fn write_report(path: &Path, summaries: &[BatchSummary]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summaries)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!(path = %path.display(), "Wrote batch report");
    Ok(())
}

fn log_plan(config: &PyramidConfig) {
    info!(
        base_chunk_size = config.base_chunk_size,
        levels = ?config.level_sizes(config.base_chunk_size),
        "Pyramid levels"
    );
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let mut config = PreprocessConfig::load(args.config.as_deref())?;
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    match &args.command {
        Command::Tile { raster, .. } => raster.apply(&mut config.tile),
        Command::Pyramid { pyramid, .. } => pyramid.apply(&mut config.pyramid),
        Command::Run {
            raster, pyramid, ..
        } => {
            raster.apply(&mut config.tile);
            // level-0 files from this run carry the tile chunk size
            if pyramid.base_chunk.is_none() {
                config.pyramid.base_chunk_size = config.tile.chunk_size;
            }
            pyramid.apply(&mut config.pyramid);
        }
    }
    config.validate()?;

    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build worker pool")?;
    }

    info!(
        threads = rayon::current_num_threads(),
        "Starting lunar DEM preprocessing"
    );

    let mut summaries = Vec::new();
    match &args.command {
        Command::Tile {
            input_dir,
            output_dir,
            ..
        } => {
            summaries.push(batch::tile_directory(input_dir, output_dir, &config.tile)?);
        }
        Command::Pyramid { source_dir, .. } => {
            log_plan(&config.pyramid);
            summaries.push(batch::pyramid_directory(source_dir, &config.pyramid)?);
        }
        Command::Run {
            input_dir,
            output_dir,
            ..
        } => {
            summaries.push(batch::tile_directory(input_dir, output_dir, &config.tile)?);
            log_plan(&config.pyramid);
            summaries.push(batch::pyramid_directory(output_dir, &config.pyramid)?);
        }
    }

    if let Some(path) = &args.report {
        write_report(path, &summaries)?;
    }

    let failed: usize = summaries.iter().map(BatchSummary::failed).sum();
    if failed > 0 {
        bail!("{} file(s) failed", failed);
    }

    info!("Preprocessing complete");
    Ok(())
}
