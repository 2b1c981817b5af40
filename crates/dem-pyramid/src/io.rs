//! Sample encoding and atomic output files.

use std::borrow::Cow;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{DemPyramidError, IoContext, Result};

/// Decode little-endian f32 samples.
///
/// Trailing bytes that do not form a whole sample are ignored; callers
/// validate the length first.
pub fn decode_le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Decode little-endian f32 samples into `out`, one sample per 4 bytes.
///
/// Stops at the shorter of the two.
pub fn decode_le_into(bytes: &[u8], out: &mut [f32]) {
    for (dst, b) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *dst = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    }
}

/// Encode f32 samples as little-endian bytes, borrowing on little-endian hosts.
pub fn encode_le(samples: &[f32]) -> Cow<'_, [u8]> {
    if cfg!(target_endian = "little") {
        Cow::Borrowed(bytemuck::cast_slice(samples))
    } else {
        Cow::Owned(samples.iter().flat_map(|v| v.to_le_bytes()).collect())
    }
}

/// Size of a file in bytes.
pub fn file_len(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path).with_path(path)?.len())
}

/// An output file that only appears at its destination once fully written.
///
/// Data goes to a temporary file in the destination directory which is
/// renamed over the destination on [`AtomicOutput::commit`]. Dropping without
/// committing removes the temporary file.
pub struct AtomicOutput {
    writer: BufWriter<NamedTempFile>,
    dest: PathBuf,
    bytes_written: u64,
}

impl AtomicOutput {
    /// Create the temporary file next to `dest`, creating the directory if needed.
    pub fn create(dest: &Path) -> Result<Self> {
        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_path(&dir)?;
        let tmp = NamedTempFile::new_in(&dir).with_path(&dir)?;
        Ok(Self {
            writer: BufWriter::new(tmp),
            dest: dest.to_path_buf(),
            bytes_written: 0,
        })
    }

    /// Append raw bytes.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).with_path(&self.dest)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Append samples as little-endian f32.
    pub fn write_samples(&mut self, samples: &[f32]) -> Result<()> {
        self.write_all(&encode_le(samples))
    }

    /// Flush and move the file into place. Returns the number of bytes written.
    pub fn commit(self) -> Result<u64> {
        let dest = self.dest;
        let tmp = self
            .writer
            .into_inner()
            .map_err(|e| DemPyramidError::io(&dest, e.into_error()))?;
        tmp.persist(&dest)
            .map_err(|e| DemPyramidError::io(&dest, e.error))?;
        Ok(self.bytes_written)
    }
}

/// Write samples to `dest` atomically.
pub fn write_samples_atomic(dest: &Path, samples: &[f32]) -> Result<u64> {
    let mut out = AtomicOutput::create(dest)?;
    out.write_samples(samples)?;
    out.commit()
}
