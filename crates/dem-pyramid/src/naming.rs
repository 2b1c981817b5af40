//! File name conventions for raw and chunked DEM files.
//!
//! Chunked files carry no header, so everything needed to interpret them is
//! encoded in the name:
//!
//! ```text
//! SLDEM2015_512_00N_30N_000_045_CHUNKED_512.DAT
//!               │   │   │   │           └── chunk size
//!               │   │   └───┴── longitude bounds (degrees east)
//!               └───┴── latitude bounds (N positive, S negative)
//! ```

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DemPyramidError, Result};
use crate::types::GeoSpan;

/// Suffix of the row-major rasters delivered by the data source.
pub const RAW_SUFFIX: &str = "_FLOAT.IMG";

/// Extension of chunk-major files.
pub const CHUNKED_EXTENSION: &str = "DAT";

/// Minimum number of `_`-separated tokens in a name carrying a span.
const MIN_SPAN_TOKENS: usize = 8;

static CHUNK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(_CHUNKED_)([0-9]+)").expect("chunk tag pattern is valid")
});

/// Extract the UTF-8 file name of a path.
pub fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DemPyramidError::format(path.display().to_string(), "no UTF-8 file name"))
}

fn parse_lat(name: &str, token: &str) -> Result<f64> {
    let (number, hemisphere) = match token.char_indices().last() {
        Some((idx, c)) => (&token[..idx], c.to_ascii_uppercase()),
        None => return Err(DemPyramidError::format(name, "empty latitude token")),
    };
    let sign = match hemisphere {
        'N' => 1.0,
        'S' => -1.0,
        other => {
            return Err(DemPyramidError::format(
                name,
                format!("latitude token {:?} ends in {:?}, expected N or S", token, other),
            ))
        }
    };
    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(sign * value),
        _ => Err(DemPyramidError::format(
            name,
            format!("latitude token {:?} is not a finite number", token),
        )),
    }
}

fn parse_lon(name: &str, token: &str) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(DemPyramidError::format(
            name,
            format!("longitude token {:?} is not a non-negative number", token),
        )),
    }
}

/// Parse the geographic span encoded in a file name.
///
/// Tokens 2 and 3 are latitude bounds, tokens 4 and 5 longitude bounds. A
/// second longitude smaller than the first wraps past 360 (`315`, `000` is a
/// 45 degree span).
pub fn parse_span(name: &str) -> Result<GeoSpan> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() < MIN_SPAN_TOKENS {
        return Err(DemPyramidError::format(
            name,
            format!(
                "expected at least {} '_'-separated tokens, found {}",
                MIN_SPAN_TOKENS,
                parts.len()
            ),
        ));
    }

    let lat_a = parse_lat(name, parts[2])?;
    let lat_b = parse_lat(name, parts[3])?;
    let lon_a = parse_lon(name, parts[4])?;
    let mut lon_b = parse_lon(name, parts[5])?;

    let lat_span = (lat_a - lat_b).abs();
    if lon_b < lon_a {
        lon_b += 360.0;
    }
    let lon_span = lon_b - lon_a;

    if !(lat_span > 0.0 && lon_span > 0.0) {
        return Err(DemPyramidError::format(
            name,
            format!("non-positive span (lat {}, lon {})", lat_span, lon_span),
        ));
    }

    Ok(GeoSpan::new(lat_span, lon_span))
}

/// Parse the chunk size from the first `_CHUNKED_<digits>` tag (case-insensitive).
pub fn parse_chunk_size(name: &str) -> Result<usize> {
    let caps = CHUNK_TAG
        .captures(name)
        .ok_or_else(|| DemPyramidError::format(name, "missing _CHUNKED_<size> tag"))?;
    caps[2].parse().map_err(|_| {
        DemPyramidError::format(name, format!("chunk size {:?} out of range", &caps[2]))
    })
}

/// Replace the digits of the first chunk-size tag, leaving every other character alone.
pub fn rewrite_chunk_size(name: &str, new_size: usize) -> Result<String> {
    if !CHUNK_TAG.is_match(name) {
        return Err(DemPyramidError::format(name, "missing _CHUNKED_<size> tag"));
    }
    Ok(CHUNK_TAG
        .replacen(name, 1, |caps: &regex::Captures| {
            format!("{}{}", &caps[1], new_size)
        })
        .into_owned())
}

/// [`rewrite_chunk_size`] applied to the file name of a path.
pub fn rewrite_chunk_size_in_path(path: &Path, new_size: usize) -> Result<PathBuf> {
    let renamed = rewrite_chunk_size(file_name(path)?, new_size)?;
    Ok(path.with_file_name(renamed))
}

/// Whether a directory entry is a raw row-major raster.
pub fn is_raw_raster_name(name: &str) -> bool {
    name.ends_with(RAW_SUFFIX)
}

/// Whether a directory entry is a chunk-major file.
pub fn is_chunked_name(name: &str) -> bool {
    let has_extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(CHUNKED_EXTENSION))
        .unwrap_or(false);
    has_extension && CHUNK_TAG.is_match(name)
}

/// Level-0 chunked file name for a raw raster name.
pub fn level0_name(raw_name: &str, chunk_size: usize) -> Result<String> {
    let stem = raw_name.strip_suffix(RAW_SUFFIX).ok_or_else(|| {
        DemPyramidError::format(raw_name, format!("expected a {} suffix", RAW_SUFFIX))
    })?;
    Ok(format!("{}_CHUNKED_{}.{}", stem, chunk_size, CHUNKED_EXTENSION))
}
