//! 2x2 block averaging for pyramid levels.
//!
//! Averaging is done in f32 with a fixed summation order (top-left,
//! bottom-left, top-right, bottom-right) so that every level is
//! bit-reproducible for identical input.

use crate::error::{DemPyramidError, Result};
use crate::types::Raster;

/// Downsample a raster by a factor of 2 in each axis.
///
/// Each output cell is the mean of the corresponding non-overlapping 2x2
/// input block. Both input dimensions must be even.
pub fn downsample_2x(raster: &Raster) -> Result<Raster> {
    let (width, height) = (raster.width, raster.height);
    if width % 2 != 0 || height % 2 != 0 {
        return Err(DemPyramidError::shape(
            raster.data.len(),
            format!("even dimensions (got {}x{})", width, height),
        ));
    }

    let new_width = width / 2;
    let new_height = height / 2;
    let data = &raster.data;
    let mut output = Vec::with_capacity(new_width * new_height);

    for out_y in 0..new_height {
        let top = 2 * out_y * width;
        let bottom = top + width;
        for out_x in 0..new_width {
            let in_x = out_x * 2;
            output.push(mean_of_block(
                data[top + in_x],
                data[bottom + in_x],
                data[top + in_x + 1],
                data[bottom + in_x + 1],
            ));
        }
    }

    Raster::new(output, new_width, new_height)
}

/// Mean of a 2x2 block given as top-left, bottom-left, top-right, bottom-right.
#[inline]
fn mean_of_block(tl: f32, bl: f32, tr: f32, br: f32) -> f32 {
    0.25 * (((tl + bl) + tr) + br)
}
