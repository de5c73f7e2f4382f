//! Unsharp mask.
//!
//! The high-frequency residual (original minus a Gaussian-blurred copy) is
//! scaled by `amount` and added back, raising edge contrast. The blurred copy
//! is kept at full precision; only the final sample is rounded.

use super::convolve::{assemble, blur_planes, round_sample};
use super::core::Kernel;
use crate::error::{EnhanceError, Result};
use crate::grid::PixelGrid;

/// Apply unsharp masking with a Gaussian blur of the given radius.
///
/// # Arguments
/// * `grid` - RGBA input, left untouched
/// * `radius` - Gaussian kernel radius (sigma = radius / 3)
/// * `amount` - Strength; 0.0 returns the input unchanged
///
/// # Returns
/// Sharpened grid of the same dimensions with alpha preserved
pub fn unsharp_mask(grid: &PixelGrid, radius: usize, amount: f32) -> Result<PixelGrid> {
    check_amount(amount)?;
    let kernel = Kernel::gaussian(radius)?;
    unsharp_mask_with_kernel(grid, &kernel, amount)
}

/// Apply unsharp masking against a blur with a prebuilt kernel.
///
/// Each color sample becomes `round(o + (o - blurred) * amount)`, clamped to
/// 0-255.
pub fn unsharp_mask_with_kernel(grid: &PixelGrid, kernel: &Kernel, amount: f32) -> Result<PixelGrid> {
    check_amount(amount)?;

    let input = grid.view();
    let blurred = blur_planes(input, kernel)?;

    let output = assemble(input, |y, x, c| {
        let original = input[[y, x, c]] as f32;
        round_sample(original + (original - blurred[c][[y, x]]) * amount)
    })?;
    PixelGrid::from_array(output)
}

pub(crate) fn check_amount(amount: f32) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(EnhanceError::invalid(format!(
            "sharpen amount must be a finite value >= 0, got {amount}"
        )));
    }
    Ok(())
}
