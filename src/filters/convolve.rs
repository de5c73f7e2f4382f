//! Windowed convolution with clipped, renormalized borders.
//!
//! The grid is first split into its R, G and B planes; each plane is then
//! convolved spatially into an `f32` plane. Kernel taps that land outside the
//! image are skipped and the result is divided by the weight of the taps that
//! remained, so border pixels are not darkened by missing neighbors.
//!
//! ## Performance
//!
//! Rows are processed in parallel with Rayon. Gaussian kernels run as a
//! horizontal and a vertical 1D pass: the in-bounds part of the footprint is
//! always a rectangle, so clipping and renormalizing each pass separately
//! gives the same result as the full 2D window.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

use super::core::Kernel;
use crate::error::Result;
use crate::grid::{PixelGrid, ALPHA, CHANNELS, COLOR_CHANNELS};

/// Blurred, un-rounded R, G and B planes of a grid.
pub type Planes = [Array2<f32>; COLOR_CHANNELS];

/// Convolve the R, G and B channels of `grid` with `kernel`.
///
/// # Returns
/// New grid of the same dimensions; each color sample is the locally
/// renormalized weighted mean, rounded to the nearest integer. Alpha is
/// copied unchanged.
pub fn convolve(grid: &PixelGrid, kernel: &Kernel) -> Result<PixelGrid> {
    let planes = blur_planes(grid.view(), kernel)?;
    let input = grid.view();

    let output = assemble(input, |y, x, c| round_sample(planes[c][[y, x]]))?;
    PixelGrid::from_array(output)
}

/// Convolve each color plane of `input`, keeping full precision.
pub fn blur_planes(input: ArrayView3<u8>, kernel: &Kernel) -> Result<Planes> {
    let plane = |c: usize| -> Result<Array2<f32>> {
        let channel = input.index_axis(Axis(2), c);
        match kernel.factor() {
            Some(k1d) => convolve_plane_separable(channel, k1d),
            None => convolve_plane(channel, kernel),
        }
    };
    Ok([plane(0)?, plane(1)?, plane(2)?])
}

/// Full 2D convolution of one plane with border clipping.
pub fn convolve_plane(plane: ArrayView2<u8>, kernel: &Kernel) -> Result<Array2<f32>> {
    let (height, width) = plane.dim();
    let r = kernel.radius() as isize;

    let mut output_flat = vec![0.0f32; height * width];
    output_flat
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as isize;
            let ky_start = (-r).max(-y);
            let ky_end = r.min(height as isize - 1 - y);

            for (x, out) in row.iter_mut().enumerate() {
                let x = x as isize;
                let kx_start = (-r).max(-x);
                let kx_end = r.min(width as isize - 1 - x);

                let mut sum = 0.0f32;
                let mut weight_sum = 0.0f32;
                for ky in ky_start..=ky_end {
                    let sy = (y + ky) as usize;
                    for kx in kx_start..=kx_end {
                        let sx = (x + kx) as usize;
                        let w = kernel.weight(kx, ky);
                        sum += plane[[sy, sx]] as f32 * w;
                        weight_sum += w;
                    }
                }

                *out = normalize(sum, weight_sum, plane[[y as usize, x as usize]]);
            }
        });

    Ok(Array2::from_shape_vec((height, width), output_flat)?)
}

/// Separable convolution of one plane: horizontal pass then vertical pass.
fn convolve_plane_separable(plane: ArrayView2<u8>, k1d: &[f32]) -> Result<Array2<f32>> {
    let (height, width) = plane.dim();
    let r = (k1d.len() / 2) as isize;

    // Horizontal pass
    let mut temp_flat = vec![0.0f32; height * width];
    temp_flat
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let xi = x as isize;
                let start = (-r).max(-xi);
                let end = r.min(width as isize - 1 - xi);

                let mut sum = 0.0f32;
                let mut weight_sum = 0.0f32;
                for k in start..=end {
                    let w = k1d[(k + r) as usize];
                    sum += plane[[y, (xi + k) as usize]] as f32 * w;
                    weight_sum += w;
                }
                *out = normalize(sum, weight_sum, plane[[y, x]]);
            }
        });

    let temp = Array2::from_shape_vec((height, width), temp_flat)?;

    // Vertical pass
    let mut output_flat = vec![0.0f32; height * width];
    output_flat
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let yi = y as isize;
            let start = (-r).max(-yi);
            let end = r.min(height as isize - 1 - yi);

            for (x, out) in row.iter_mut().enumerate() {
                let mut sum = 0.0f32;
                let mut weight_sum = 0.0f32;
                for k in start..=end {
                    let w = k1d[(k + r) as usize];
                    sum += temp[[(yi + k) as usize, x]] * w;
                    weight_sum += w;
                }
                *out = if weight_sum > 0.0 {
                    sum / weight_sum
                } else {
                    temp[[y, x]]
                };
            }
        });

    Ok(Array2::from_shape_vec((height, width), output_flat)?)
}

/// Divide by the in-bounds weight. The center tap is always in bounds, so
/// `weight_sum` only reaches zero for kernels whose center weight underflows;
/// fall back to the source sample then.
#[inline]
fn normalize(sum: f32, weight_sum: f32, center: u8) -> f32 {
    if weight_sum > 0.0 {
        sum / weight_sum
    } else {
        center as f32
    }
}

/// Round and clamp a computed sample into the u8 range.
#[inline]
pub(crate) fn round_sample(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Build an RGBA array whose color samples come from `color(y, x, c)` and
/// whose alpha is copied from `input`.
pub(crate) fn assemble<F>(input: ArrayView3<u8>, color: F) -> Result<Array3<u8>>
where
    F: Fn(usize, usize, usize) -> u8 + Sync,
{
    let (height, width, _) = input.dim();

    let mut output_flat = vec![0u8; height * width * CHANNELS];
    output_flat
        .par_chunks_mut(width * CHANNELS)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                for c in 0..COLOR_CHANNELS {
                    row[x * CHANNELS + c] = color(y, x, c);
                }
                row[x * CHANNELS + ALPHA] = input[[y, x, ALPHA]];
            }
        });

    Ok(Array3::from_shape_vec((height, width, CHANNELS), output_flat)?)
}
