//! Histogram equalization.
//!
//! A single histogram is pooled over the R, G and B samples of every pixel,
//! and the remap derived from its cumulative distribution is applied to all
//! three channels alike. Equalizing channels independently would give each
//! channel a different curve and shift hues; pooling keeps color balance.
//! Alpha is preserved.

use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;

use crate::config::DegeneratePolicy;
use crate::error::{EnhanceError, Result};
use crate::grid::{PixelGrid, ALPHA, CHANNELS, COLOR_CHANNELS};

/// Number of intensity levels of an 8-bit sample.
pub const LEVELS: usize = 256;

// ============================================================================
// Histogram / CDF
// ============================================================================

/// Intensity counts pooled over the R, G and B channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; LEVELS],
}

impl Histogram {
    /// Count every R, G and B sample of the grid. Alpha is ignored.
    pub fn from_grid(grid: &PixelGrid) -> Self {
        let input = grid.view();
        let (height, width, _) = input.dim();

        let counts = (0..height)
            .into_par_iter()
            .fold(
                || [0u64; LEVELS],
                |mut hist, y| {
                    for x in 0..width {
                        for c in 0..COLOR_CHANNELS {
                            hist[input[[y, x, c]] as usize] += 1;
                        }
                    }
                    hist
                },
            )
            .reduce(
                || [0u64; LEVELS],
                |mut a, b| {
                    for (dst, src) in a.iter_mut().zip(b.iter()) {
                        *dst += src;
                    }
                    a
                },
            );

        Self { counts }
    }

    pub fn counts(&self) -> &[u64; LEVELS] {
        &self.counts
    }

    /// Total number of samples counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Running prefix sum of the counts.
    pub fn cdf(&self) -> Cdf {
        let mut values = [0u64; LEVELS];
        let mut running = 0u64;
        for (dst, &count) in values.iter_mut().zip(self.counts.iter()) {
            running += count;
            *dst = running;
        }
        Cdf {
            values,
            first_level: self.counts.iter().position(|&n| n > 0),
        }
    }
}

/// Cumulative distribution of a [`Histogram`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cdf {
    values: [u64; LEVELS],
    /// Lowest intensity level with a non-zero count.
    first_level: Option<usize>,
}

impl Cdf {
    pub fn values(&self) -> &[u64; LEVELS] {
        &self.values
    }

    /// Build the 256-entry remap table.
    ///
    /// `lut[s] = round((cdf[s] - cdf_min) / (cdf[255] - cdf_min) * 255)`, where
    /// `cdf_min` is the CDF at the darkest occupied level. Returns `None` when
    /// that range is zero, i.e. the image holds a single intensity.
    pub fn lookup_table(&self) -> Option<[u8; LEVELS]> {
        let cdf_min = self.values[self.first_level?];
        let cdf_max = self.values[LEVELS - 1];
        let range = cdf_max - cdf_min;
        if range == 0 {
            return None;
        }

        let mut lut = [0u8; LEVELS];
        for (dst, &v) in lut.iter_mut().zip(self.values.iter()) {
            // Levels below the darkest occupied one never occur; saturate them to 0.
            let scaled = v.saturating_sub(cdf_min) as f64 / range as f64 * 255.0;
            *dst = scaled.round().clamp(0.0, 255.0) as u8;
        }
        Some(lut)
    }
}

// ============================================================================
// Equalization
// ============================================================================

/// Equalize with the default [`DegeneratePolicy`] (passthrough).
pub fn equalize(grid: &PixelGrid) -> Result<PixelGrid> {
    equalize_with_policy(grid, DegeneratePolicy::default())
}

/// Apply pooled histogram equalization.
///
/// # Arguments
/// * `grid` - RGBA input, left untouched
/// * `policy` - What to do when the image has a single intensity level
///
/// # Returns
/// Equalized grid of the same dimensions with alpha preserved
///
/// # Errors
/// `DegenerateInput` for a single-intensity image under
/// [`DegeneratePolicy::Reject`].
pub fn equalize_with_policy(grid: &PixelGrid, policy: DegeneratePolicy) -> Result<PixelGrid> {
    let hist = Histogram::from_grid(grid);

    let Some(lut) = hist.cdf().lookup_table() else {
        return match policy {
            DegeneratePolicy::Passthrough => {
                log::warn!(
                    "equalize: {}x{} image has zero dynamic range, leaving it unchanged",
                    grid.width(),
                    grid.height()
                );
                Ok(grid.clone())
            }
            DegeneratePolicy::Reject => Err(EnhanceError::DegenerateInput(format!(
                "{}x{} image has a single intensity level",
                grid.width(),
                grid.height()
            ))),
        };
    };

    let output = apply_lut(grid.view(), &lut)?;
    PixelGrid::from_array(output)
}

/// Remap R, G and B through `lut`, copying alpha.
fn apply_lut(input: ArrayView3<u8>, lut: &[u8; LEVELS]) -> Result<Array3<u8>> {
    let (height, width, _) = input.dim();

    let mut output_flat = vec![0u8; height * width * CHANNELS];
    output_flat
        .par_chunks_mut(width * CHANNELS)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                for c in 0..COLOR_CHANNELS {
                    row[x * CHANNELS + c] = lut[input[[y, x, c]] as usize];
                }
                row[x * CHANNELS + ALPHA] = input[[y, x, ALPHA]];
            }
        });

    Ok(Array3::from_shape_vec((height, width, CHANNELS), output_flat)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_grid(values: &[u8], width: usize, alpha: u8) -> PixelGrid {
        let height = values.len() / width;
        let mut img = Array3::<u8>::zeros((height, width, 4));
        for (i, &v) in values.iter().enumerate() {
            let (y, x) = (i / width, i % width);
            img[[y, x, 0]] = v;
            img[[y, x, 1]] = v;
            img[[y, x, 2]] = v;
            img[[y, x, 3]] = alpha;
        }
        PixelGrid::from_array(img).unwrap()
    }

    #[test]
    fn test_histogram_pools_rgb_and_ignores_alpha() {
        let mut img = Array3::<u8>::zeros((1, 2, 4));
        img[[0, 0, 0]] = 10;
        img[[0, 0, 1]] = 20;
        img[[0, 0, 2]] = 10;
        img[[0, 0, 3]] = 99;
        img[[0, 1, 0]] = 20;
        img[[0, 1, 1]] = 20;
        img[[0, 1, 2]] = 30;
        img[[0, 1, 3]] = 99;
        let grid = PixelGrid::from_array(img).unwrap();

        let hist = Histogram::from_grid(&grid);

        assert_eq!(hist.counts()[10], 2);
        assert_eq!(hist.counts()[20], 3);
        assert_eq!(hist.counts()[30], 1);
        assert_eq!(hist.counts()[99], 0);
        assert_eq!(hist.total(), 6);
    }

    #[test]
    fn test_cdf_is_monotonic_and_ends_at_total() {
        let grid = gray_grid(&[0, 50, 50, 200, 255, 7], 3, 255);
        let hist = Histogram::from_grid(&grid);
        let cdf = hist.cdf();

        assert!(cdf.values().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(cdf.values()[255], hist.total());
        assert_eq!(cdf.values()[0], 3);
    }

    #[test]
    fn test_equalize_stretches_to_full_range() {
        // Low contrast image: values 64-192
        let grid = gray_grid(&[64, 128, 160, 192], 2, 255);

        let result = equalize(&grid).unwrap();

        let reds: Vec<u8> = (0..2)
            .flat_map(|y| (0..2).map(move |x| (x, y)))
            .map(|(x, y)| result.pixel(x, y)[0])
            .collect();
        assert_eq!(*reds.iter().min().unwrap(), 0);
        assert_eq!(*reds.iter().max().unwrap(), 255);
        // cdf = 3, 6, 9, 12 -> (cdf - 3) / 9 * 255
        assert_eq!(reds, vec![0, 85, 170, 255]);
    }

    #[test]
    fn test_equalize_matches_cdf_formula_with_black_present() {
        // Level 0 is occupied, so cdf_min is cdf[0].
        let grid = gray_grid(&[0, 0, 100, 255], 2, 255);
        let result = equalize(&grid).unwrap();

        // pooled cdf: cdf[0] = 6, cdf[100] = 9, cdf[255] = 12
        assert_eq!(result.pixel(0, 0)[0], 0);
        assert_eq!(result.pixel(0, 1)[0], 128); // round(3 / 6 * 255) = round(127.5)
        assert_eq!(result.pixel(1, 1)[0], 255);
    }

    #[test]
    fn test_equalize_same_remap_for_all_channels() {
        let mut img = Array3::<u8>::zeros((1, 2, 4));
        img[[0, 0, 0]] = 40;
        img[[0, 0, 1]] = 80;
        img[[0, 0, 2]] = 120;
        img[[0, 1, 0]] = 120;
        img[[0, 1, 1]] = 80;
        img[[0, 1, 2]] = 40;
        let grid = PixelGrid::from_array(img).unwrap();

        let result = equalize(&grid).unwrap();

        let a = result.pixel(0, 0);
        let b = result.pixel(1, 0);
        assert_eq!(a[0], b[2]);
        assert_eq!(a[1], b[1]);
        assert_eq!(a[2], b[0]);
    }

    #[test]
    fn test_equalize_preserves_alpha_and_dims() {
        let mut img = Array3::<u8>::zeros((3, 2, 4));
        for y in 0..3 {
            for x in 0..2 {
                img[[y, x, 0]] = (y * 60 + x * 20) as u8;
                img[[y, x, 1]] = (x * 90) as u8;
                img[[y, x, 2]] = 17;
                img[[y, x, 3]] = (y * 100 + x) as u8;
            }
        }
        let grid = PixelGrid::from_array(img.clone()).unwrap();

        let result = equalize(&grid).unwrap();

        assert_eq!(result.width(), 2);
        assert_eq!(result.height(), 3);
        for y in 0..3 {
            for x in 0..2 {
                assert_eq!(result.pixel(x, y)[3], img[[y, x, 3]]);
            }
        }
        // Input is left untouched.
        assert_eq!(grid.into_array(), img);
    }

    #[test]
    fn test_flat_image_passthrough() {
        let grid = PixelGrid::filled(2, 2, [128, 128, 128, 255]).unwrap();

        let first = equalize_with_policy(&grid, DegeneratePolicy::Passthrough).unwrap();
        let second = equalize_with_policy(&grid, DegeneratePolicy::Passthrough).unwrap();

        assert_eq!(first, grid);
        assert_eq!(first, second);
    }

    #[test]
    fn test_flat_image_reject() {
        let grid = PixelGrid::filled(2, 2, [128, 128, 128, 255]).unwrap();

        for _ in 0..2 {
            let err = equalize_with_policy(&grid, DegeneratePolicy::Reject).unwrap_err();
            assert!(matches!(err, EnhanceError::DegenerateInput(_)));
        }
    }

    #[test]
    fn test_all_black_is_degenerate() {
        let grid = PixelGrid::filled(3, 1, [0, 0, 0, 10]).unwrap();
        assert!(Histogram::from_grid(&grid).cdf().lookup_table().is_none());
        assert_eq!(equalize(&grid).unwrap(), grid);
    }
}
