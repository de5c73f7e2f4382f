//! RGBA pixel grid shared by every transform.
//!
//! A grid is an `(height, width, 4)` array of 8-bit samples in row-major,
//! channel-interleaved order, which is the layout browsers hand out from a
//! canvas and numpy hands out for RGBA images. Construction validates the
//! shape, so the filters can index without re-checking.

use ndarray::{Array3, ArrayView3};

use crate::error::{EnhanceError, Result};

/// Number of interleaved channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Number of color channels; the remaining channel is alpha.
pub const COLOR_CHANNELS: usize = 3;

/// Index of the alpha channel.
pub const ALPHA: usize = 3;

/// Non-empty RGBA8 image buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    data: Array3<u8>,
}

impl PixelGrid {
    /// Wrap a flat RGBA buffer of `width * height * 4` bytes.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        check_dims(width, height)?;
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| EnhanceError::invalid(format!("{width}x{height} grid is too large")))?;
        if data.len() != expected {
            return Err(EnhanceError::invalid(format!(
                "buffer length {} does not match {width}x{height} RGBA ({expected} bytes)",
                data.len()
            )));
        }
        let data = Array3::from_shape_vec((height, width, CHANNELS), data)?;
        Ok(Self { data })
    }

    /// Take ownership of an `(height, width, 4)` array.
    pub fn from_array(array: Array3<u8>) -> Result<Self> {
        Self::from_view(array.view())
    }

    /// Copy an `(height, width, 4)` view, e.g. a borrowed numpy array.
    pub fn from_view(view: ArrayView3<u8>) -> Result<Self> {
        let (height, width, channels) = view.dim();
        if channels != CHANNELS {
            return Err(EnhanceError::invalid(format!(
                "expected {CHANNELS} channels (RGBA), got {channels}"
            )));
        }
        // Re-collect so the backing buffer is always contiguous and unsliced.
        Self::from_raw(width, height, view.iter().copied().collect())
    }

    /// Grid filled with a single RGBA value.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Result<Self> {
        check_dims(width, height)?;
        let data = Array3::from_shape_fn((height, width, CHANNELS), |(_, _, c)| rgba[c]);
        Ok(Self { data })
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// Length of the flat buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; grids are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// RGBA value at column `x`, row `y`. Panics if out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let px = self.data.slice(ndarray::s![y, x, ..]);
        [px[0], px[1], px[2], px[3]]
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    pub fn into_array(self) -> Array3<u8> {
        self.data
    }

    /// Flat RGBA bytes, row-major.
    pub fn into_raw(self) -> Vec<u8> {
        // The array is always built from an unsliced, standard-layout Vec.
        self.data.into_raw_vec_and_offset().0
    }
}

fn check_dims(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EnhanceError::invalid(format!(
            "grid dimensions must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}
