//! WebAssembly exports.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. They take and
//! return the flat RGBA byte buffer of a canvas `ImageData`
//! (length = width * height * 4), so a page can call them straight from
//! `getImageData` and hand the result to `putImageData`.

use wasm_bindgen::prelude::*;

use crate::config::DegeneratePolicy;
use crate::filters::convolve::convolve;
use crate::filters::core::Kernel;
use crate::filters::equalize::equalize_with_policy;
use crate::filters::sharpen::unsharp_mask_with_kernel;
use crate::grid::PixelGrid;

fn js_error(err: crate::error::EnhanceError) -> JsError {
    JsError::new(&err.to_string())
}

// ============================================================================
// Histogram Equalization
// ============================================================================

/// Histogram-equalize an RGBA image using one pooled RGB histogram.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `reject_flat` - Throw instead of returning a single-intensity image unchanged
///
/// # Returns
/// Flat array of RGBA bytes, alpha preserved
#[wasm_bindgen]
pub fn equalize_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    reject_flat: bool,
) -> Result<Vec<u8>, JsError> {
    let grid = PixelGrid::from_raw(width, height, data.to_vec()).map_err(js_error)?;
    let policy = if reject_flat {
        DegeneratePolicy::Reject
    } else {
        DegeneratePolicy::Passthrough
    };
    let result = equalize_with_policy(&grid, policy).map_err(js_error)?;
    Ok(result.into_raw())
}

// ============================================================================
// Gaussian Blur / Unsharp Mask
// ============================================================================

/// Gaussian blur with border renormalization (sigma = radius / 3).
#[wasm_bindgen]
pub fn gaussian_blur_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    radius: i32,
) -> Result<Vec<u8>, JsError> {
    let grid = PixelGrid::from_raw(width, height, data.to_vec()).map_err(js_error)?;
    let kernel = Kernel::gaussian_signed(radius as i64).map_err(js_error)?;
    let result = convolve(&grid, &kernel).map_err(js_error)?;
    Ok(result.into_raw())
}

/// Unsharp mask an RGBA image.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `radius` - Gaussian radius (3 in the default setup)
/// * `amount` - Sharpening strength (2.0 in the default setup)
///
/// # Returns
/// Flat array of RGBA bytes, alpha preserved
#[wasm_bindgen]
pub fn unsharp_mask_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    radius: i32,
    amount: f32,
) -> Result<Vec<u8>, JsError> {
    let grid = PixelGrid::from_raw(width, height, data.to_vec()).map_err(js_error)?;
    let kernel = Kernel::gaussian_signed(radius as i64).map_err(js_error)?;
    let result = unsharp_mask_with_kernel(&grid, &kernel, amount).map_err(js_error)?;
    Ok(result.into_raw())
}
