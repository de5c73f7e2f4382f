//! RGBA contrast and sharpness enhancement.
//!
//! Takes an in-memory RGBA8 image and produces two alternative enhancements
//! of it: a histogram-equalized version and an unsharp-masked version.
//!
//! ## Image Format
//! Images are [`PixelGrid`]s: `(height, width, 4)` arrays of `u8` samples,
//! row-major with interleaved R, G, B, A. This is the layout of a browser
//! canvas `ImageData` buffer and of a numpy RGBA array, so both bindings pass
//! buffers through without reshuffling.
//!
//! ## Filter Architecture
//! Every filter reads its input grid and allocates a fresh output grid of the
//! same size; alpha is always copied unchanged. Decoding and display are left
//! to the caller through the [`ImageSource`] and [`ImageSink`] traits.
//!
//! ```no_run
//! use rgba_enhance::{Pipeline, PipelineConfig, PixelGrid};
//!
//! let grid = PixelGrid::from_raw(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255])?;
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let enhanced = pipeline.process(&grid)?;
//! println!("{:?}", enhanced.sharpened.pixel(0, 0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod filters;
pub mod grid;
pub mod io;
pub mod pipeline;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{load_config, DegeneratePolicy, PipelineConfig, UnsharpParams};
pub use error::{BoxError, EnhanceError, Result};
pub use filters::convolve::convolve;
pub use filters::core::{Kernel, MAX_RADIUS};
pub use filters::equalize::{equalize, equalize_with_policy, Cdf, Histogram};
pub use filters::sharpen::{unsharp_mask, unsharp_mask_with_kernel};
pub use grid::PixelGrid;
pub use io::{ImageSink, ImageSource, MemorySink, OutputRole};
pub use pipeline::{process, Enhanced, Pipeline, ProcessError, RunError};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::config::{DegeneratePolicy, PipelineConfig, UnsharpParams};
    use crate::filters::convolve::convolve;
    use crate::filters::core::Kernel;
    use crate::filters::equalize::equalize_with_policy;
    use crate::filters::sharpen::unsharp_mask_with_kernel;
    use crate::grid::PixelGrid;
    use crate::pipeline::Pipeline;

    fn value_error(err: impl std::fmt::Display) -> PyErr {
        PyValueError::new_err(err.to_string())
    }

    fn policy(reject_flat: bool) -> DegeneratePolicy {
        if reject_flat {
            DegeneratePolicy::Reject
        } else {
            DegeneratePolicy::Passthrough
        }
    }

    /// Histogram-equalize an RGBA u8 image with one pooled RGB histogram.
    ///
    /// Raises ValueError for a single-intensity image when `reject_flat` is set.
    #[pyfunction]
    #[pyo3(signature = (image, reject_flat=false))]
    pub fn equalize_rgba<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        reject_flat: bool,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let grid = PixelGrid::from_view(image.as_array()).map_err(value_error)?;
        let result = equalize_with_policy(&grid, policy(reject_flat)).map_err(value_error)?;
        Ok(result.into_array().into_pyarray(py))
    }

    /// Gaussian blur with border renormalization (sigma = radius / 3).
    #[pyfunction]
    #[pyo3(signature = (image, radius=3))]
    pub fn gaussian_blur_rgba<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        radius: i64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let grid = PixelGrid::from_view(image.as_array()).map_err(value_error)?;
        let kernel = Kernel::gaussian_signed(radius).map_err(value_error)?;
        let result = convolve(&grid, &kernel).map_err(value_error)?;
        Ok(result.into_array().into_pyarray(py))
    }

    /// Unsharp mask: `o + (o - blur(o)) * amount`, alpha preserved.
    #[pyfunction]
    #[pyo3(signature = (image, radius=3, amount=2.0))]
    pub fn unsharp_mask_rgba<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        radius: i64,
        amount: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let grid = PixelGrid::from_view(image.as_array()).map_err(value_error)?;
        let kernel = Kernel::gaussian_signed(radius).map_err(value_error)?;
        let result = unsharp_mask_with_kernel(&grid, &kernel, amount).map_err(value_error)?;
        Ok(result.into_array().into_pyarray(py))
    }

    /// Run both enhancements on the same image.
    ///
    /// Returns `(equalized, sharpened)`.
    #[pyfunction]
    #[pyo3(signature = (image, radius=3, amount=2.0, reject_flat=false))]
    pub fn enhance_rgba<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        radius: i64,
        amount: f32,
        reject_flat: bool,
    ) -> PyResult<(Bound<'py, PyArray3<u8>>, Bound<'py, PyArray3<u8>>)> {
        let radius = usize::try_from(radius)
            .map_err(|_| value_error(format!("radius must be >= 0, got {radius}")))?;
        let pipeline = Pipeline::new(PipelineConfig {
            unsharp: UnsharpParams { radius, amount },
            degenerate: policy(reject_flat),
        })
        .map_err(value_error)?;

        let grid = PixelGrid::from_view(image.as_array()).map_err(value_error)?;
        let enhanced = pipeline.process(&grid).map_err(value_error)?;
        Ok((
            enhanced.equalized.into_array().into_pyarray(py),
            enhanced.sharpened.into_array().into_pyarray(py),
        ))
    }

    /// rgba_enhance Rust extension module
    #[pymodule]
    pub fn rgba_enhance(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(equalize_rgba, m)?)?;
        m.add_function(wrap_pyfunction!(gaussian_blur_rgba, m)?)?;
        m.add_function(wrap_pyfunction!(unsharp_mask_rgba, m)?)?;
        m.add_function(wrap_pyfunction!(enhance_rgba, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::rgba_enhance;
