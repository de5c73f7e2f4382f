//! Convolution kernels.
//!
//! This module provides the weight matrices used by the convolution engine:
//! - Gaussian kernels sized by an integer radius
//! - Arbitrary user-supplied weight matrices
//!
//! Every kernel is square with an odd side, non-negative and normalized so
//! its weights sum to 1.0.

use ndarray::{Array2, ArrayView2};

use crate::error::{EnhanceError, Result};

/// Largest accepted kernel radius.
pub const MAX_RADIUS: usize = 512;

/// Normalized square weight matrix of side `2 * radius + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Array2<f32>,
    radius: usize,
    /// Normalized 1D factor when the kernel is an outer product of it with itself.
    separable: Option<Vec<f32>>,
}

/// Generate a normalized 1D Gaussian covering `[-radius, radius]`.
///
/// Sigma is `radius / 3`, so the kernel spans three standard deviations
/// on each side.
fn gaussian_kernel_1d(radius: usize) -> Vec<f32> {
    if radius == 0 {
        return vec![1.0];
    }

    let sigma = radius as f32 / 3.0;
    let r = radius as isize;

    let mut kernel: Vec<f32> = (-r..=r)
        .map(|i| {
            let x = i as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    // Normalize
    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }

    kernel
}

impl Kernel {
    /// Build a 2D Gaussian kernel of the given radius.
    ///
    /// Each weight is `exp(-(dx² + dy²) / (2σ²))` with `σ = radius / 3`,
    /// divided by the sum of all weights. Radius 0 gives the 1x1 identity
    /// kernel.
    ///
    /// # Errors
    /// `InvalidArgument` if `radius` exceeds [`MAX_RADIUS`].
    pub fn gaussian(radius: usize) -> Result<Self> {
        if radius > MAX_RADIUS {
            return Err(EnhanceError::invalid(format!(
                "kernel radius {radius} exceeds maximum of {MAX_RADIUS}"
            )));
        }

        // exp(-(x² + y²)) factors into exp(-x²)·exp(-y²) and the 2D sum is
        // the square of the 1D sum, so the outer product is already normalized.
        let k1d = gaussian_kernel_1d(radius);
        let size = k1d.len();
        let weights = Array2::from_shape_fn((size, size), |(y, x)| k1d[y] * k1d[x]);

        log::debug!("built {size}x{size} gaussian kernel (radius {radius})");

        Ok(Self {
            weights,
            radius,
            separable: Some(k1d),
        })
    }

    /// Build a Gaussian kernel from a signed radius as received from bindings.
    pub fn gaussian_signed(radius: i64) -> Result<Self> {
        let radius = usize::try_from(radius)
            .map_err(|_| EnhanceError::invalid(format!("kernel radius must be >= 0, got {radius}")))?;
        Self::gaussian(radius)
    }

    /// The 1x1 kernel with weight 1.0; convolving with it changes nothing.
    pub fn identity() -> Self {
        Self {
            weights: Array2::from_elem((1, 1), 1.0),
            radius: 0,
            separable: Some(vec![1.0]),
        }
    }

    /// Wrap an arbitrary weight matrix, normalizing it to sum 1.0.
    ///
    /// # Errors
    /// `InvalidArgument` if the matrix is empty, not square, has an even side,
    /// or holds negative or non-finite weights, or sums to zero.
    pub fn from_weights(weights: Array2<f32>) -> Result<Self> {
        let (rows, cols) = weights.dim();
        if rows == 0 || cols == 0 {
            return Err(EnhanceError::invalid("kernel is empty"));
        }
        if rows != cols || rows % 2 == 0 {
            return Err(EnhanceError::invalid(format!(
                "kernel must be square with an odd side, got {rows}x{cols}"
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EnhanceError::invalid(
                "kernel weights must be finite and non-negative",
            ));
        }
        let sum: f32 = weights.sum();
        if sum <= 0.0 {
            return Err(EnhanceError::invalid("kernel weights sum to zero"));
        }

        Ok(Self {
            weights: weights.mapv(|w| w / sum),
            radius: rows / 2,
            separable: None,
        })
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Side length, `2 * radius + 1`.
    pub fn side(&self) -> usize {
        2 * self.radius + 1
    }

    pub fn weights(&self) -> ArrayView2<'_, f32> {
        self.weights.view()
    }

    /// Weight of the tap at offset `(dx, dy)` from the center.
    ///
    /// Panics if the offset lies outside the kernel footprint.
    pub fn weight(&self, dx: isize, dy: isize) -> f32 {
        let r = self.radius as isize;
        self.weights[[(dy + r) as usize, (dx + r) as usize]]
    }

    /// The 1D factor for separable kernels.
    pub(crate) fn factor(&self) -> Option<&[f32]> {
        self.separable.as_deref()
    }
}
