//! Filter modules for RGBA8 pixel grids.
//!
//! ## Architecture
//!
//! All filters follow these principles:
//! - **Non-destructive** - The input grid is only read; a new grid is returned
//! - **Alpha preservation** - Only R, G and B are transformed
//! - **Fail fast** - Invalid parameters produce an error, never NaN-derived samples
//! - **Thread-safe** - Rows are processed in parallel with rayon
//!
//! ## Filter Categories
//!
//! - **Kernels**: Gaussian and user-supplied weight matrices (`core`)
//! - **Tonal**: pooled histogram equalization (`equalize`)
//! - **Convolution**: clipped, renormalized windowed mean (`convolve`)
//! - **Sharpen**: unsharp mask (`sharpen`)

pub mod core;
pub mod convolve;
pub mod equalize;
pub mod sharpen;
