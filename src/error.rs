//! Error types shared by the grid, filters and pipeline.

use crate::io::OutputRole;

/// Boxed error produced by external collaborators (image sources and sinks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the enhancement core.
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    /// Malformed radius, amount, kernel, buffer length or grid size.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The input has no dynamic range to work with.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// The image source failed before the core saw any pixels.
    #[error("failed to acquire source image: {0}")]
    Acquisition(#[source] BoxError),

    /// A sink refused one of the produced grids.
    #[error("failed to emit {role} image: {source}")]
    Emit {
        role: OutputRole,
        #[source]
        source: BoxError,
    },

    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EnhanceError {
    /// True when the failure came from image acquisition rather than the core.
    pub fn is_acquisition(&self) -> bool {
        matches!(self, Self::Acquisition(_))
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<ndarray::ShapeError> for EnhanceError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::InvalidArgument(format!("buffer shape mismatch: {err}"))
    }
}

pub type Result<T, E = EnhanceError> = std::result::Result<T, E>;
