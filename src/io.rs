//! Boundaries to the image source and the display/storage sinks.
//!
//! Decoding and presentation live outside this crate. A source hands over
//! one [`PixelGrid`]; a sink receives each produced grid exactly once,
//! tagged with its [`OutputRole`].

use std::collections::BTreeMap;
use std::fmt;

use crate::error::BoxError;
use crate::grid::PixelGrid;

/// Which result a grid handed to a sink represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputRole {
    /// The untouched source image.
    Original,
    Equalized,
    Sharpened,
}

impl fmt::Display for OutputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputRole::Original => write!(f, "original"),
            OutputRole::Equalized => write!(f, "equalized"),
            OutputRole::Sharpened => write!(f, "sharpened"),
        }
    }
}

/// Provides the source image, e.g. by decoding a file or a network resource.
pub trait ImageSource {
    fn acquire(&mut self) -> Result<PixelGrid, BoxError>;
}

impl<F> ImageSource for F
where
    F: FnMut() -> Result<PixelGrid, BoxError>,
{
    fn acquire(&mut self) -> Result<PixelGrid, BoxError> {
        self()
    }
}

/// Accepts produced grids for display or persistence.
pub trait ImageSink {
    fn accept(&mut self, role: OutputRole, grid: &PixelGrid) -> Result<(), BoxError>;
}

impl<F> ImageSink for F
where
    F: FnMut(OutputRole, &PixelGrid) -> Result<(), BoxError>,
{
    fn accept(&mut self, role: OutputRole, grid: &PixelGrid) -> Result<(), BoxError> {
        self(role, grid)
    }
}

/// Sink that keeps a copy of every grid it receives, keyed by role.
#[derive(Debug, Default)]
pub struct MemorySink {
    grids: BTreeMap<OutputRole, PixelGrid>,
    calls: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, role: OutputRole) -> Option<&PixelGrid> {
        self.grids.get(&role)
    }

    pub fn take(&mut self, role: OutputRole) -> Option<PixelGrid> {
        self.grids.remove(&role)
    }

    /// Number of `accept` calls received.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl ImageSink for MemorySink {
    fn accept(&mut self, role: OutputRole, grid: &PixelGrid) -> Result<(), BoxError> {
        self.calls += 1;
        self.grids.insert(role, grid.clone());
        Ok(())
    }
}
