//! Enhancement pipeline: one source grid in, an equalized and a sharpened
//! grid out.
//!
//! Both results are derived from the same original. Sharpening does not run
//! on the equalized image; the two outputs are alternative enhancements.

use std::time::Instant;

use log::debug;

use crate::config::PipelineConfig;
use crate::error::{EnhanceError, Result};
use crate::filters::core::Kernel;
use crate::filters::equalize::equalize_with_policy;
use crate::filters::sharpen::unsharp_mask_with_kernel;
use crate::grid::PixelGrid;
use crate::io::{ImageSink, ImageSource, OutputRole};

/// The two enhanced versions of a source grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enhanced {
    pub equalized: PixelGrid,
    pub sharpened: PixelGrid,
}

/// Failure of one or both enhancement stages.
///
/// Partial failures carry the grid the other stage produced.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("equalization failed: {source}")]
    Equalize {
        #[source]
        source: EnhanceError,
        sharpened: PixelGrid,
    },

    #[error("sharpening failed: {source}")]
    Sharpen {
        #[source]
        source: EnhanceError,
        equalized: PixelGrid,
    },

    #[error("equalization failed: {equalize}; sharpening failed: {sharpen}")]
    Both {
        equalize: EnhanceError,
        sharpen: EnhanceError,
    },
}

impl ProcessError {
    /// True when one of the two results is still available.
    pub fn is_partial(&self) -> bool {
        !matches!(self, Self::Both { .. })
    }

    pub fn equalized(&self) -> Option<&PixelGrid> {
        match self {
            Self::Sharpen { equalized, .. } => Some(equalized),
            _ => None,
        }
    }

    pub fn sharpened(&self) -> Option<&PixelGrid> {
        match self {
            Self::Equalize { sharpened, .. } => Some(sharpened),
            _ => None,
        }
    }
}

/// Failure of [`Pipeline::run`].
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Acquisition or emission failed.
    #[error(transparent)]
    Io(#[from] EnhanceError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl RunError {
    /// True when the source failed before any processing happened.
    pub fn is_acquisition(&self) -> bool {
        matches!(self, Self::Io(e) if e.is_acquisition())
    }
}

/// Configured enhancement pipeline. The blur kernel is built once.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    kernel: Kernel,
}

impl Pipeline {
    /// Validate `config` and prepare the kernel.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let kernel = Kernel::gaussian(config.unsharp.radius)?;
        Ok(Self { config, kernel })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Equalize and sharpen `grid` independently.
    ///
    /// The stages run concurrently; neither reads the other's output.
    pub fn process(&self, grid: &PixelGrid) -> Result<Enhanced, ProcessError> {
        let start = Instant::now();

        let (equalized, sharpened) = rayon::join(
            || {
                let t0 = Instant::now();
                let out = equalize_with_policy(grid, self.config.degenerate);
                debug!(
                    "Pipeline::process equalize {:.3} ms",
                    t0.elapsed().as_secs_f64() * 1000.0
                );
                out
            },
            || {
                let t0 = Instant::now();
                let out = unsharp_mask_with_kernel(grid, &self.kernel, self.config.unsharp.amount);
                debug!(
                    "Pipeline::process unsharp radius={} amount={} {:.3} ms",
                    self.config.unsharp.radius,
                    self.config.unsharp.amount,
                    t0.elapsed().as_secs_f64() * 1000.0
                );
                out
            },
        );

        debug!(
            "Pipeline::process {}x{} total {:.3} ms",
            grid.width(),
            grid.height(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        match (equalized, sharpened) {
            (Ok(equalized), Ok(sharpened)) => Ok(Enhanced {
                equalized,
                sharpened,
            }),
            (Err(source), Ok(sharpened)) => Err(ProcessError::Equalize { source, sharpened }),
            (Ok(equalized), Err(source)) => Err(ProcessError::Sharpen { source, equalized }),
            (Err(equalize), Err(sharpen)) => Err(ProcessError::Both { equalize, sharpen }),
        }
    }

    /// Acquire a grid, enhance it and hand every result to `sink`.
    ///
    /// The sink receives the original first, then each produced result once.
    /// When only one stage succeeds its grid is still emitted before the
    /// error is returned.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<Enhanced, RunError>
    where
        S: ImageSource + ?Sized,
        K: ImageSink + ?Sized,
    {
        let original = source.acquire().map_err(EnhanceError::Acquisition)?;
        debug!(
            "Pipeline::run acquired {}x{} grid",
            original.width(),
            original.height()
        );
        emit(sink, OutputRole::Original, &original)?;

        match self.process(&original) {
            Ok(enhanced) => {
                emit(sink, OutputRole::Equalized, &enhanced.equalized)?;
                emit(sink, OutputRole::Sharpened, &enhanced.sharpened)?;
                Ok(enhanced)
            }
            Err(err) => {
                if let Some(grid) = err.equalized() {
                    emit(sink, OutputRole::Equalized, grid)?;
                }
                if let Some(grid) = err.sharpened() {
                    emit(sink, OutputRole::Sharpened, grid)?;
                }
                Err(err.into())
            }
        }
    }
}

fn emit<K>(sink: &mut K, role: OutputRole, grid: &PixelGrid) -> Result<()>
where
    K: ImageSink + ?Sized,
{
    sink.accept(role, grid)
        .map_err(|source| EnhanceError::Emit { role, source })
}

/// Enhance `grid` with the default configuration (radius 3, amount 2.0).
pub fn process(grid: &PixelGrid) -> Result<Enhanced, ProcessError> {
    // The default config is always valid, so only a kernel failure could
    // surface here; report it against both stages.
    match Pipeline::new(PipelineConfig::default()) {
        Ok(pipeline) => pipeline.process(grid),
        Err(err) => Err(ProcessError::Both {
            equalize: EnhanceError::invalid(err.to_string()),
            sharpen: err,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DegeneratePolicy, UnsharpParams};
    use crate::error::BoxError;
    use crate::filters::equalize::equalize;
    use crate::filters::sharpen::unsharp_mask;
    use crate::io::MemorySink;
    use ndarray::Array3;

    fn gradient(width: usize, height: usize) -> PixelGrid {
        let mut img = Array3::<u8>::zeros((height, width, 4));
        for y in 0..height {
            for x in 0..width {
                img[[y, x, 0]] = (x * 255 / width.max(1)) as u8;
                img[[y, x, 1]] = (y * 255 / height.max(1)) as u8;
                img[[y, x, 2]] = ((x * 7 + y * 3) % 64 + 96) as u8;
                img[[y, x, 3]] = 255 - (x % 3) as u8;
            }
        }
        PixelGrid::from_array(img).unwrap()
    }

    fn reject_config() -> PipelineConfig {
        PipelineConfig {
            degenerate: DegeneratePolicy::Reject,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_outputs_are_independent_of_each_other() {
        let grid = gradient(12, 9);
        let enhanced = process(&grid).unwrap();

        assert_eq!(enhanced.equalized, equalize(&grid).unwrap());
        // Sharpening runs on the original, not on the equalized grid.
        assert_eq!(enhanced.sharpened, unsharp_mask(&grid, 3, 2.0).unwrap());
        assert_ne!(enhanced.sharpened, unsharp_mask(&enhanced.equalized, 3, 2.0).unwrap());
    }

    #[test]
    fn test_process_is_deterministic() {
        let grid = gradient(16, 10);
        let first = process(&grid).unwrap();
        let second = process(&grid).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.equalized.into_raw(),
            second.equalized.into_raw()
        );
    }

    #[test]
    fn test_custom_params_are_used() {
        let grid = gradient(10, 10);
        let pipeline = Pipeline::new(PipelineConfig {
            unsharp: UnsharpParams {
                radius: 1,
                amount: 0.0,
            },
            ..PipelineConfig::default()
        })
        .unwrap();

        let enhanced = pipeline.process(&grid).unwrap();
        assert_eq!(enhanced.sharpened, grid);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PipelineConfig {
            unsharp: UnsharpParams {
                radius: 3,
                amount: f32::NAN,
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Pipeline::new(config),
            Err(EnhanceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_partial_failure_keeps_sharpened() {
        let grid = PixelGrid::filled(2, 2, [128, 128, 128, 255]).unwrap();
        let pipeline = Pipeline::new(reject_config()).unwrap();

        let err = pipeline.process(&grid).unwrap_err();

        assert!(err.is_partial());
        assert!(matches!(
            err,
            ProcessError::Equalize {
                source: EnhanceError::DegenerateInput(_),
                ..
            }
        ));
        assert_eq!(err.sharpened(), Some(&grid));
        assert!(err.equalized().is_none());
    }

    #[test]
    fn test_flat_image_passthrough_by_default() {
        let grid = PixelGrid::filled(2, 2, [128, 128, 128, 255]).unwrap();
        let enhanced = process(&grid).unwrap();
        assert_eq!(enhanced.equalized, grid);
        assert_eq!(enhanced.sharpened, grid);
    }

    #[test]
    fn test_run_emits_each_result_once() {
        let grid = gradient(8, 6);
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let mut source = {
            let grid = grid.clone();
            move || -> Result<PixelGrid, BoxError> { Ok(grid.clone()) }
        };
        let mut sink = MemorySink::new();

        let enhanced = pipeline.run(&mut source, &mut sink).unwrap();

        assert_eq!(sink.calls(), 3);
        assert_eq!(sink.get(OutputRole::Original), Some(&grid));
        assert_eq!(sink.get(OutputRole::Equalized), Some(&enhanced.equalized));
        assert_eq!(sink.get(OutputRole::Sharpened), Some(&enhanced.sharpened));
    }

    #[test]
    fn test_run_reports_acquisition_failure() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let mut source = || -> Result<PixelGrid, BoxError> { Err("CORS rejected".into()) };
        let mut sink = MemorySink::new();

        let err = pipeline.run(&mut source, &mut sink).unwrap_err();

        assert!(err.is_acquisition());
        assert_eq!(sink.calls(), 0);
    }

    #[test]
    fn test_run_emits_partial_result() {
        let grid = PixelGrid::filled(3, 3, [7, 7, 7, 255]).unwrap();
        let pipeline = Pipeline::new(reject_config()).unwrap();
        let mut source = {
            let grid = grid.clone();
            move || -> Result<PixelGrid, BoxError> { Ok(grid.clone()) }
        };
        let mut sink = MemorySink::new();

        let err = pipeline.run(&mut source, &mut sink).unwrap_err();

        assert!(matches!(err, RunError::Process(ref e) if e.is_partial()));
        assert!(!err.is_acquisition());
        assert_eq!(sink.calls(), 2);
        assert!(sink.get(OutputRole::Equalized).is_none());
        assert_eq!(sink.get(OutputRole::Sharpened), Some(&grid));
    }

    #[test]
    fn test_run_reports_sink_failure() {
        let grid = gradient(4, 4);
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let mut source = move || -> Result<PixelGrid, BoxError> { Ok(grid.clone()) };
        let mut sink = |role: OutputRole, _: &PixelGrid| -> Result<(), BoxError> {
            if role == OutputRole::Sharpened {
                Err("disk full".into())
            } else {
                Ok(())
            }
        };

        let err = pipeline.run(&mut source, &mut sink).unwrap_err();

        assert!(matches!(
            err,
            RunError::Io(EnhanceError::Emit {
                role: OutputRole::Sharpened,
                ..
            })
        ));
    }
}
