//! Render configuration.

use log::debug;

use crate::{
    bitmap::Bitmap,
    dispatch::{self, Strategy, Workers},
    error::Result,
    kernel::{self, reference},
    scheduler::{BatchShape, BandStats, RowScheduler},
    viewport::Viewport,
};

/// Float width of the kernel, which fixes its lane layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Precision {
    /// 4 × `f64` lanes, 4 groups as a 2 × 2 tile.
    #[default]
    Double,
    /// 8 × `f32` lanes, 2 groups stacked over 2 rows.
    Single,
}

const DOUBLE_LANES: usize = 4;
const DOUBLE_GROUPS: usize = 4;
const SINGLE_LANES: usize = 8;
const SINGLE_GROUPS: usize = 2;

impl Precision {
    pub fn lanes(self) -> usize {
        match self {
            Precision::Double => DOUBLE_LANES,
            Precision::Single => SINGLE_LANES,
        }
    }

    pub fn batch_shape(self) -> BatchShape {
        match self {
            Precision::Double => BatchShape {
                columns: 2,
                rows: 2,
            },
            Precision::Single => BatchShape {
                columns: 1,
                rows: 2,
            },
        }
    }

    /// Pixels per batch row; `dim` must be a multiple of this.
    pub fn batch_width(self) -> usize {
        self.lanes() * self.batch_shape().columns
    }
}

enum Scheduler {
    Double(RowScheduler<f64, DOUBLE_LANES, DOUBLE_GROUPS>),
    Single(RowScheduler<f32, SINGLE_LANES, SINGLE_GROUPS>),
}

pub struct Builder {
    dim: usize,
    max_iterations: usize,
    bounds: (f64, f64, f64, f64),
    precision: Precision,
    coherence: bool,
    strategy: Strategy,
}

impl Builder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            max_iterations: kernel::DEFAULT_MAX_ITERATIONS,
            bounds: Viewport::DEFAULT_BOUNDS,
            precision: Precision::default(),
            coherence: true,
            strategy: Strategy::default(),
        }
    }

    pub fn with_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// `(min_x, min_y, max_x, max_y)` of the viewport.
    pub fn with_bounds(mut self, bounds: (f64, f64, f64, f64)) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_coherence(mut self, coherence: bool) -> Self {
        self.coherence = coherence;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Validates the configuration and starts the worker pool. Nothing is computed yet.
    pub fn create(self) -> Result<Renderer> {
        let (min_x, min_y, max_x, max_y) = self.bounds;
        let viewport = Viewport::new(min_x, min_y, max_x, max_y, self.dim)?;

        let shape = self.precision.batch_shape();
        let scheduler = match self.precision {
            Precision::Double => Scheduler::Double(RowScheduler::new(
                viewport,
                self.max_iterations,
                shape,
                self.coherence,
            )?),
            Precision::Single => Scheduler::Single(RowScheduler::new(
                viewport,
                self.max_iterations,
                shape,
                self.coherence,
            )?),
        };
        let workers = Workers::new(self.strategy)?;

        Ok(Renderer {
            viewport,
            max_iterations: self.max_iterations,
            precision: self.precision,
            strategy: self.strategy,
            scheduler,
            workers,
        })
    }
}

pub struct Renderer {
    viewport: Viewport,
    max_iterations: usize,
    precision: Precision,
    strategy: Strategy,
    scheduler: Scheduler,
    workers: Workers,
}

impl Renderer {
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Threads rendering runs on, fixed when the renderer was created.
    pub fn worker_threads(&self) -> usize {
        self.workers.threads()
    }

    pub fn render(&self) -> Bitmap {
        self.render_with_stats().0
    }

    pub fn render_with_stats(&self) -> (Bitmap, BandStats) {
        debug!(
            "rendering {}x{} ({} iterations, {:?})",
            self.viewport.dim(), self.viewport.dim(), self.max_iterations, self.precision
        );
        let mut bitmap = Bitmap::new(self.viewport.dim());
        let stats = match &self.scheduler {
            Scheduler::Double(scheduler) => dispatch::dispatch(scheduler, &mut bitmap, &self.workers),
            Scheduler::Single(scheduler) => dispatch::dispatch(scheduler, &mut bitmap, &self.workers),
        };
        (bitmap, stats)
    }

    /// The same image computed one pixel at a time, for cross-checking.
    pub fn render_reference(&self) -> Bitmap {
        match self.precision {
            Precision::Double => reference::render::<f64>(&self.viewport, self.max_iterations),
            Precision::Single => reference::render::<f32>(&self.viewport, self.max_iterations),
        }
    }
}
