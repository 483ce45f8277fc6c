/*!
Parallel row-band dispatch.

The bitmap is cut into bands of [`BandRenderer::band_rows`] rows before any worker
starts. Each band is a disjoint `&mut [u8]`, so workers never share a byte and need
no locks; the only synchronisation is the join at the end.

Rows near the set boundary cost far more than rows outside it, so an even static
split leaves some workers idle while others finish. [`Strategy::WorkStealing`]
hands out one band at a time through rayon's work-stealing queue instead. The
output is the same bitmap whichever strategy or worker count is used.
*/

use log::debug;
use rayon::prelude::{IndexedParallelIterator, ParallelIterator, ParallelSliceMut};

use crate::{
    bitmap::{Bitmap, RowBand},
    error::{Error, Result},
    scheduler::{BandRenderer, BandStats},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// All bands on the calling thread.
    Sequential,
    /// `workers` threads, each given one contiguous run of bands up front.
    StaticBands { workers: usize },
    /// A rayon pool of `workers` threads pulling single bands.
    WorkStealing { workers: usize },
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::WorkStealing {
            workers: num_cpus::get(),
        }
    }
}

impl Strategy {
    pub fn workers(&self) -> usize {
        match *self {
            Strategy::Sequential => 1,
            Strategy::StaticBands { workers } | Strategy::WorkStealing { workers } => workers,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers() == 0 {
            return Err(Error::ZeroWorkers);
        }
        Ok(())
    }
}

/// A [`Strategy`] with its threads set up, reused by every [`dispatch`].
pub enum Workers {
    Sequential,
    StaticBands(usize),
    Pool(rayon::ThreadPool),
}

impl Workers {
    pub fn new(strategy: Strategy) -> Result<Self> {
        strategy.validate()?;
        Ok(match strategy {
            Strategy::Sequential => Workers::Sequential,
            Strategy::StaticBands { workers } => Workers::StaticBands(workers),
            Strategy::WorkStealing { workers } => {
                debug!("building pool of {} workers", workers);
                Workers::Pool(
                    rayon::ThreadPoolBuilder::new()
                        .num_threads(workers)
                        .build()?,
                )
            }
        })
    }

    pub fn threads(&self) -> usize {
        match self {
            Workers::Sequential => 1,
            Workers::StaticBands(workers) => *workers,
            Workers::Pool(pool) => pool.current_num_threads(),
        }
    }
}

/// Renders every band of `bitmap`; returns once all workers have joined.
pub fn dispatch<R: BandRenderer>(
    renderer: &R,
    bitmap: &mut Bitmap,
    workers: &Workers,
) -> BandStats {
    debug_assert_eq!(bitmap.dim(), renderer.dim());

    let rows = renderer.band_rows();
    let band_bytes = rows * bitmap.width_bytes();
    if band_bytes == 0 {
        return BandStats::default();
    }
    debug!(
        "dispatching {} bands of {} rows on {} workers",
        bitmap.dim().div_ceil(rows),
        rows,
        workers.threads()
    );

    let stats: BandStats = match workers {
        Workers::Sequential => bitmap
            .bands_mut(rows)
            .map(|mut band| renderer.render_band(&mut band))
            .sum(),
        Workers::StaticBands(workers) => static_bands(renderer, bitmap, *workers),
        Workers::Pool(pool) => {
            let width_bytes = bitmap.width_bytes();
            pool.install(|| {
                bitmap
                    .bytes_mut()
                    .par_chunks_mut(band_bytes)
                    .enumerate()
                    .map(|(i, bytes)| {
                        renderer.render_band(&mut RowBand::new(i * rows, width_bytes, bytes))
                    })
                    .sum()
            })
        }
    };

    debug!("dispatch finished: {:?}", stats);
    stats
}

fn static_bands<R: BandRenderer>(renderer: &R, bitmap: &mut Bitmap, workers: usize) -> BandStats {
    let rows = renderer.band_rows();
    let width_bytes = bitmap.width_bytes();
    let bands = bitmap.dim().div_ceil(rows);
    let bands_per_worker = bands.div_ceil(workers);

    std::thread::scope(|scope| {
        let handles: Vec<_> = bitmap
            .bytes_mut()
            .chunks_mut(bands_per_worker * rows * width_bytes)
            .enumerate()
            .map(|(worker, bytes)| {
                let first_row = worker * bands_per_worker * rows;
                scope.spawn(move || {
                    bytes
                        .chunks_mut(rows * width_bytes)
                        .enumerate()
                        .map(|(i, band)| {
                            let mut band = RowBand::new(first_row + i * rows, width_bytes, band);
                            renderer.render_band(&mut band)
                        })
                        .sum::<BandStats>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        scheduler::{BatchShape, RowScheduler},
        viewport::Viewport,
    };

    /// Marks every pixel whose row and column share parity.
    struct Checkerboard {
        dim: usize,
    }

    impl BandRenderer for Checkerboard {
        fn dim(&self) -> usize {
            self.dim
        }

        fn band_rows(&self) -> usize {
            3
        }

        fn render_band(&self, band: &mut RowBand) -> BandStats {
            for row in 0..band.rows() {
                let parity = (band.first_row + row) % 2;
                let mask = (0..self.dim)
                    .filter(|col| col % 2 == parity)
                    .fold(0u64, |mask, col| mask | 1 << col);
                band.write_bits(row, 0, mask, self.dim);
            }
            BandStats {
                batches: band.rows(),
                ..BandStats::default()
            }
        }
    }

    fn strategies() -> Vec<(Strategy, Workers)> {
        let mut all = vec![Strategy::Sequential];
        for workers in [1, 2, 3, 7, 64] {
            all.push(Strategy::StaticBands { workers });
            all.push(Strategy::WorkStealing { workers });
        }
        all.into_iter()
            .map(|strategy| (strategy, Workers::new(strategy).unwrap()))
            .collect()
    }

    #[test_log::test]
    fn every_band_is_visited_exactly_once() {
        let renderer = Checkerboard { dim: 20 };
        for (strategy, workers) in strategies() {
            let mut bitmap = Bitmap::new(20);
            let stats = dispatch(&renderer, &mut bitmap, &workers);

            assert_eq!(stats.batches, 20, "{strategy:?}");
            for row in 0..20 {
                for col in 0..20 {
                    assert_eq!(bitmap.get(row, col), (row + col) % 2 == 0, "{strategy:?}");
                }
            }
        }
    }

    #[test_log::test]
    fn output_is_independent_of_strategy() {
        let viewport = Viewport::with_default_bounds(120).unwrap();
        let shape = BatchShape {
            columns: 2,
            rows: 2,
        };
        let scheduler = RowScheduler::<f64, 4, 4>::new(viewport, 50, shape, true).unwrap();

        let mut expected = Bitmap::new(120);
        let expected_stats = dispatch(&scheduler, &mut expected, &Workers::Sequential);

        for (strategy, workers) in strategies() {
            let mut bitmap = Bitmap::new(120);
            let stats = dispatch(&scheduler, &mut bitmap, &workers);
            assert_eq!(bitmap, expected, "{strategy:?}");
            assert_eq!(stats.batches, expected_stats.batches);
            assert_eq!(stats.interior_batches, expected_stats.interior_batches);
        }
    }

    #[test]
    fn zero_workers_is_rejected() {
        for strategy in [
            Strategy::StaticBands { workers: 0 },
            Strategy::WorkStealing { workers: 0 },
        ] {
            assert!(matches!(Workers::new(strategy), Err(Error::ZeroWorkers)));
        }
        assert!(Strategy::default().workers() >= 1);
    }

    #[test]
    fn pool_is_built_once_and_reused() {
        let renderer = Checkerboard { dim: 24 };
        let workers = Workers::new(Strategy::WorkStealing { workers: 3 }).unwrap();
        assert_eq!(workers.threads(), 3);

        let mut first = Bitmap::new(24);
        let mut second = Bitmap::new(24);
        let first_stats = dispatch(&renderer, &mut first, &workers);
        let second_stats = dispatch(&renderer, &mut second, &workers);
        assert_eq!(first, second);
        assert_eq!(first_stats, second_stats);
        assert_eq!(workers.threads(), 3);
    }
}
