/*!
Row-band scheduling.

A batch is a tile of `G` lane vectors: `shape.rows` image rows, each covered by
`shape.columns` consecutive lane vectors. The double-precision layout is 4 `f64`
lanes × 2 columns × 2 rows, an 8 × 2 pixel tile per kernel call.

Scanning a band left to right, a batch whose pixels all stayed bounded is taken as
a hint that the next batch sits inside the set too, and that batch runs with
[`EscapeCheck::FinalOnly`]. The hint only picks the cheaper path; both paths
produce the same bits.
*/

use std::{iter::Sum, ops::Add};

use log::trace;

use crate::{
    bitmap::RowBand,
    error::{Error, Result},
    kernel::{self, EscapeCheck, Groups},
    lane::{Lane, LaneVector},
    viewport::Viewport,
};

/// Lane vectors per batch row, and rows per batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchShape {
    pub columns: usize,
    pub rows: usize,
}

impl BatchShape {
    pub fn groups(&self) -> usize {
        self.columns * self.rows
    }
}

/// Counters for one or more scanned bands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BandStats {
    pub batches: usize,
    /// Batches run without per-block escape checks.
    pub coherent_batches: usize,
    /// Batches whose every pixel stayed bounded.
    pub interior_batches: usize,
}

impl Add for BandStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            batches: self.batches + rhs.batches,
            coherent_batches: self.coherent_batches + rhs.coherent_batches,
            interior_batches: self.interior_batches + rhs.interior_batches,
        }
    }
}

impl Sum for BandStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// A unit of parallel work: fills whole row bands of the output.
pub trait BandRenderer: Sync {
    fn dim(&self) -> usize;

    /// Image rows per band. Every band but the last is exactly this tall.
    fn band_rows(&self) -> usize;

    fn render_band(&self, band: &mut RowBand) -> BandStats;
}

pub struct RowScheduler<T, const L: usize, const G: usize> {
    viewport: Viewport,
    max_iterations: usize,
    shape: BatchShape,
    coherence: bool,
    /// Real parts for every run of `L` columns; shared by all rows.
    real: Vec<LaneVector<T, L>>,
}

impl<T: Lane, const L: usize, const G: usize> RowScheduler<T, L, G> {
    pub fn new(
        viewport: Viewport,
        max_iterations: usize,
        shape: BatchShape,
        coherence: bool,
    ) -> Result<Self> {
        if shape.groups() != G || shape.columns == 0 {
            return Err(Error::InvalidBatchShape {
                groups: G,
                columns: shape.columns,
                rows: shape.rows,
            });
        }
        if max_iterations == 0 {
            return Err(Error::ZeroIterations);
        }
        let batch_width = L * shape.columns;
        if viewport.dim() % batch_width != 0 || viewport.dim() % shape.rows != 0 {
            return Err(Error::DimensionNotMultiple {
                dim: viewport.dim(),
                batch_width,
                batch_rows: shape.rows,
            });
        }

        let real = (0..viewport.dim() / L)
            .map(|chunk| LaneVector::from_fn(|lane| viewport.real(chunk * L + lane)))
            .collect();

        Ok(Self {
            viewport,
            max_iterations,
            shape,
            coherence,
            real,
        })
    }

    pub fn batch_width(&self) -> usize {
        L * self.shape.columns
    }
}

impl<T: Lane, const L: usize, const G: usize> BandRenderer for RowScheduler<T, L, G> {
    fn dim(&self) -> usize {
        self.viewport.dim()
    }

    fn band_rows(&self) -> usize {
        self.shape.rows
    }

    fn render_band(&self, band: &mut RowBand) -> BandStats {
        let BatchShape { columns, rows } = self.shape;
        debug_assert_eq!(band.rows(), rows);

        let full = kernel::full_mask(L);
        let cy: Groups<T, L, G> = std::array::from_fn(|g| {
            LaneVector::splat(self.viewport.imag(band.first_row + g / columns))
        });

        let mut stats = BandStats::default();
        let mut interior = false;
        for col in (0..self.viewport.dim()).step_by(self.batch_width()) {
            let chunk = col / L;
            let cx: Groups<T, L, G> = std::array::from_fn(|g| self.real[chunk + g % columns]);

            let check = if self.coherence && interior {
                stats.coherent_batches += 1;
                EscapeCheck::FinalOnly
            } else {
                EscapeCheck::EveryBlock
            };
            let bits = kernel::iterate(&cx, &cy, self.max_iterations, check);

            interior = bits.iter().all(|mask| *mask == full);
            stats.batches += 1;
            stats.interior_batches += usize::from(interior);

            for (g, mask) in bits.into_iter().enumerate() {
                band.write_bits(g / columns, col + (g % columns) * L, mask, L);
            }
        }

        trace!("band at row {}: {:?}", band.first_row, stats);
        stats
    }
}
