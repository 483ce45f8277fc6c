/*!
The Mandelbrot iteration kernel.

[`iterate`] runs `z ← z² + c` for `G` independent groups of `L` lanes at once.
The groups share no data, so their multiply/add chains interleave and fill the
pipeline bubbles a single chain would leave.

The escape test only runs every [`UNROLL`] steps. A lane that escapes keeps
escaping (for `|z| > 2 ≥ |c|` the orbit grows monotonically, and overflow ends in
NaN which fails the ordered `<=`), so testing late never changes a result; it only
costs up to `UNROLL - 1` wasted steps on lanes that are already out.
*/

use crate::lane::{Lane, LaneVector};

/// Recurrence steps between escape tests.
pub const UNROLL: usize = 8;

pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// When [`iterate`] tests for an all-escaped batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeCheck {
    /// After every [`UNROLL`] block; returns early once no lane is bounded.
    EveryBlock,
    /// Only once the whole budget has run. Cheaper inside the set.
    FinalOnly,
}

/// One lane vector per group.
pub type Groups<T, const L: usize, const G: usize> = [LaneVector<T, L>; G];

/// Mask with the low `lanes` bits set.
pub fn full_mask(lanes: usize) -> u64 {
    match lanes {
        0 => 0,
        n if n >= u64::BITS as usize => u64::MAX,
        n => (1 << n) - 1,
    }
}

#[inline(always)]
fn step<T: Lane, const L: usize, const G: usize>(
    x: &mut Groups<T, L, G>,
    y: &mut Groups<T, L, G>,
    cx: &Groups<T, L, G>,
    cy: &Groups<T, L, G>,
) {
    for g in 0..G {
        let x2 = x[g] * x[g];
        let y2 = y[g] * y[g];
        let xy = x[g] * y[g];
        y[g] = xy + xy + cy[g];
        x[g] = x2 - y2 + cx[g];
    }
}

#[inline(always)]
fn any_bounded<T: Lane, const L: usize, const G: usize>(
    x: &Groups<T, L, G>,
    y: &Groups<T, L, G>,
) -> bool {
    x.iter()
        .zip(y)
        .any(|(x, y)| LaneVector::norm_sqr(*x, *y).any_lane_at_most(T::ESCAPE_RADIUS_SQUARED))
}

/**
Membership bits for `G * L` points.

Element `g` of the result holds group `g`'s lanes, bit `i` for lane `i`. A bit is
set iff `|z_n|² <= 4` for every `n` in `1..=max_iterations`, with `z_0 = 0`.

Both [`EscapeCheck`] modes return the same bits.
*/
pub fn iterate<T: Lane, const L: usize, const G: usize>(
    cx: &Groups<T, L, G>,
    cy: &Groups<T, L, G>,
    max_iterations: usize,
    check: EscapeCheck,
) -> [u64; G] {
    let mut x = [LaneVector::splat(T::ZERO); G];
    let mut y = [LaneVector::splat(T::ZERO); G];

    for _ in 0..max_iterations / UNROLL {
        for _ in 0..UNROLL {
            step(&mut x, &mut y, cx, cy);
        }
        if check == EscapeCheck::EveryBlock && !any_bounded(&x, &y) {
            return [0; G];
        }
    }

    for _ in 0..max_iterations % UNROLL {
        step(&mut x, &mut y, cx, cy);
    }

    std::array::from_fn(|g| {
        LaneVector::norm_sqr(x[g], y[g]).mask_at_most(T::ESCAPE_RADIUS_SQUARED)
    })
}

/// One point, tested every step. Same arithmetic order as [`iterate`].
pub fn scalar_member<T: Lane>(cx: T, cy: T, max_iterations: usize) -> bool {
    let (mut x, mut y) = (T::ZERO, T::ZERO);
    for _ in 0..max_iterations {
        let x2 = x * x;
        let y2 = y * y;
        let xy = x * y;
        y = xy + xy + cy;
        x = x2 - y2 + cx;
        if x * x + y * y > T::ESCAPE_RADIUS_SQUARED {
            return false;
        }
    }
    true
}

/// Pixel-at-a-time rendering with [`scalar_member`].
pub mod reference {
    use log::debug;

    use super::scalar_member;
    use crate::{bitmap::Bitmap, lane::Lane, viewport::Viewport};

    pub fn render<T: Lane>(viewport: &Viewport, max_iterations: usize) -> Bitmap {
        debug!(
            "reference render {}x{} ({} iterations)",
            viewport.dim(), viewport.dim(), max_iterations
        );
        let mut bitmap = Bitmap::new(viewport.dim());
        for row in 0..viewport.dim() {
            let cy = viewport.imag::<T>(row);
            for col in 0..viewport.dim() {
                if scalar_member(viewport.real::<T>(col), cy, max_iterations) {
                    bitmap.set(row, col);
                }
            }
        }
        bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::{F32x8, F64x4};

    fn single<T: Lane>(cx: T, cy: T, max_iterations: usize, check: EscapeCheck) -> bool {
        let bits = iterate::<T, 4, 1>(
            &[LaneVector::splat(cx)],
            &[LaneVector::splat(cy)],
            max_iterations,
            check,
        );
        assert!(bits[0] == 0 || bits[0] == 0b1111);
        bits[0] != 0
    }

    #[test]
    fn origin_is_bounded_for_any_budget() {
        for budget in 1..=64 {
            assert!(scalar_member(0.0f64, 0.0, budget));
            assert!(single(0.0f64, 0.0, budget, EscapeCheck::EveryBlock));
            assert!(single(0.0f32, 0.0, budget, EscapeCheck::FinalOnly));
        }
    }

    #[test]
    fn one_plus_i_escapes_within_three_steps() {
        for budget in 3..=64 {
            assert!(!scalar_member(1.0f64, 1.0, budget));
            assert!(!single(1.0f64, 1.0, budget, EscapeCheck::EveryBlock));
            assert!(!single(1.0f64, 1.0, budget, EscapeCheck::FinalOnly));
        }
    }

    #[test]
    fn escape_radius_is_inclusive() {
        // The orbit of -2 sits at |z|² = 4 forever.
        assert!(scalar_member(-2.0f64, 0.0, 50));
        assert!(single(-2.0f64, 0.0, 50, EscapeCheck::EveryBlock));
        assert!(single(-2.0f32, 0.0, 50, EscapeCheck::FinalOnly));
    }

    #[test]
    fn overflowing_lanes_count_as_escaped() {
        assert!(!single(1e20f32, 1e20, 50, EscapeCheck::FinalOnly));
        assert!(!single(1e20f32, 1e20, 50, EscapeCheck::EveryBlock));
        assert!(!single(1e300f64, 0.0, 50, EscapeCheck::FinalOnly));
    }

    #[test]
    fn lanes_report_individually() {
        // Lane order: inside, outside, inside, outside.
        let cx = F64x4::from_array([0.0, 1.0, -1.0, 0.5]);
        let cy = F64x4::from_array([0.0, 1.0, 0.0, 0.5]);
        let bits = iterate::<f64, 4, 1>(&[cx], &[cy], 50, EscapeCheck::EveryBlock);
        assert_eq!(bits, [0b0101]);
    }

    #[test]
    fn matches_scalar_and_both_checks_agree() {
        const G: usize = 3;
        let budgets = [1, 7, 8, 9, 16, 50, 100];
        for row in 0..40 {
            let cy = -1.2 + row as f32 * 0.06;
            for chunk in 0..4 {
                let cx: [F32x8; G] = std::array::from_fn(|g| {
                    F32x8::from_fn(|i| -2.1 + ((chunk * G + g) * 8 + i) as f32 * 0.028)
                });
                let cy = [F32x8::splat(cy); G];
                for budget in budgets {
                    let every = iterate(&cx, &cy, budget, EscapeCheck::EveryBlock);
                    let last = iterate(&cx, &cy, budget, EscapeCheck::FinalOnly);
                    assert_eq!(every, last);
                    for g in 0..G {
                        let y = cy[g].to_array()[0];
                        for (i, x) in cx[g].to_array().into_iter().enumerate() {
                            let expected = scalar_member(x, y, budget);
                            assert_eq!((every[g] >> i) & 1 == 1, expected, "c = {x} + {y}i");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn full_mask_widths() {
        assert_eq!(full_mask(0), 0);
        assert_eq!(full_mask(4), 0b1111);
        assert_eq!(full_mask(8), 0xff);
        assert_eq!(full_mask(64), u64::MAX);
    }
}
