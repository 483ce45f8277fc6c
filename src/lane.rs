/*!
Fixed-width float vectors.

A [`LaneVector`] is `L` floats processed in lockstep. The operations are plain
loops over a `[T; L]`, which LLVM turns into packed SSE/AVX instructions when
`L` matches the register width (4 × `f64` or 8 × `f32` for AVX).

Comparisons are ordered: a lane holding NaN never compares below a threshold,
so a lane that overflowed while diverging counts as escaped.
*/

use std::{
    fmt::Debug,
    ops::{Add, Mul, Sub},
};

/// Scalar element of a [`LaneVector`].
pub trait Lane:
    Copy
    + Debug
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Send
    + Sync
    + 'static
{
    const ZERO: Self;

    /// `|z|²` beyond which an orbit is known to diverge.
    const ESCAPE_RADIUS_SQUARED: Self;

    fn from_f64(value: f64) -> Self;
}

impl Lane for f32 {
    const ZERO: Self = 0.0;
    const ESCAPE_RADIUS_SQUARED: Self = 4.0;

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Lane for f64 {
    const ZERO: Self = 0.0;
    const ESCAPE_RADIUS_SQUARED: Self = 4.0;

    fn from_f64(value: f64) -> Self {
        value
    }
}

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneVector<T, const L: usize>([T; L]);

pub type F64x4 = LaneVector<f64, 4>;
pub type F32x8 = LaneVector<f32, 8>;

impl<T: Lane, const L: usize> LaneVector<T, L> {
    pub const LANES: usize = L;

    pub fn splat(value: T) -> Self {
        Self([value; L])
    }

    pub fn from_array(lanes: [T; L]) -> Self {
        Self(lanes)
    }

    pub fn from_fn(f: impl FnMut(usize) -> T) -> Self {
        Self(std::array::from_fn(f))
    }

    pub fn to_array(self) -> [T; L] {
        self.0
    }

    #[inline(always)]
    fn zip_with(self, other: Self, f: impl Fn(T, T) -> T) -> Self {
        let mut out = self.0;
        for (lane, rhs) in out.iter_mut().zip(other.0) {
            *lane = f(*lane, rhs);
        }
        Self(out)
    }

    /// `x² + y²` per lane.
    #[inline(always)]
    pub fn norm_sqr(x: Self, y: Self) -> Self {
        x * x + y * y
    }

    /// Strict form of [`any_lane_at_most`](Self::any_lane_at_most). The kernel
    /// uses the inclusive one, since a point on the escape radius (`|z|² = 4`)
    /// still counts as bounded.
    pub fn any_lane_less_than(self, threshold: T) -> bool {
        self.0.iter().any(|lane| *lane < threshold)
    }

    /// NaN lanes never count.
    pub fn any_lane_at_most(self, threshold: T) -> bool {
        self.0.iter().any(|lane| *lane <= threshold)
    }

    /// Bit `i` is set iff lane `i` is `<= threshold`.
    pub fn mask_at_most(self, threshold: T) -> u64 {
        debug_assert!(L <= u64::BITS as usize);
        self.0
            .iter()
            .enumerate()
            .filter(|(_, lane)| **lane <= threshold)
            .fold(0, |mask, (i, _)| mask | 1 << i)
    }
}

impl<T: Lane, const L: usize> Add for LaneVector<T, L> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<T: Lane, const L: usize> Sub for LaneVector<T, L> {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl<T: Lane, const L: usize> Mul for LaneVector<T, L> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a * b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elementwise_arithmetic() {
        let a = F64x4::from_array([1.0, 2.0, 3.0, 4.0]);
        let b = F64x4::splat(0.5);

        assert_eq!((a + b).to_array(), [1.5, 2.5, 3.5, 4.5]);
        assert_eq!((a - b).to_array(), [0.5, 1.5, 2.5, 3.5]);
        assert_eq!((a * b).to_array(), [0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn from_fn_fills_lanes_in_order() {
        let v = F32x8::from_fn(|i| i as f32);
        assert_eq!(v.to_array(), [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(F32x8::LANES, 8);
    }

    #[test]
    fn nan_lanes_never_count_as_below() {
        let v = F64x4::from_array([f64::NAN, f64::INFINITY, 5.0, f64::NAN]);
        assert!(!v.any_lane_less_than(4.0));
        assert!(!v.any_lane_at_most(4.0));
        assert_eq!(v.mask_at_most(4.0), 0);
    }

    #[test]
    fn threshold_boundary() {
        let v = F64x4::from_array([4.0, 5.0, 6.0, 7.0]);
        assert!(!v.any_lane_less_than(4.0));
        assert!(v.any_lane_at_most(4.0));
    }

    #[test]
    fn only_the_inclusive_test_keeps_the_escape_radius() {
        let sq = LaneVector::norm_sqr(F32x8::splat(-2.0), F32x8::splat(0.0));
        assert!(!sq.any_lane_less_than(f32::ESCAPE_RADIUS_SQUARED));
        assert!(sq.any_lane_at_most(f32::ESCAPE_RADIUS_SQUARED));
    }

    #[test]
    fn mask_bit_i_is_lane_i() {
        let v = F32x8::from_array([0.0, 9.0, 1.0, 9.0, 9.0, 9.0, f32::NAN, 4.0]);
        assert_eq!(v.mask_at_most(4.0), 0b1000_0101);
    }

    #[test]
    fn overflow_propagates_to_non_finite() {
        let big = F32x8::splat(f32::MAX);
        let sq = LaneVector::norm_sqr(big, big);
        assert!(sq.to_array().iter().all(|lane| lane.is_infinite()));
        let nan = sq - sq;
        assert!(nan.to_array().iter().all(|lane| lane.is_nan()));
    }
}
