use crate::{
    error::{Error, Result},
    lane::Lane,
};

/// A square image of `dim × dim` pixels laid over a rectangle of the complex plane.
///
/// Only [`Viewport::new`] builds one, so `dim > 0` and both ranges are non-empty.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    dim: usize,
}

impl Viewport {
    pub const DEFAULT_BOUNDS: (f64, f64, f64, f64) = (-1.5, -1.0, 0.5, 1.0);

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::EmptyDimension);
        }
        let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
        if !finite || max_x <= min_x || max_y <= min_y {
            return Err(Error::EmptyViewport {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
            dim,
        })
    }

    pub fn with_default_bounds(dim: usize) -> Result<Self> {
        let (min_x, min_y, max_x, max_y) = Self::DEFAULT_BOUNDS;
        Self::new(min_x, min_y, max_x, max_y, dim)
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn scale_x(&self) -> f64 {
        (self.max_x - self.min_x) / self.dim as f64
    }

    pub fn scale_y(&self) -> f64 {
        (self.max_y - self.min_y) / self.dim as f64
    }

    /// Real part of the point under column `col`.
    pub fn real<T: Lane>(&self, col: usize) -> T {
        T::from_f64(self.min_x + col as f64 * self.scale_x())
    }

    /// Imaginary part of the point under row `row`.
    pub fn imag<T: Lane>(&self, row: usize) -> T {
        T::from_f64(self.min_y + row as f64 * self.scale_y())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_corners() {
        let viewport = Viewport::with_default_bounds(200).unwrap();
        assert_eq!(viewport.real::<f64>(0), -1.5);
        assert_eq!(viewport.imag::<f64>(0), -1.0);
        assert_eq!(viewport.scale_x(), 0.01);
        assert!((viewport.real::<f64>(100) - -0.5).abs() < 1e-12);
        assert!((viewport.imag::<f64>(199) - 0.99).abs() < 1e-12);
    }

    #[test]
    fn bounds_are_read_back_unchanged() {
        let viewport = Viewport::new(-2.0, -1.25, 0.75, 1.25, 96).unwrap();
        assert_eq!(
            (viewport.min_x(), viewport.min_y(), viewport.max_x(), viewport.max_y()),
            (-2.0, -1.25, 0.75, 1.25)
        );
        assert_eq!(viewport.dim(), 96);
    }

    #[test]
    fn single_precision_rounds_the_double_mapping() {
        let viewport = Viewport::with_default_bounds(8).unwrap();
        assert_eq!(viewport.real::<f32>(3), viewport.real::<f64>(3) as f32);
    }

    #[test]
    fn rejects_degenerate_viewports() {
        assert!(matches!(
            Viewport::new(0.5, -1.0, 0.5, 1.0, 8),
            Err(Error::EmptyViewport { .. })
        ));
        assert!(matches!(
            Viewport::new(-1.5, 1.0, 0.5, -1.0, 8),
            Err(Error::EmptyViewport { .. })
        ));
        assert!(matches!(
            Viewport::new(f64::NAN, -1.0, 0.5, 1.0, 8),
            Err(Error::EmptyViewport { .. })
        ));
        assert!(matches!(
            Viewport::with_default_bounds(0),
            Err(Error::EmptyDimension)
        ));
    }
}
