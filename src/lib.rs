//! Benchmark-game Mandelbrot on fixed-width float vectors, plus the n-body workload.

pub mod bitmap;
pub mod dispatch;
pub mod error;
pub mod kernel;
pub mod lane;
pub mod nbody;
pub mod pbm;
pub mod render;
pub mod scheduler;
pub mod timing;
pub mod viewport;

pub use bitmap::Bitmap;
pub use dispatch::Strategy;
pub use error::{Error, Result};
pub use render::{Builder, Precision, Renderer};
pub use viewport::Viewport;
