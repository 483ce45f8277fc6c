use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("dimension {dim} is not a multiple of the {batch_width}x{batch_rows} batch")]
    DimensionNotMultiple {
        dim: usize,
        batch_width: usize,
        batch_rows: usize,
    },

    #[error("image dimension must be positive")]
    EmptyDimension,

    #[error("viewport ({min_x}, {min_y})..({max_x}, {max_y}) is empty")]
    EmptyViewport {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    #[error("a {columns}x{rows} batch does not hold {groups} lane groups")]
    InvalidBatchShape {
        groups: usize,
        columns: usize,
        rows: usize,
    },

    #[error("iteration budget must be positive")]
    ZeroIterations,

    #[error("parallel strategy needs at least one worker")]
    ZeroWorkers,

    #[error("failed to build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DimensionNotMultiple { .. } => 999,
            _ => 1,
        }
    }
}
