use std::result::Result as StdResult;

use thiserror::Error;

/// Errors raised by pure domain operations in disaster-dedup-core.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = StdResult<T, Error>;
