//! Error types for configuration I/O and the background driver.
//!
//! The solver itself has no recoverable errors; misuse panics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("failed to access params file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse params: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to spawn simulation thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("simulation thread panicked")]
    WorkerPanicked,
    #[error("simulation thread already stopped")]
    AlreadyStopped,
}

pub type DriverResult<T> = Result<T, DriverError>;
