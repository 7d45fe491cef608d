use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Memory address out of bounds: {0:#010x}")]
    AddressOutOfBounds(u64),

    #[error("Jump register target {0:#010x} is not divisible by four")]
    MisalignedJumpTarget(u64),

    #[error("Invalid architectural register: {0}")]
    UnknownRegister(u64),

    #[error("Failed to read memory image {0:?}: {1}")]
    ImageLoad(PathBuf, #[source] std::io::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
