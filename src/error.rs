//! Error taxonomy for the engine's public, fallible operations.
//!
//! Configuration/allocation failures are fatal to registration, driver
//! init/cleanup failures propagate their own status, and sequence errors
//! never reach here — those are handled locally by the input dispatcher
//! (logged, state reset).

use thiserror::Error;

/// Errors that can be returned from the engine's registration and lifecycle
/// operations. Sequence-level errors (bad CSI, unknown escape, ...) are not
/// part of this type: they're treated as local and recoverable, so they are
/// only ever logged via the `log` crate.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid lcd parameters: {0}")]
    InvalidParameters(&'static str),

    #[error("driver validation failed")]
    ValidationFailed,

    #[error("driver port initialization failed: {0}")]
    PortInitFailed(&'static str),

    #[error("display initialization failed: {0}")]
    DisplayInitFailed(&'static str),

    #[error("driver port cleanup failed: {0}")]
    PortCleanupFailed(&'static str),

    #[error("display cleanup failed: {0}")]
    DisplayCleanupFailed(&'static str),
}

pub type EngineResult<T> = Result<T, EngineError>;
