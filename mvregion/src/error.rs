//! # Error types

use thiserror::Error;

/// Errors raised by the region extraction pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Grid dimensions were absent or zero when the session was calibrated.
    #[error("malformed motion grid ({rows}x{cols})")]
    MalformedGrid { rows: usize, cols: usize },
    /// A frame arrived with dimensions different from the calibrated ones.
    #[error("grid dimensions changed from {expected:?} to {got:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    /// Raw buffer length does not match the grid it is supposed to hold.
    #[error("expected {expected} bytes of motion data, got {got}")]
    BufferSize { expected: usize, got: usize },
    #[error("unknown property `{0}`")]
    UnknownProperty(String),
    #[error("property `{0}` has a different kind")]
    PropertyKind(String),
}
