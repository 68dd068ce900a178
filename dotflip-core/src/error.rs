use std::fmt;

use thiserror::Error;

/// Width/height pair, displayed as `WxH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Why an inbound frame was not accepted.
///
/// None of these are fatal: the relay logs them, drops the frame and keeps
/// the channel open.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The text was not valid JSON (or not a JSON object).
    #[error("malformed frame JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Valid JSON, but not an object.
    #[error("frame is not a {{type, payload}} object")]
    NotAnEnvelope,

    #[error("unsupported frame type {0:?}")]
    UnknownType(String),

    #[error("payload is not an array of rows")]
    NotAMatrix,

    #[error("payload row {row} has {len} cells, expected {expected}")]
    Ragged {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("payload cell ({x}, {y}) is {value}, expected 0 or 1")]
    NonBinary {
        x: usize,
        y: usize,
        value: serde_json::Value,
    },

    #[error("matrix size mismatch: received {received}, expected {expected}")]
    DimensionMismatch {
        received: Dimensions,
        expected: Dimensions,
    },
}

impl FrameError {
    /// Wrong type tag or a payload that is not a rectangular 0/1 matrix.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            FrameError::NotAnEnvelope
                | FrameError::UnknownType(_)
                | FrameError::NotAMatrix
                | FrameError::Ragged { .. }
                | FrameError::NonBinary { .. }
        )
    }
}
