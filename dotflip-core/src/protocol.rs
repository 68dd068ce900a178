//! JSON frame envelopes exchanged over a frame channel.
//!
//! ```text
//! { "type": "matrix", "payload": [[0|1, ...], ...] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FrameError;
use crate::matrix::Matrix;

pub const MATRIX_TYPE: &str = "matrix";

/// The only wire entity. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum FrameEnvelope {
    Matrix(Matrix),
}

impl FrameEnvelope {
    pub fn matrix(matrix: Matrix) -> Self {
        FrameEnvelope::Matrix(matrix)
    }

    /// Decode one text frame.
    ///
    /// Returns [`FrameError::Parse`] only for text that is not JSON at all.
    /// Anything else that is not a `{type, payload}` object with a `"matrix"`
    /// tag and a rectangular 0/1 payload is one of the schema variants.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text)?;
        let object = value.as_object().ok_or(FrameError::NotAnEnvelope)?;

        match object.get("type") {
            Some(Value::String(kind)) if kind == MATRIX_TYPE => {}
            Some(Value::String(kind)) => return Err(FrameError::UnknownType(kind.clone())),
            Some(other) => return Err(FrameError::UnknownType(other.to_string())),
            None => return Err(FrameError::UnknownType(String::new())),
        }

        let payload = object.get("payload").unwrap_or(&Value::Null);
        Ok(FrameEnvelope::Matrix(Matrix::from_value(payload)?))
    }

    pub fn encode(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn payload(&self) -> &Matrix {
        match self {
            FrameEnvelope::Matrix(m) => m,
        }
    }

    pub fn into_payload(self) -> Matrix {
        match self {
            FrameEnvelope::Matrix(m) => m,
        }
    }
}
