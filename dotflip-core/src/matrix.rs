//! The binary matrix that travels on the wire.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Dimensions, FrameError};

/// A rectangular, row-major matrix of `0`/`1` values.
///
/// Construction always validates shape and values, so every `Matrix` in
/// hand is rectangular and binary. Equality is full structural equality,
/// which is what the relay uses for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>")]
pub struct Matrix {
    rows: Vec<Vec<u8>>,
}

impl Matrix {
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self, FrameError> {
        let expected = rows.first().map_or(0, Vec::len);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(FrameError::Ragged {
                    row: y,
                    len: row.len(),
                    expected,
                });
            }
            if let Some(x) = row.iter().position(|&v| v > 1) {
                return Err(FrameError::NonBinary {
                    x,
                    y,
                    value: Value::from(row[x]),
                });
            }
        }
        Ok(Self { rows })
    }

    /// Validate an untyped JSON payload, reporting the first offending row or cell.
    pub fn from_value(value: &Value) -> Result<Self, FrameError> {
        let rows = value.as_array().ok_or(FrameError::NotAMatrix)?;
        let expected = rows.first().and_then(Value::as_array).map_or(0, Vec::len);

        let mut out = Vec::with_capacity(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let cells = row.as_array().ok_or(FrameError::NotAMatrix)?;
            if cells.len() != expected {
                return Err(FrameError::Ragged {
                    row: y,
                    len: cells.len(),
                    expected,
                });
            }

            let mut bits = Vec::with_capacity(cells.len());
            for (x, cell) in cells.iter().enumerate() {
                match cell.as_u64() {
                    Some(v @ (0 | 1)) => bits.push(v as u8),
                    _ => {
                        return Err(FrameError::NonBinary {
                            x,
                            y,
                            value: cell.clone(),
                        })
                    }
                }
            }
            out.push(bits);
        }

        Ok(Self { rows: out })
    }

    /// A `width × height` matrix with every cell set to `on`.
    pub fn filled(width: usize, height: usize, on: bool) -> Self {
        Self {
            rows: vec![vec![u8::from(on); width]; height],
        }
    }

    /// Caller guarantees the rows are rectangular and binary.
    pub(crate) fn from_rows_unchecked(rows: Vec<Vec<u8>>) -> Self {
        Self { rows }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn is_on(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == Some(1)
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<u8>> {
        self.rows
    }

    pub fn count_on(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|&&v| v == 1).count())
            .sum()
    }

    /// Debug rendering, one text line per row.
    pub fn to_ascii(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&v| if v == 1 { "⬤" } else { "·" })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TryFrom<Vec<Vec<u8>>> for Matrix {
    type Error = FrameError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Matrix::new(rows)
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}
