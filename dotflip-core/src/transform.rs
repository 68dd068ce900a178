use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::matrix::Matrix;

/// On-screen orientation. Only affects drawing and hit-testing; the panel
/// always receives the matrix in its native orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    Landscape,
    Portrait,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub mirror_h: bool,
    pub mirror_v: bool,
    pub invert: bool,
    pub layout: Layout,
}

impl TransformConfig {
    /// Mirror-horizontal, then mirror-vertical, then invert.
    pub fn apply(&self, matrix: Matrix) -> Matrix {
        let mut rows = matrix.into_rows();

        if self.mirror_h {
            for row in &mut rows {
                row.reverse();
            }
        }

        if self.mirror_v {
            rows.reverse();
        }

        if self.invert {
            for v in rows.iter_mut().flatten() {
                *v ^= 1;
            }
        }

        Matrix::from_rows_unchecked(rows)
    }
}

/// The matrix actually transmitted for `grid` under `config`.
pub fn transform(grid: &Grid, config: &TransformConfig) -> Matrix {
    config.apply(grid.snapshot())
}
