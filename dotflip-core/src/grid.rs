use crate::matrix::Matrix;

/// A single dot. No identity beyond its position in the owning grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    pub active: bool,
}

/// Grid-of-grids dimensions: `grid_cols × grid_rows` sub-grids of
/// `cols_per_grid × rows_per_grid` cells each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub grid_cols: usize,
    pub grid_rows: usize,
    pub cols_per_grid: usize,
    pub rows_per_grid: usize,
}

impl GridGeometry {
    pub fn total_cols(&self) -> usize {
        self.grid_cols * self.cols_per_grid
    }

    pub fn total_rows(&self) -> usize {
        self.grid_rows * self.rows_per_grid
    }
}

impl Default for GridGeometry {
    /// 3 × 3 sub-grids of 28 × 14, i.e. an 84 × 42 wall.
    fn default() -> Self {
        Self {
            grid_cols: 3,
            grid_rows: 3,
            cols_per_grid: 28,
            rows_per_grid: 14,
        }
    }
}

/// The producer's addressable cell buffer.
///
/// Row-major, every row exactly `total_cols` long. Out-of-bounds writes and
/// writes made while the view is being panned are silently dropped.
#[derive(Debug, Clone)]
pub struct Grid {
    geometry: GridGeometry,
    cells: Vec<Vec<Cell>>,
    panning: bool,
}

impl Grid {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            cells: vec![vec![Cell::default(); geometry.total_cols()]; geometry.total_rows()],
            panning: false,
        }
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn cols(&self) -> usize {
        self.geometry.total_cols()
    }

    pub fn rows(&self) -> usize {
        self.geometry.total_rows()
    }

    /// Reallocate for new geometry. Returns `false` (and keeps the cells)
    /// when nothing changed.
    pub fn reshape(&mut self, geometry: GridGeometry) -> bool {
        if geometry == self.geometry {
            return false;
        }
        tracing::debug!(
            cols = geometry.total_cols(),
            rows = geometry.total_rows(),
            "grid reshaped"
        );
        *self = Self {
            panning: self.panning,
            ..Self::new(geometry)
        };
        true
    }

    pub fn set_panning(&mut self, panning: bool) {
        self.panning = panning;
    }

    pub fn is_panning(&self) -> bool {
        self.panning
    }

    pub fn set_cell(&mut self, x: usize, y: usize, active: bool) {
        if self.panning {
            return;
        }
        if let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            cell.active = active;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.cells.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(Cell::default());
        }
    }

    /// Copy a received matrix into the grid through [`Grid::set_cell`], so
    /// clipping and the panning rule still apply.
    pub fn load(&mut self, matrix: &Matrix) {
        for (y, row) in matrix.rows().iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                self.set_cell(x, y, v == 1);
            }
        }
    }

    /// Raw 0/1 value copy, row-major, no transforms applied.
    pub fn snapshot(&self) -> Matrix {
        Matrix::from_rows_unchecked(
            self.cells
                .iter()
                .map(|row| row.iter().map(|c| u8::from(c.active)).collect())
                .collect(),
        )
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GridGeometry::default())
    }
}
