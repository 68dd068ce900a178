//! Screen ↔ grid mapping under pan, zoom and layout rotation.
//!
//! Drawing and hit-testing share a single [`Rotation`]: the render path
//! applies it, the hit-test path applies its transpose. Keeping one source
//! for both is what makes a cell's centroid always map back to that cell.

use crate::transform::Layout;

pub const DEFAULT_CELL_SIZE: u32 = 16;
/// Zoom range offered to interactive input.
pub const MIN_CELL_SIZE: u32 = 8;
pub const MAX_CELL_SIZE: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Transient view state. Never transmitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub offset_x: f64,
    pub offset_y: f64,
    pub cell_size: u32,
    pub is_panning: bool,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            cell_size: DEFAULT_CELL_SIZE,
            is_panning: false,
        }
    }
}

impl ViewportState {
    /// Change the cell size, scaling the pan offset by the same ratio so the
    /// content under the screen centre stays put.
    pub fn zoom_to(&mut self, cell_size: u32) {
        let cell_size = cell_size.max(1);
        let scale = f64::from(cell_size) / f64::from(self.cell_size);
        self.offset_x *= scale;
        self.offset_y *= scale;
        self.cell_size = cell_size;
    }

    /// Step zoom for wheel/keyboard input, kept inside the interactive range.
    pub fn zoom_by(&mut self, step: i32) {
        let target = (i64::from(self.cell_size) + i64::from(step))
            .clamp(i64::from(MIN_CELL_SIZE), i64::from(MAX_CELL_SIZE));
        self.zoom_to(target as u32);
    }

    pub fn reset_offset(&mut self) {
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }
}

/// Largest cell size that fits the whole grid on screen, minus a pixel of
/// breathing room. Portrait swaps the grid's on-screen width and height.
pub fn fit_cell_size(
    screen_width: f64,
    screen_height: f64,
    cols: usize,
    rows: usize,
    layout: Layout,
) -> u32 {
    let (across, down) = match layout {
        Layout::Landscape => (cols, rows),
        Layout::Portrait => (rows, cols),
    };
    if across == 0 || down == 0 {
        return DEFAULT_CELL_SIZE;
    }
    let fit = (screen_width / across as f64).min(screen_height / down as f64) - 1.0;
    fit.floor().max(1.0) as u32
}

/// A 2×2 rotation matrix. Its inverse is its transpose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    m: [[f64; 2]; 2],
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation {
        m: [[1.0, 0.0], [0.0, 1.0]],
    };

    /// Render rotation for portrait: `(x, y) -> (-y, x)`.
    pub const PORTRAIT: Rotation = Rotation {
        m: [[0.0, -1.0], [1.0, 0.0]],
    };

    pub fn for_layout(layout: Layout) -> Self {
        match layout {
            Layout::Landscape => Self::IDENTITY,
            Layout::Portrait => Self::PORTRAIT,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.m[0][0] * p.x + self.m[0][1] * p.y,
            y: self.m[1][0] * p.x + self.m[1][1] * p.y,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            m: [[self.m[0][0], self.m[1][0]], [self.m[0][1], self.m[1][1]]],
        }
    }
}

/// Maps between screen pixels and grid indices for one screen size, grid
/// size and layout. The viewport is passed per call since it changes on
/// every pan or zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    pub screen_width: f64,
    pub screen_height: f64,
    pub cols: usize,
    pub rows: usize,
    pub layout: Layout,
}

impl CoordinateMapper {
    pub fn new(
        screen_width: f64,
        screen_height: f64,
        cols: usize,
        rows: usize,
        layout: Layout,
    ) -> Self {
        Self {
            screen_width,
            screen_height,
            cols,
            rows,
            layout,
        }
    }

    /// Unrotated content size in pixels.
    pub fn content_size(&self, viewport: &ViewportState) -> (f64, f64) {
        let cs = f64::from(viewport.cell_size);
        (self.cols as f64 * cs, self.rows as f64 * cs)
    }

    /// Where the content centre lands on screen.
    fn origin(&self, viewport: &ViewportState) -> Point {
        Point {
            x: self.screen_width / 2.0 + viewport.offset_x,
            y: self.screen_height / 2.0 + viewport.offset_y,
        }
    }

    /// Forward render transform of a content-space point.
    pub fn content_to_screen(&self, viewport: &ViewportState, p: Point) -> Point {
        let (cw, ch) = self.content_size(viewport);
        let centred = Point::new(p.x - cw / 2.0, p.y - ch / 2.0);
        let rotated = Rotation::for_layout(self.layout).apply(centred);
        let origin = self.origin(viewport);
        Point::new(rotated.x + origin.x, rotated.y + origin.y)
    }

    pub fn cell_center_to_screen(&self, viewport: &ViewportState, gx: i64, gy: i64) -> Point {
        let cs = f64::from(viewport.cell_size);
        let centroid = Point::new(gx as f64 * cs + cs / 2.0, gy as f64 * cs + cs / 2.0);
        self.content_to_screen(viewport, centroid)
    }

    /// Hit-test a screen point. The result is not clamped; use
    /// [`CoordinateMapper::in_bounds`] before indexing the grid.
    pub fn screen_to_cell(&self, viewport: &ViewportState, p: Point) -> (i64, i64) {
        let origin = self.origin(viewport);
        let local = Point::new(p.x - origin.x, p.y - origin.y);
        let unrotated = Rotation::for_layout(self.layout).inverse().apply(local);

        let (cw, ch) = self.content_size(viewport);
        let cs = f64::from(viewport.cell_size);
        (
            ((unrotated.x + cw / 2.0) / cs).floor() as i64,
            ((unrotated.y + ch / 2.0) / cs).floor() as i64,
        )
    }

    pub fn in_bounds(&self, gx: i64, gy: i64) -> Option<(usize, usize)> {
        let x = usize::try_from(gx).ok()?;
        let y = usize::try_from(gy).ok()?;
        (x < self.cols && y < self.rows).then_some((x, y))
    }
}
