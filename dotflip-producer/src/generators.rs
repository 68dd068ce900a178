use dotflip_core::Grid;

pub const DEFAULT_THRESHOLD: u8 = 128;

/// Renders frame `n` of an animation into the grid.
pub trait Generator: Send {
    fn render(&mut self, n: u64, grid: &mut Grid);
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn render(&mut self, n: u64, grid: &mut Grid) {
        (**self).render(n, grid);
    }
}

/// Whole wall off, then on, then off... Frame 0 is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blink;

impl Generator for Blink {
    fn render(&mut self, n: u64, grid: &mut Grid) {
        let on = n % 2 == 1;
        for y in 0..grid.rows() {
            for x in 0..grid.cols() {
                grid.set_cell(x, y, on);
            }
        }
    }
}

/// Checkerboard of `size`-cell squares, scrolling one column per frame.
#[derive(Debug, Clone, Copy)]
pub struct Checker {
    pub size: usize,
}

impl Default for Checker {
    fn default() -> Self {
        Self { size: 7 }
    }
}

impl Generator for Checker {
    fn render(&mut self, n: u64, grid: &mut Grid) {
        let size = self.size.max(1);
        let shift = (n % (2 * size as u64)) as usize;
        for y in 0..grid.rows() {
            for x in 0..grid.cols() {
                let on = ((x + shift) / size + y / size) % 2 == 0;
                grid.set_cell(x, y, on);
            }
        }
    }
}

/// Nothing; the grid keeps whatever it has.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blank;

impl Generator for Blank {
    fn render(&mut self, _n: u64, _grid: &mut Grid) {}
}

/// Light every cell whose pixel's red channel is strictly above `threshold`.
///
/// `rgba` is a `width * height` RGBA8 image already scaled to the grid.
/// Pixels outside the grid, or missing from a short buffer, are ignored.
pub fn threshold_rgba(grid: &mut Grid, rgba: &[u8], width: usize, height: usize, threshold: u8) {
    for y in 0..height.min(grid.rows()) {
        for x in 0..width.min(grid.cols()) {
            let Some(&red) = rgba.get((y * width + x) * 4) else {
                return;
            };
            grid.set_cell(x, y, red > threshold);
        }
    }
}
