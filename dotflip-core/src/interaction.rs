//! Pointer and keyboard handling for hand-drawing on the grid.
//!
//! Holding space arms panning; dragging while armed moves the view and
//! blocks grid writes. Dragging otherwise lights the cells under the
//! pointer for a short hold time.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::grid::Grid;
use crate::viewport::{CoordinateMapper, Point, ViewportState};

pub const DEFAULT_HOLD: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
}

/// Cursor hint for the host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Crosshair,
    Grab,
    Grabbing,
}

#[derive(Debug)]
pub struct Interaction {
    viewport: ViewportState,
    space_held: bool,
    drawing: bool,
    pan_start: Point,
    hold: Duration,
    releases: VecDeque<(Instant, usize, usize)>,
}

impl Interaction {
    pub fn new(viewport: ViewportState, hold: Duration) -> Self {
        Self {
            viewport,
            space_held: false,
            drawing: false,
            pan_start: Point::new(0.0, 0.0),
            hold,
            releases: VecDeque::new(),
        }
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportState {
        &mut self.viewport
    }

    pub fn cursor(&self) -> Cursor {
        match (self.space_held, self.viewport.is_panning) {
            (true, true) => Cursor::Grabbing,
            (true, false) => Cursor::Grab,
            _ => Cursor::Crosshair,
        }
    }

    pub fn pending_releases(&self) -> usize {
        self.releases.len()
    }

    pub fn handle(
        &mut self,
        event: InputEvent,
        now: Instant,
        mapper: &CoordinateMapper,
        grid: &mut Grid,
    ) {
        match event {
            InputEvent::KeyDown(Key::Space) => self.space_held = true,
            InputEvent::KeyUp(Key::Space) => {
                self.space_held = false;
                self.set_panning(false, grid);
            }
            InputEvent::KeyDown(Key::Other) | InputEvent::KeyUp(Key::Other) => {}
            InputEvent::PointerDown(p) => {
                if self.space_held {
                    self.pan_start =
                        Point::new(p.x - self.viewport.offset_x, p.y - self.viewport.offset_y);
                    self.set_panning(true, grid);
                } else {
                    self.drawing = true;
                    self.paint(p, now, mapper, grid);
                }
            }
            InputEvent::PointerMove(p) => {
                if self.viewport.is_panning {
                    self.viewport.offset_x = p.x - self.pan_start.x;
                    self.viewport.offset_y = p.y - self.pan_start.y;
                } else if self.drawing {
                    self.paint(p, now, mapper, grid);
                }
            }
            InputEvent::PointerUp => {
                self.drawing = false;
                self.set_panning(false, grid);
            }
        }
    }

    /// Switch off every cell whose hold time has elapsed. Returns how many
    /// releases were applied.
    pub fn tick(&mut self, now: Instant, grid: &mut Grid) -> usize {
        let mut released = 0;
        while let Some(&(due, x, y)) = self.releases.front() {
            if due > now {
                break;
            }
            self.releases.pop_front();
            grid.set_cell(x, y, false);
            released += 1;
        }
        released
    }

    fn set_panning(&mut self, panning: bool, grid: &mut Grid) {
        self.viewport.is_panning = panning;
        grid.set_panning(panning);
    }

    fn paint(&mut self, p: Point, now: Instant, mapper: &CoordinateMapper, grid: &mut Grid) {
        let (gx, gy) = mapper.screen_to_cell(&self.viewport, p);
        if let Some((x, y)) = mapper.in_bounds(gx, gy) {
            grid.set_cell(x, y, true);
            self.releases.push_back((now + self.hold, x, y));
        }
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new(ViewportState::default(), DEFAULT_HOLD)
    }
}
