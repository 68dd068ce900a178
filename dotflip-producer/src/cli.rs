use std::time::Duration;

use clap::{Parser, ValueEnum};
use dotflip_core::{GridGeometry, TransformConfig};

use crate::generators::{Blank, Blink, Checker, Generator};
use crate::session::DEFAULT_PERIOD;

/// Stream a test pattern to a dotflip relay.
#[derive(Parser, Debug)]
#[command(name = "dotflip-producer", author, version, about)]
pub struct Cli {
    /// Relay address
    #[arg(short, long, env = "DOTFLIP_URL", default_value = "ws://localhost:3000")]
    pub url: String,

    /// What to draw
    #[arg(short, long, value_enum, default_value_t = Pattern::Blink)]
    pub pattern: Pattern,

    /// Mirror whatever the relay sends back into the grid
    #[arg(long)]
    pub listen: bool,

    /// Panels across
    #[arg(long, default_value_t = 3)]
    pub grid_cols: usize,

    /// Panels down
    #[arg(long, default_value_t = 3)]
    pub grid_rows: usize,

    /// Dots per panel, horizontally
    #[arg(long, default_value_t = 28)]
    pub cols_per_grid: usize,

    /// Dots per panel, vertically
    #[arg(long, default_value_t = 14)]
    pub rows_per_grid: usize,

    #[arg(long)]
    pub mirror_h: bool,

    #[arg(long)]
    pub mirror_v: bool,

    #[arg(long)]
    pub invert: bool,

    /// Milliseconds between transmitted frames
    #[arg(long, default_value_t = DEFAULT_PERIOD.as_millis() as u64)]
    pub period_ms: u64,

    /// Milliseconds between pattern steps
    #[arg(long, default_value_t = 1000)]
    pub generator_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    Blink,
    Checker,
    Blank,
}

impl Pattern {
    pub fn generator(self) -> Box<dyn Generator> {
        match self {
            Pattern::Blink => Box::new(Blink),
            Pattern::Checker => Box::new(Checker::default()),
            Pattern::Blank => Box::new(Blank),
        }
    }
}

impl Cli {
    pub fn geometry(&self) -> GridGeometry {
        GridGeometry {
            grid_cols: self.grid_cols,
            grid_rows: self.grid_rows,
            cols_per_grid: self.cols_per_grid,
            rows_per_grid: self.rows_per_grid,
        }
    }

    pub fn transform(&self) -> TransformConfig {
        TransformConfig {
            mirror_h: self.mirror_h,
            mirror_v: self.mirror_v,
            invert: self.invert,
            ..Default::default()
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn generator_period(&self) -> Duration {
        Duration::from_millis(self.generator_ms)
    }
}
