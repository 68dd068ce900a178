//! # dotflip IO
//!
//! The display side of the relay. Every accepted frame ends up in a
//! [`Sink`]: a fixed-geometry consumer whose `send` never blocks the caller.
//! Which implementation backs it is decided once, at startup, from the
//! display style in the config.

use std::sync::Arc;

use dotflip_core::{Dimensions, Matrix};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

pub mod console;
pub mod memory;
pub mod panel;
pub mod serial;

pub use console::ConsoleDisplay;
pub use memory::MemoryDisplay;
pub use panel::{DeviceConfig, DisplayConfig, PanelEncoder, PanelSize};
pub use serial::FlipdotDisplay;

/// `(width, height)` a sink accepts. Fixed for the sink's lifetime.
pub type SinkGeometry = Dimensions;

/// Hardware-facing consumer of accepted frames.
pub trait Sink: Send + Sync {
    fn geometry(&self) -> SinkGeometry;

    /// Hand a frame to the display. Must not block on the device.
    fn send(&self, matrix: &Matrix) -> Result<(), SinkError>;

    fn width(&self) -> usize {
        self.geometry().width
    }

    fn height(&self) -> usize {
        self.geometry().height
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("frame is {received}, display is {expected}")]
    Geometry {
        received: Dimensions,
        expected: Dimensions,
    },

    #[error("invalid display config: {0}")]
    Config(String),

    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    #[error("display port {0} is closed")]
    Closed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reject frames that do not match the sink exactly.
pub fn check_geometry(expected: SinkGeometry, matrix: &Matrix) -> Result<(), SinkError> {
    let received = matrix.dimensions();
    if received != expected {
        return Err(SinkError::Geometry { received, expected });
    }
    Ok(())
}

/// Which [`Sink`] implementation backs the relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    /// Serial flip-dot panels.
    Flipdot,
    /// ASCII rendering on stdout.
    #[default]
    Console,
    /// Keep frames in memory only.
    Memory,
}

/// Events from the display layer.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    DeviceConnected(String),
    DeviceDisconnected(String),
    FrameWritten { port: String, bytes: usize },
    Error(String),
}

/// Build the sink selected by `config.style`.
///
/// The flip-dot variant spawns its writers on the current tokio runtime and
/// also returns its event stream.
pub fn open(
    config: &DisplayConfig,
) -> Result<(Arc<dyn Sink>, Option<mpsc::Receiver<DisplayEvent>>), SinkError> {
    config.validate()?;
    let geometry = config.geometry();

    match config.style {
        DisplayStyle::Flipdot => {
            let (display, events) = FlipdotDisplay::start(config)?;
            Ok((Arc::new(display), Some(events)))
        }
        DisplayStyle::Console => Ok((Arc::new(ConsoleDisplay::stdout(geometry)), None)),
        DisplayStyle::Memory => Ok((Arc::new(MemoryDisplay::new(geometry)), None)),
    }
}
