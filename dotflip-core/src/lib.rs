//! # dotflip core
//!
//! The producer-side model of a flip-dot wall: an addressable cell grid,
//! the mirror/invert transform applied before each emission, the
//! screen-to-cell mapping used for hand drawing, and the JSON frame
//! envelope shared with the relay.

pub mod error;
pub mod grid;
pub mod interaction;
pub mod matrix;
pub mod protocol;
pub mod transform;
pub mod util;
pub mod viewport;

pub use error::{Dimensions, FrameError};
pub use grid::{Cell, Grid, GridGeometry};
pub use matrix::Matrix;
pub use protocol::FrameEnvelope;
pub use transform::{Layout, TransformConfig, transform};
pub use viewport::{CoordinateMapper, Point, ViewportState};
