//! # dotflip producer
//!
//! The sending end of the wall: a [`Canvas`](session::Canvas) that
//! generators and viewers draw into, and a [`ProducerSession`] that streams
//! its transformed contents to the relay on a fixed tick.

pub mod channel;
pub mod cli;
pub mod generators;
pub mod session;

pub use channel::{ChannelError, ChannelState, FrameChannel};
pub use generators::{Blank, Blink, Checker, Generator, threshold_rgba};
pub use session::{Canvas, ProducerSession, SharedCanvas};
