//! # dotflip relay
//!
//! Receives matrix frames from any number of WebSocket producers, drops
//! duplicates and mis-sized frames, and pushes the rest to one display
//! [`Sink`](dotflip_io::Sink). A client that connects late is first sent
//! whatever is currently on the wall.

pub mod autoflip;
pub mod config;
pub mod net;
pub mod server;
pub mod state;

pub use config::{Cli, RelayConfig};
pub use server::{ChannelId, RelayOptions, RelayServer};
pub use state::{RelayState, Verdict};
