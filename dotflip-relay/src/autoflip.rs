use std::sync::Arc;
use std::time::Duration;

use dotflip_core::Matrix;
use dotflip_io::{Sink, SinkGeometry};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Alternating all-off / all-on frames sized for one sink.
#[derive(Debug, Clone)]
pub struct AutoFlip {
    geometry: SinkGeometry,
    on: bool,
}

impl AutoFlip {
    pub fn new(geometry: SinkGeometry) -> Self {
        Self { geometry, on: true }
    }

    /// The first frame is all-off.
    pub fn next_frame(&mut self) -> Matrix {
        self.on = !self.on;
        Matrix::filled(self.geometry.width, self.geometry.height, self.on)
    }
}

/// Flip the whole wall every `period`, bypassing the relay.
pub fn spawn(sink: Arc<dyn Sink>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut flip = AutoFlip::new(sink.geometry());
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(period_ms = period.as_millis() as u64, "auto-flip started");

        loop {
            ticker.tick().await;
            if let Err(e) = sink.send(&flip.next_frame()) {
                tracing::error!("auto-flip failed: {}", e);
            }
        }
    })
}
