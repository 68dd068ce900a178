use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dotflip_core::{FrameEnvelope, Grid, Matrix, TransformConfig, transform};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::channel::{ChannelError, ChannelState, FrameChannel};
use crate::generators::Generator;

/// 25 frames per second.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(40);

/// Everything that decides what the next frame looks like.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    pub grid: Grid,
    pub transform: TransformConfig,
}

/// Grid plus transform, shared by the emitter and any generator tasks.
///
/// One lock covers both, so a snapshot never sees half a generator pass.
#[derive(Debug, Clone, Default)]
pub struct SharedCanvas(Arc<Mutex<Canvas>>);

impl SharedCanvas {
    pub fn new(canvas: Canvas) -> Self {
        Self(Arc::new(Mutex::new(canvas)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Canvas> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The matrix that would be transmitted right now.
    pub fn frame(&self) -> Matrix {
        let canvas = self.lock();
        transform(&canvas.grid, &canvas.transform)
    }
}

/// Streams the canvas to a relay on a fixed tick.
///
/// Every tick sends, changed or not; the relay does the deduplication.
pub struct ProducerSession {
    canvas: SharedCanvas,
    period: Duration,
    listen: bool,
}

impl ProducerSession {
    pub fn new(canvas: SharedCanvas) -> Self {
        Self {
            canvas,
            period: DEFAULT_PERIOD,
            listen: false,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period.max(Duration::from_millis(1));
        self
    }

    /// Also copy every frame received from the relay into the grid.
    pub fn with_listen(mut self, listen: bool) -> Self {
        self.listen = listen;
        self
    }

    pub fn canvas(&self) -> &SharedCanvas {
        &self.canvas
    }

    /// Run until `shutdown` resolves or the channel closes.
    pub async fn run<F>(&self, mut channel: FrameChannel, shutdown: F) -> Result<(), ChannelError>
    where
        F: Future<Output = ()>,
    {
        channel.wait_open().await?;
        let (sender, mut receiver) = channel.split();

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(
            period_ms = self.period.as_millis() as u64,
            listen = self.listen,
            "session started"
        );

        let mut sent: u64 = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(sent, "session stopped");
                    sender.close();
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let envelope = FrameEnvelope::matrix(self.canvas.frame());
                    sender.send(&envelope).await?;
                    sent += 1;
                }
                received = receiver.recv(), if self.listen => match received {
                    Some(envelope) => self.canvas.lock().grid.load(envelope.payload()),
                    None => return Err(ChannelError::NotOpen(ChannelState::Closed)),
                },
            }
        }
    }
}

/// Drive `generator` against the canvas, one frame per `period`.
pub fn spawn_generator<G>(canvas: SharedCanvas, mut generator: G, period: Duration) -> JoinHandle<()>
where
    G: Generator + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut n: u64 = 0;
        loop {
            ticker.tick().await;
            let mut guard = canvas.lock();
            generator.render(n, &mut guard.grid);
            drop(guard);
            n = n.wrapping_add(1);
        }
    })
}
