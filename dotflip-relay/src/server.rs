use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use dotflip_core::{FrameEnvelope, Matrix};
use dotflip_io::{Sink, SinkGeometry};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::Level;
use uuid::Uuid;

use crate::state::{RelayState, Verdict, rejection_level};

/// Identifies one connected producer or viewer.
pub type ChannelId = Uuid;

/// Encoded envelopes waiting for a channel's writer.
pub type Outbox = mpsc::Receiver<Arc<str>>;

pub const DEFAULT_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct RelayOptions {
    /// Forward accepted frames to every other open channel.
    pub broadcast: bool,
    /// Per-channel outbound queue length.
    pub queue_depth: usize,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            broadcast: false,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

struct Shared {
    state: RelayState,
    channels: HashMap<ChannelId, mpsc::Sender<Arc<str>>>,
}

/// Accepts frames from any number of channels and drives one sink.
///
/// All bookkeeping sits behind one mutex that is never held across an
/// await. The sink is called inside that critical section, which keeps
/// frames reaching the wall in acceptance order.
pub struct RelayServer {
    shared: Mutex<Shared>,
    sink: Arc<dyn Sink>,
    options: RelayOptions,
}

impl RelayServer {
    pub fn new(sink: Arc<dyn Sink>, options: RelayOptions) -> Self {
        Self {
            shared: Mutex::new(Shared {
                state: RelayState::new(sink.geometry()),
                channels: HashMap::new(),
            }),
            sink,
            options,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn geometry(&self) -> SinkGeometry {
        self.sink.geometry()
    }

    pub fn options(&self) -> RelayOptions {
        self.options
    }

    pub fn last_frame(&self) -> Option<Matrix> {
        self.lock().state.last_frame().cloned()
    }

    pub fn channel_count(&self) -> usize {
        self.lock().channels.len()
    }

    /// Add a channel. The last accepted frame, if any, is already queued on
    /// the returned outbox, ahead of anything else.
    pub fn register(&self) -> (ChannelId, Outbox) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.options.queue_depth.max(1));

        let mut shared = self.lock();
        if let Some(envelope) = shared.state.replay() {
            match envelope.encode() {
                Ok(text) => {
                    let _ = tx.try_send(Arc::from(text));
                }
                Err(e) => tracing::error!(channel = %id, "failed to encode replay: {}", e),
            }
        }
        shared.channels.insert(id, tx);
        tracing::info!(channel = %id, open = shared.channels.len(), "channel registered");

        (id, rx)
    }

    pub fn deregister(&self, id: ChannelId) {
        let mut shared = self.lock();
        if shared.channels.remove(&id).is_some() {
            tracing::info!(channel = %id, open = shared.channels.len(), "channel closed");
        }
    }

    /// Run one inbound text frame through the relay.
    pub fn handle_text(&self, from: ChannelId, text: &str) -> Verdict {
        let mut shared = self.lock();
        let verdict = shared.state.ingest(text);

        match &verdict {
            Verdict::Accepted => {
                if let Some(frame) = shared.state.last_frame() {
                    tracing::info!(channel = %from, "Updating display ({})", frame.dimensions());

                    if let Err(e) = self.sink.send(frame) {
                        tracing::error!(channel = %from, "display update failed: {}", e);
                    }

                    if self.options.broadcast {
                        fan_out(&shared.channels, from, frame.clone());
                    }
                }
            }
            Verdict::Duplicate => {
                tracing::debug!(channel = %from, "frame unchanged, skipped");
            }
            Verdict::Rejected(e) => {
                if rejection_level(e) == Level::ERROR {
                    tracing::error!(channel = %from, "frame rejected: {}", e);
                } else {
                    tracing::warn!(channel = %from, "invalid frame: {}", e);
                }
            }
        }

        verdict
    }

    /// Serve one WebSocket connection until either side closes it.
    pub async fn handle_connection(self: Arc<Self>, stream: TcpStream, addr: SocketAddr) {
        let ws = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                tracing::warn!(%addr, "websocket handshake failed: {}", e);
                return;
            }
        };

        let (id, mut outbox) = self.register();
        tracing::info!(%addr, channel = %id, "client connected");
        let (mut ws_tx, mut ws_rx) = ws.split();

        let writer = tokio::spawn(async move {
            while let Some(text) = outbox.recv().await {
                if let Err(e) = ws_tx.send(Message::text(text.to_string())).await {
                    tracing::debug!(channel = %id, "write failed: {}", e);
                    break;
                }
            }
            let _ = ws_tx.close().await;
        });

        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    self.handle_text(id, &text);
                }
                Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                    Ok(text) => {
                        self.handle_text(id, text);
                    }
                    Err(e) => tracing::warn!(channel = %id, "binary frame is not UTF-8: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(channel = %id, "receive error: {}", e);
                    break;
                }
            }
        }

        // Dropping the registry entry closes the outbox and ends the writer.
        self.deregister(id);
        let _ = writer.await;
        tracing::info!(%addr, channel = %id, "client disconnected");
    }

    /// Accept connections until `shutdown` resolves.
    pub async fn serve<F>(self: Arc<Self>, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("relay shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        tokio::spawn(Arc::clone(&self).handle_connection(stream, addr));
                    }
                    Err(e) => tracing::warn!("accept failed: {}", e),
                },
            }
        }
    }
}

fn fan_out(channels: &HashMap<ChannelId, mpsc::Sender<Arc<str>>>, from: ChannelId, frame: Matrix) {
    let text: Arc<str> = match FrameEnvelope::matrix(frame).encode() {
        Ok(text) => Arc::from(text),
        Err(e) => {
            tracing::error!("failed to encode broadcast: {}", e);
            return;
        }
    };

    for (id, tx) in channels.iter().filter(|(id, _)| **id != from) {
        if let Err(e) = tx.try_send(Arc::clone(&text)) {
            tracing::debug!(channel = %id, "broadcast dropped: {}", e);
        }
    }
}
