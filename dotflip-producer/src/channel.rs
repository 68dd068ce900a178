//! A duplex frame channel over one WebSocket connection.
//!
//! The connection is driven by a background task. Callers only see two
//! queues and a state flag, so the sending and receiving halves can be used
//! from different branches of a `select!` without sharing a borrow.

use dotflip_core::{FrameEnvelope, FrameError};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

const OUTGOING_DEPTH: usize = 4;
const INCOMING_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    /// Terminal. There is no reconnection.
    Closed,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel is not open ({0:?})")]
    NotOpen(ChannelState),

    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] FrameError),
}

pub struct FrameChannel {
    sender: FrameSender,
    receiver: FrameReceiver,
    ready: Option<oneshot::Receiver<Result<(), ChannelError>>>,
}

/// Sending half of a [`FrameChannel`]. Dropping it closes the connection.
pub struct FrameSender {
    state: watch::Receiver<ChannelState>,
    outgoing: mpsc::Sender<String>,
}

/// Receiving half of a [`FrameChannel`].
pub struct FrameReceiver {
    state: watch::Receiver<ChannelState>,
    incoming: mpsc::Receiver<FrameEnvelope>,
}

impl FrameChannel {
    /// Start connecting to `url`. Returns immediately in `Connecting`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(url: impl Into<String>) -> Self {
        let url = url.into();
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let (out_tx, out_rx) = mpsc::channel(OUTGOING_DEPTH);
        let (in_tx, in_rx) = mpsc::channel(INCOMING_DEPTH);
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::spawn(drive(url, state_tx, out_rx, in_tx, ready_tx));

        Self {
            sender: FrameSender {
                state: state_rx.clone(),
                outgoing: out_tx,
            },
            receiver: FrameReceiver {
                state: state_rx,
                incoming: in_rx,
            },
            ready: Some(ready_rx),
        }
    }

    pub fn state(&self) -> ChannelState {
        self.sender.state()
    }

    /// Wait for the handshake to finish.
    pub async fn wait_open(&mut self) -> Result<(), ChannelError> {
        match self.ready.take() {
            Some(ready) => ready
                .await
                .unwrap_or(Err(ChannelError::NotOpen(ChannelState::Closed))),
            None => match self.state() {
                ChannelState::Open => Ok(()),
                other => Err(ChannelError::NotOpen(other)),
            },
        }
    }

    pub async fn send(&self, envelope: &FrameEnvelope) -> Result<(), ChannelError> {
        self.sender.send(envelope).await
    }

    pub async fn recv(&mut self) -> Option<FrameEnvelope> {
        self.receiver.recv().await
    }

    pub fn close(self) {
        self.sender.close();
    }

    pub fn split(self) -> (FrameSender, FrameReceiver) {
        (self.sender, self.receiver)
    }
}

impl FrameSender {
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub async fn send(&self, envelope: &FrameEnvelope) -> Result<(), ChannelError> {
        let state = self.state();
        if state != ChannelState::Open {
            return Err(ChannelError::NotOpen(state));
        }

        let text = envelope.encode()?;
        self.outgoing
            .send(text)
            .await
            .map_err(|_| ChannelError::NotOpen(ChannelState::Closed))
    }

    pub fn close(self) {
        drop(self);
    }
}

impl FrameReceiver {
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Next valid envelope. `None` once the channel is closed; envelopes
    /// still queued at that point are discarded.
    pub async fn recv(&mut self) -> Option<FrameEnvelope> {
        let envelope = self.incoming.recv().await?;
        if self.state() != ChannelState::Open {
            self.incoming.close();
            return None;
        }
        Some(envelope)
    }
}

async fn drive(
    url: String,
    state: watch::Sender<ChannelState>,
    mut outgoing: mpsc::Receiver<String>,
    incoming: mpsc::Sender<FrameEnvelope>,
    ready: oneshot::Sender<Result<(), ChannelError>>,
) {
    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            tracing::warn!(%url, "connection failed: {}", e);
            state.send_replace(ChannelState::Closed);
            let _ = ready.send(Err(e.into()));
            return;
        }
    };

    state.send_replace(ChannelState::Open);
    tracing::info!(%url, "channel open");
    let _ = ready.send(Ok(()));

    let (mut ws_tx, mut ws_rx) = ws.split();
    loop {
        tokio::select! {
            out = outgoing.recv() => match out {
                Some(text) => {
                    if let Err(e) = ws_tx.send(Message::text(text)).await {
                        tracing::warn!(%url, "send failed: {}", e);
                        break;
                    }
                }
                None => {
                    let _ = ws_tx.close().await;
                    break;
                }
            },
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => deliver(&incoming, &text),
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => deliver(&incoming, text),
                    Err(e) => tracing::warn!(%url, "binary frame is not UTF-8: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(%url, "receive failed: {}", e);
                    break;
                }
            },
        }
    }

    state.send_replace(ChannelState::Closed);
    tracing::info!(%url, "channel closed");
}

fn deliver(incoming: &mpsc::Sender<FrameEnvelope>, text: &str) {
    match FrameEnvelope::decode(text) {
        Ok(envelope) => {
            if incoming.try_send(envelope).is_err() {
                tracing::trace!("incoming frame dropped");
            }
        }
        Err(e) => tracing::warn!("ignoring invalid frame: {}", e),
    }
}
