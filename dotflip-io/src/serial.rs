use std::io::Write;
use std::time::Duration;

use dotflip_core::Matrix;
use serialport::SerialPort;
use tokio::sync::{mpsc, watch};

use crate::panel::{DisplayConfig, PanelEncoder};
use crate::{DisplayEvent, Sink, SinkError, SinkGeometry};

/// A writer's outbox. Holds only the newest encoded frame.
struct PortHandle {
    path: String,
    outbox: watch::Sender<Vec<u8>>,
}

/// The flip-dot wall on one or more serial buses.
///
/// Each port gets a dedicated blocking writer fed through a latest-wins
/// channel: `send` only replaces the pending frame, and a slow bus skips
/// stale frames instead of queueing them.
pub struct FlipdotDisplay {
    encoder: PanelEncoder,
    ports: Vec<PortHandle>,
}

impl std::fmt::Debug for FlipdotDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlipdotDisplay")
            .field("geometry", &self.encoder.geometry())
            .field(
                "ports",
                &self.ports.iter().map(|p| p.path.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FlipdotDisplay {
    /// Open every configured port and start its writer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: &DisplayConfig,
    ) -> Result<(Self, mpsc::Receiver<DisplayEvent>), SinkError> {
        config.validate()?;
        let encoder = PanelEncoder::new(config)?;
        let (event_tx, event_rx) = mpsc::channel(256);

        let mut ports = Vec::with_capacity(config.devices.len());
        for device in &config.devices {
            let port = serialport::new(&device.path, device.baud_rate)
                .timeout(Duration::from_millis(100))
                .open()
                .map_err(|source| SinkError::Open {
                    path: device.path.clone(),
                    source,
                })?;

            tracing::info!(port = %device.path, baud = device.baud_rate, "display port opened");
            let _ = event_tx.try_send(DisplayEvent::DeviceConnected(device.path.clone()));

            let (outbox, inbox) = watch::channel(Vec::new());
            spawn_writer(device.path.clone(), port, inbox, event_tx.clone());
            ports.push(PortHandle {
                path: device.path.clone(),
                outbox,
            });
        }

        Ok((Self { encoder, ports }, event_rx))
    }
}

impl Sink for FlipdotDisplay {
    fn geometry(&self) -> SinkGeometry {
        self.encoder.geometry()
    }

    fn send(&self, matrix: &Matrix) -> Result<(), SinkError> {
        let buffers = self.encoder.encode(matrix)?;
        for (port, bytes) in self.ports.iter().zip(buffers) {
            port.outbox
                .send(bytes)
                .map_err(|_| SinkError::Closed(port.path.clone()))?;
        }
        Ok(())
    }
}

fn spawn_writer(
    path: String,
    mut port: Box<dyn SerialPort>,
    mut inbox: watch::Receiver<Vec<u8>>,
    events: mpsc::Sender<DisplayEvent>,
) {
    let rt = tokio::runtime::Handle::current();

    tokio::task::spawn_blocking(move || {
        while rt.block_on(inbox.changed()).is_ok() {
            let bytes = inbox.borrow_and_update().clone();
            match port.write_all(&bytes).and_then(|_| port.flush()) {
                Ok(()) => {
                    let _ = events.try_send(DisplayEvent::FrameWritten {
                        port: path.clone(),
                        bytes: bytes.len(),
                    });
                }
                Err(e) => {
                    tracing::error!(port = %path, "display write failed: {}", e);
                    let _ = events.try_send(DisplayEvent::Error(format!(
                        "Write to {} failed: {}",
                        path, e
                    )));
                    break;
                }
            }
        }

        tracing::info!(port = %path, "display writer stopped");
        let _ = events.try_send(DisplayEvent::DeviceDisconnected(path));
    });
}
