use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotflip_core::util;
use dotflip_io::DisplayEvent;
use dotflip_relay::{Cli, RelayConfig, RelayServer, autoflip, net};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    util::init_tracing();
    util::install_panic_hook();

    let cli = Cli::parse();
    let config = RelayConfig::resolve(&cli)?;

    let (sink, events) = dotflip_io::open(&config.display).context("failed to open display")?;
    tracing::info!(
        style = ?config.display.style,
        "Display size: {}x{}",
        sink.width(),
        sink.height()
    );

    if let Some(mut events) = events {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    DisplayEvent::DeviceConnected(port) => tracing::info!(%port, "display connected"),
                    DisplayEvent::DeviceDisconnected(port) => {
                        tracing::warn!(%port, "display disconnected")
                    }
                    DisplayEvent::FrameWritten { port, bytes } => {
                        tracing::trace!(%port, bytes, "frame written")
                    }
                    DisplayEvent::Error(e) => tracing::error!("display error: {}", e),
                }
            }
        });
    }

    if config.auto_flip {
        autoflip::spawn(Arc::clone(&sink), config.auto_flip_interval());
    }

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let bound = listener.local_addr()?;
    tracing::info!(broadcast = config.broadcast, "Listening on {}", net::public_url(bound));

    let server = Arc::new(RelayServer::new(sink, config.options()));
    server
        .serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
