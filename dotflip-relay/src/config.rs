//! Relay settings: an optional TOML file, overridden by command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dotflip_io::{DisplayConfig, DisplayStyle};
use serde::{Deserialize, Serialize};

use crate::server::{DEFAULT_QUEUE_DEPTH, RelayOptions};

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Relay a flip-dot wall over WebSocket.
#[derive(Parser, Debug, Default)]
#[command(name = "dotflip-relay", author, version, about)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long, env = "DOTFLIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:3000
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Display backend
    #[arg(short, long, value_enum)]
    pub style: Option<StyleArg>,

    /// Forward accepted frames to every other connected client
    #[arg(long)]
    pub broadcast: bool,

    /// Flip the whole wall on and off periodically (hardware test)
    #[arg(long)]
    pub auto_flip: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    Flipdot,
    Console,
    Memory,
}

impl From<StyleArg> for DisplayStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Flipdot => DisplayStyle::Flipdot,
            StyleArg::Console => DisplayStyle::Console,
            StyleArg::Memory => DisplayStyle::Memory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind: String,
    pub broadcast: bool,
    pub queue_depth: usize,
    pub auto_flip: bool,
    pub auto_flip_interval_ms: u64,
    pub display: DisplayConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            broadcast: false,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            auto_flip: false,
            auto_flip_interval_ms: 1000,
            display: DisplayConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid relay config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Command-line flags win over the file.
    pub fn apply(&mut self, cli: &Cli) {
        if let Some(bind) = &cli.bind {
            self.bind = bind.clone();
        }
        if let Some(style) = cli.style {
            self.display.style = style.into();
        }
        if cli.broadcast {
            self.broadcast = true;
        }
        if cli.auto_flip {
            self.auto_flip = true;
        }
    }

    /// File (if given) plus flags, validated.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(cli);
        config
            .display
            .validate()
            .context("invalid display config")?;
        Ok(config)
    }

    pub fn options(&self) -> RelayOptions {
        RelayOptions {
            broadcast: self.broadcast,
            queue_depth: self.queue_depth,
        }
    }

    pub fn auto_flip_interval(&self) -> Duration {
        Duration::from_millis(self.auto_flip_interval_ms.max(1))
    }
}
