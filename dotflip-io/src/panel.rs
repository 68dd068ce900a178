//! Panel layout and the serial frame encoding for flip-dot panels.
//!
//! A wall is a grid of panels, each known by its bus address. Every panel
//! column becomes one data byte (bit `y` drives row `y`), wrapped as
//!
//! ```text
//! 0x80 <cmd> <address> <data...> 0x8F
//! ```
//!
//! Panels are loaded with the no-refresh command and then flipped together
//! by one refresh-all frame per serial device, so the whole wall updates at
//! once.

use dotflip_core::Matrix;
use serde::{Deserialize, Serialize};

use crate::{DisplayStyle, SinkError, SinkGeometry, check_geometry};

pub const FRAME_START: u8 = 0x80;
pub const FRAME_END: u8 = 0x8F;
pub const CMD_REFRESH_ALL: u8 = 0x82;

/// Rows a single data byte can drive.
pub const MAX_PANEL_HEIGHT: usize = 7;

/// No-refresh load command for a panel `width` columns wide.
pub fn load_command(width: usize) -> Option<u8> {
    match width {
        28 => Some(0x84),
        56 => Some(0x86),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSize {
    pub width: usize,
    pub height: usize,
}

impl Default for PanelSize {
    fn default() -> Self {
        Self {
            width: 28,
            height: 7,
        }
    }
}

fn default_baud_rate() -> u32 {
    57600
}

/// One serial bus and the panel addresses wired to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub path: String,
    pub addresses: Vec<u8>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub style: DisplayStyle,
    /// Flip the wall horizontally before packing (panels seen from behind).
    pub mirrored: bool,
    pub panel: PanelSize,
    /// Panel addresses, row-major as seen from the front of the wall.
    pub layout: Vec<Vec<u8>>,
    pub devices: Vec<DeviceConfig>,
}

impl Default for DisplayConfig {
    /// Three columns of six 28×7 panels on three USB serial adapters.
    fn default() -> Self {
        let bus = |path: &str, first: u8| DeviceConfig {
            path: path.to_string(),
            addresses: (first..first + 6).collect(),
            baud_rate: default_baud_rate(),
        };

        Self {
            style: DisplayStyle::default(),
            mirrored: true,
            panel: PanelSize::default(),
            layout: (1..=6).map(|r| vec![r, r + 6, r + 12]).collect(),
            devices: vec![
                bus("/dev/tty.usbserial-BG00XYPR", 1),
                bus("/dev/tty.usbserial-BG00Q55A", 7),
                bus("/dev/tty.usbserial-B00008XX", 13),
            ],
        }
    }
}

impl DisplayConfig {
    pub fn layout_cols(&self) -> usize {
        self.layout.first().map_or(0, Vec::len)
    }

    pub fn geometry(&self) -> SinkGeometry {
        SinkGeometry::new(
            self.layout_cols() * self.panel.width,
            self.layout.len() * self.panel.height,
        )
    }

    /// Find the `(row, col)` of a panel address in the layout.
    pub fn position_of(&self, address: u8) -> Option<(usize, usize)> {
        self.layout.iter().enumerate().find_map(|(r, row)| {
            row.iter().position(|&a| a == address).map(|c| (r, c))
        })
    }

    pub fn validate(&self) -> Result<(), SinkError> {
        let cols = self.layout_cols();
        if self.layout.is_empty() || cols == 0 {
            return Err(SinkError::Config("layout is empty".into()));
        }
        if let Some(r) = self.layout.iter().position(|row| row.len() != cols) {
            return Err(SinkError::Config(format!(
                "layout row {} has {} panels, expected {}",
                r,
                self.layout[r].len(),
                cols
            )));
        }
        if self.panel.width == 0 || self.panel.height == 0 {
            return Err(SinkError::Config("panel size must be non-zero".into()));
        }

        // The wiring only matters when real panels are driven.
        if self.style != DisplayStyle::Flipdot {
            return Ok(());
        }

        if load_command(self.panel.width).is_none() {
            return Err(SinkError::Config(format!(
                "unsupported panel width {}",
                self.panel.width
            )));
        }
        if self.panel.height > MAX_PANEL_HEIGHT {
            return Err(SinkError::Config(format!(
                "panel height {} exceeds {}",
                self.panel.height, MAX_PANEL_HEIGHT
            )));
        }
        if self.devices.is_empty() {
            return Err(SinkError::Config("no serial devices configured".into()));
        }

        for address in self.layout.iter().flatten() {
            let owners = self
                .devices
                .iter()
                .filter(|d| d.addresses.contains(address))
                .count();
            if owners != 1 {
                return Err(SinkError::Config(format!(
                    "panel {} is wired to {} devices, expected 1",
                    address, owners
                )));
            }
        }
        for device in &self.devices {
            if let Some(a) = device.addresses.iter().find(|&&a| self.position_of(a).is_none()) {
                return Err(SinkError::Config(format!(
                    "{} drives panel {} which is not in the layout",
                    device.path, a
                )));
            }
        }
        Ok(())
    }
}

/// Turns a wall-sized matrix into one byte stream per serial device.
#[derive(Debug, Clone)]
pub struct PanelEncoder {
    panel: PanelSize,
    command: u8,
    mirrored: bool,
    geometry: SinkGeometry,
    /// Per device, in device order: `(address, row, col)` of each panel.
    buses: Vec<Vec<(u8, usize, usize)>>,
}

impl PanelEncoder {
    pub fn new(config: &DisplayConfig) -> Result<Self, SinkError> {
        let command = load_command(config.panel.width).ok_or_else(|| {
            SinkError::Config(format!("unsupported panel width {}", config.panel.width))
        })?;

        let buses = config
            .devices
            .iter()
            .map(|device| {
                device
                    .addresses
                    .iter()
                    .map(|&a| {
                        config
                            .position_of(a)
                            .map(|(r, c)| (a, r, c))
                            .ok_or_else(|| {
                                SinkError::Config(format!("panel {} is not in the layout", a))
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            panel: config.panel,
            command,
            mirrored: config.mirrored,
            geometry: config.geometry(),
            buses,
        })
    }

    pub fn geometry(&self) -> SinkGeometry {
        self.geometry
    }

    /// Encode a frame. The result has one buffer per configured device.
    pub fn encode(&self, matrix: &Matrix) -> Result<Vec<Vec<u8>>, SinkError> {
        check_geometry(self.geometry, matrix)?;

        let frame_len = self.panel.width + 4;
        Ok(self
            .buses
            .iter()
            .map(|panels| {
                let mut out = Vec::with_capacity(panels.len() * frame_len + 3);
                for &(address, row, col) in panels {
                    out.push(FRAME_START);
                    out.push(self.command);
                    out.push(address);
                    out.extend(self.pack(matrix, row, col));
                    out.push(FRAME_END);
                }
                out.extend([FRAME_START, CMD_REFRESH_ALL, FRAME_END]);
                out
            })
            .collect())
    }

    /// Column bytes for the panel at layout position `(row, col)`.
    fn pack(&self, matrix: &Matrix, row: usize, col: usize) -> Vec<u8> {
        let width = self.geometry.width;
        let y0 = row * self.panel.height;
        let x0 = col * self.panel.width;

        (x0..x0 + self.panel.width)
            .map(|x| {
                let x = if self.mirrored { width - 1 - x } else { x };
                (0..self.panel.height).fold(0u8, |byte, dy| {
                    if matrix.is_on(x, y0 + dy) {
                        byte | (1 << dy)
                    } else {
                        byte
                    }
                })
            })
            .collect()
    }
}
