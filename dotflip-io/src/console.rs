use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Local;
use dotflip_core::Matrix;

use crate::{Sink, SinkError, SinkGeometry, check_geometry};

/// Debug display: prints each frame as rows of `⬤` and `·`.
pub struct ConsoleDisplay {
    geometry: SinkGeometry,
    clear_screen: bool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleDisplay {
    /// Redraws in place on stdout.
    pub fn stdout(geometry: SinkGeometry) -> Self {
        Self {
            geometry,
            clear_screen: true,
            out: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Appends frames to `out` without clearing.
    pub fn with_writer(geometry: SinkGeometry, out: Box<dyn Write + Send>) -> Self {
        Self {
            geometry,
            clear_screen: false,
            out: Mutex::new(out),
        }
    }
}

impl Sink for ConsoleDisplay {
    fn geometry(&self) -> SinkGeometry {
        self.geometry
    }

    fn send(&self, matrix: &Matrix) -> Result<(), SinkError> {
        check_geometry(self.geometry, matrix)?;

        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if self.clear_screen {
            write!(out, "\x1Bc")?;
        }
        writeln!(out, "Update at {}\n", Local::now().format("%H:%M:%S"))?;
        writeln!(out, "{}", matrix.to_ascii())?;
        out.flush()?;
        Ok(())
    }
}
