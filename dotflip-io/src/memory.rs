use std::sync::Mutex;

use dotflip_core::Matrix;

use crate::{Sink, SinkError, SinkGeometry, check_geometry};

/// Keeps every frame it is sent. Used for dry runs and tests.
#[derive(Debug)]
pub struct MemoryDisplay {
    geometry: SinkGeometry,
    frames: Mutex<Vec<Matrix>>,
}

impl MemoryDisplay {
    pub fn new(geometry: SinkGeometry) -> Self {
        Self {
            geometry,
            frames: Mutex::new(Vec::new()),
        }
    }

    pub fn frames(&self) -> Vec<Matrix> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<Matrix> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemoryDisplay {
    fn geometry(&self) -> SinkGeometry {
        self.geometry
    }

    fn send(&self, matrix: &Matrix) -> Result<(), SinkError> {
        check_geometry(self.geometry, matrix)?;
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(matrix.clone());
        Ok(())
    }
}
