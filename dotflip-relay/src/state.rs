//! The relay's accept/dedup decision, independent of any transport.

use dotflip_core::{FrameEnvelope, FrameError, Matrix};
use dotflip_io::SinkGeometry;
use tracing::Level;

/// What happened to one inbound frame.
#[derive(Debug)]
pub enum Verdict {
    /// New content of the right size; it is now the last frame.
    Accepted,
    /// Structurally equal to the last frame; nothing to do.
    Duplicate,
    Rejected(FrameError),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Log level for a rejected frame: malformed JSON and size mismatches are
/// errors, schema problems are warnings.
pub fn rejection_level(error: &FrameError) -> Level {
    if error.is_schema() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

/// The last accepted frame, checked against a fixed sink geometry.
///
/// A frame only becomes the dedup baseline after it passes validation, so a
/// mis-sized frame can never shadow the content actually on the wall.
#[derive(Debug)]
pub struct RelayState {
    geometry: SinkGeometry,
    last_frame: Option<Matrix>,
}

impl RelayState {
    pub fn new(geometry: SinkGeometry) -> Self {
        Self {
            geometry,
            last_frame: None,
        }
    }

    pub fn geometry(&self) -> SinkGeometry {
        self.geometry
    }

    pub fn last_frame(&self) -> Option<&Matrix> {
        self.last_frame.as_ref()
    }

    /// Decode and offer one text frame.
    pub fn ingest(&mut self, text: &str) -> Verdict {
        match FrameEnvelope::decode(text) {
            Ok(envelope) => self.offer(envelope.into_payload()),
            Err(e) => Verdict::Rejected(e),
        }
    }

    pub fn offer(&mut self, payload: Matrix) -> Verdict {
        if self.last_frame.as_ref() == Some(&payload) {
            return Verdict::Duplicate;
        }

        let received = payload.dimensions();
        if received != self.geometry {
            return Verdict::Rejected(FrameError::DimensionMismatch {
                received,
                expected: self.geometry,
            });
        }

        self.last_frame = Some(payload);
        Verdict::Accepted
    }

    /// Envelope for a channel that just joined, if there is anything to show.
    pub fn replay(&self) -> Option<FrameEnvelope> {
        self.last_frame.clone().map(FrameEnvelope::matrix)
    }
}
