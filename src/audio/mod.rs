//! Audio capture: device enumeration and the microphone frame source.

pub mod capture;

pub use capture::{AudioDevice, CpalFrameSource, list_devices, suppress_audio_warnings};

use std::time::Instant;

/// A fixed-size block of mono 16-bit PCM samples.
///
/// Owned exclusively by the producing stage until handed to the uplink via
/// the frame queue; never retained after consumption.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// PCM samples (16-bit signed integers).
    pub samples: Vec<i16>,
    /// Timestamp when this frame was captured.
    pub captured_at: Instant,
    /// Sequence number for ordering.
    pub sequence: u64,
}

impl AudioFrame {
    /// Creates a new audio frame.
    pub fn new(samples: Vec<i16>, sequence: u64) -> Self {
        Self {
            samples,
            captured_at: Instant::now(),
            sequence,
        }
    }

    /// Returns the duration of this frame in milliseconds.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        (self.samples.len() as u32 * 1000) / sample_rate
    }
}
