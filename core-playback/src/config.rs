//! # Decoder Configuration
//!
//! Tuning knobs shared by every adapter.

use crate::decoder::SampleConversion;
use serde::{Deserialize, Serialize};

/// Decoder configuration.
///
/// Controls ring buffer sizing, native decode call sizes and the float to
/// 16-bit conversion policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Pull granularity in frames the ring buffer is sized for.
    ///
    /// The buffer holds `2 × channels × (buffer_frames + max unit)` bytes, so
    /// any request up to `buffer_frames` frames can always be satisfied.
    ///
    /// Default: 4096 frames.
    #[serde(default = "default_buffer_frames")]
    pub buffer_frames: usize,

    /// Frames requested per native Opus decode call.
    ///
    /// Default: 2048 frames.
    #[serde(default = "default_opus_decode_frames")]
    pub opus_decode_frames: usize,

    /// How float samples outside `[-1.0, 1.0)` map to 16-bit.
    ///
    /// Default: [`SampleConversion::Clamp`].
    #[serde(default)]
    pub conversion: SampleConversion,

    /// Use the whole-file Opus decoder (pre-skip and gain applied) instead of
    /// the packet-streaming one when dispatching `.ogg`/`.opus` files.
    ///
    /// Default: true.
    #[serde(default = "default_prefer_opus_file")]
    pub prefer_opus_file: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            buffer_frames: default_buffer_frames(),
            opus_decode_frames: default_opus_decode_frames(),
            conversion: SampleConversion::default(),
            prefer_opus_file: default_prefer_opus_file(),
        }
    }
}

impl DecoderConfig {
    /// Configuration that reproduces the wrapping float conversion bit for bit.
    pub fn compatible() -> Self {
        Self {
            conversion: SampleConversion::Wrap,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_frames == 0 {
            return Err("buffer_frames must be > 0".to_string());
        }

        if self.opus_decode_frames == 0 {
            return Err("opus_decode_frames must be > 0".to_string());
        }

        // 120 ms at 48 kHz is the longest Opus packet
        if self.opus_decode_frames > 5760 {
            return Err("opus_decode_frames cannot exceed 5760".to_string());
        }

        Ok(())
    }

    /// Ring buffer capacity in bytes for `channels` channels when one decode
    /// unit produces at most `max_unit_frames` frames.
    pub fn ring_capacity_bytes(&self, channels: usize, max_unit_frames: usize) -> usize {
        2 * channels * (self.buffer_frames + max_unit_frames)
    }
}

fn default_buffer_frames() -> usize {
    4096
}

fn default_opus_decode_frames() -> usize {
    2048
}

fn default_prefer_opus_file() -> bool {
    true
}
