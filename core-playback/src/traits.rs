//! # Core Playback Traits
//!
//! The uniform contract the playback loop drives, independent of codec.
//!
//! ## Architecture
//!
//! The playback loop is a **pull model**: it asks a [`PcmDecoder`] for a fixed
//! number of frames, writes them to its sink, and asks again. Each decoder
//! pulls compressed units from its source on demand and absorbs the size
//! mismatch in a ring buffer.
//!
//! ## Threading Model
//!
//! Single-threaded and synchronous. `decode_samples` blocks until the request
//! is satisfied or the source is exhausted; callers that need to react to an
//! interrupt check for it between calls.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_playback::{open_decoder, DecoderConfig, PcmDecoder};
//! use std::path::Path;
//!
//! # fn example() -> core_playback::Result<()> {
//! let mut decoder = open_decoder(Path::new("/music/song.ogg"), &DecoderConfig::default())?;
//! let format = decoder.format()?;
//!
//! let mut pcm = vec![0u8; format.bytes_per_frame() * 2048];
//! loop {
//!     let frames = decoder.decode_samples(2048, &mut pcm)?;
//!     if frames == 0 {
//!         break;
//!     }
//!     // hand pcm[..frames * format.bytes_per_frame()] to the sink
//! }
//! decoder.close()?;
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Audio Format Types
// ============================================================================

/// Source codecs the adapters understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MPEG-1 Audio Layer 3
    Mp3,
    /// Free Lossless Audio Codec
    Flac,
    /// Ogg Vorbis
    Vorbis,
    /// Opus in Ogg
    Opus,
    /// Waveform Audio File Format
    Wav,
}

/// Bit depth of every PCM byte this crate produces.
pub const OUTPUT_BITS_PER_SAMPLE: u16 = 16;

/// Bytes per output sample (one channel, one instant).
pub const OUTPUT_BYTES_PER_SAMPLE: usize = 2;

/// Format of the decoded PCM stream.
///
/// Fixed once decoding begins; never renegotiated mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Source codec (before decoding)
    pub codec: AudioCodec,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Always 16 after conversion
    pub bits_per_sample: u16,
}

impl AudioFormat {
    pub fn new(codec: AudioCodec, sample_rate: u32, channels: u16) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
            bits_per_sample: OUTPUT_BITS_PER_SAMPLE,
        }
    }

    /// Size of one interleaved frame in output bytes.
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * OUTPUT_BYTES_PER_SAMPLE
    }

    /// The `(sample_rate, channels, bits_per_sample)` triple.
    pub fn as_tuple(&self) -> (u32, u16, u16) {
        (self.sample_rate, self.channels, self.bits_per_sample)
    }
}

// ============================================================================
// Decoder Lifecycle
// ============================================================================

/// Lifecycle of a decoder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    /// Constructed, nothing open.
    #[default]
    Unopened,
    /// Inside `open`, consuming header packets.
    Sniffing,
    /// Pulling and decoding units on demand.
    Streaming,
    /// Source exhausted; the ring buffer may still hold residual bytes.
    Drained,
    /// Released by `close`.
    Closed,
}

// ============================================================================
// Core Trait
// ============================================================================

/// Uniform interface over every codec adapter.
///
/// ## Implementation Notes
///
/// - `open` acquires every handle it needs or none: on failure the decoder is
///   left `Unopened` and may be opened again.
/// - `decode_samples` writes `frames × channels × 2` bytes of s16le PCM into
///   `out` and returns the number of frames produced. `Ok(0)` means the
///   stream is over.
/// - `close` is idempotent and safe on an unopened or failed instance.
pub trait PcmDecoder {
    /// Open `path`, detect the stream and prepare the ring buffer.
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Output format; fails with `NoTrackLoaded` before `open`.
    fn format(&self) -> Result<AudioFormat>;

    /// Pull up to `frames` frames into `out`.
    fn decode_samples(&mut self, frames: usize, out: &mut [u8]) -> Result<usize>;

    /// Release the codec and file handles.
    fn close(&mut self) -> Result<()>;

    /// Current lifecycle state.
    fn state(&self) -> DecoderState;
}
