//! # Audio Decoder Module
//!
//! Codec adapters that turn a file into a pull stream of s16le PCM.
//!
//! ## Supported Formats
//!
//! | Format | Adapter | Backend | Feature Flag |
//! |--------|---------|---------|--------------|
//! | Ogg Vorbis | `VorbisDecoder` | `lewton` | `decoder-vorbis` |
//! | Ogg Opus (per packet) | `OpusStreamDecoder` | `opus` | `decoder-opus` |
//! | Ogg Opus (whole file) | `OpusFileDecoder` | `opus` + `ogg` | `decoder-opus` |
//! | WAV | `WavDecoder` | `symphonia` | `decoder-wav` |
//! | MP3 | `NativeDecoder` | `symphonia` | `decoder-mp3` |
//! | FLAC | `NativeDecoder` | `symphonia` | `decoder-flac` |
//!
//! ## Architecture
//!
//! Every adapter is a [`UnitSource`] (one decode unit at a time, already
//! converted to s16le) wrapped in a [`PcmStream`] that buffers units in a
//! [`RingBuffer`](crate::ring_buffer::RingBuffer) and serves exact frame
//! counts:
//!
//! ```text
//! file → container reader → codec → SampleConverter → RingBuffer → decode_samples()
//! ```
//!
//! [`open_decoder`] picks the adapter from the extension and, for Ogg, the
//! codec of the first packet.

mod dispatch;
#[cfg(feature = "decoder-opus")]
mod opus_file;
#[cfg(feature = "decoder-opus")]
mod opus_stream;
mod sample_converter;
mod stream;
mod symphonia;
#[cfg(feature = "decoder-vorbis")]
mod vorbis;

pub use dispatch::{
    open_decoder, select_decoder_kind, AnyDecoder, DecoderKind, FileFormat, FormatDetector,
};
#[cfg(feature = "decoder-opus")]
pub use opus_file::{OpusFile, OpusFileDecoder, OpusFileUnits};
#[cfg(feature = "decoder-opus")]
pub use opus_stream::{OpusStreamDecoder, OpusStreamUnits, OPUS_SAMPLE_RATE};
pub use sample_converter::{SampleConversion, SampleConverter};
pub use stream::{PcmStream, UnitSource};
pub use self::symphonia::{NativeDecoder, SymphoniaUnits, WavDecoder};
#[cfg(feature = "decoder-vorbis")]
pub use vorbis::{VorbisDecoder, VorbisUnits};
