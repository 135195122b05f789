//! # PCM Stream Normalization
//!
//! Opens Ogg Vorbis, Ogg Opus, WAV, MP3 and FLAC files and exposes each as
//! the same pull-based stream of interleaved signed 16-bit little-endian
//! samples.
//!
//! ## Overview
//!
//! This crate handles:
//! - Ogg demultiplexing and stream-type detection from the first packet
//! - Ring-buffered adaptation of codec output to fixed-size pulls
//! - Float and native-integer sample conversion to s16le
//! - Choosing the right adapter for a file

pub mod config;
pub mod decoder;
pub mod error;
pub mod ogg;
pub mod ring_buffer;
pub mod traits;

pub use config::DecoderConfig;
pub use decoder::{
    open_decoder, select_decoder_kind, AnyDecoder, DecoderKind, FileFormat, NativeDecoder,
    PcmStream, SampleConversion, UnitSource, WavDecoder,
};
#[cfg(feature = "decoder-opus")]
pub use decoder::{OpusFile, OpusFileDecoder, OpusStreamDecoder};
#[cfg(feature = "decoder-vorbis")]
pub use decoder::VorbisDecoder;
pub use error::{PlaybackError, Result};
pub use crate::ogg::{
    ogg_file_stream_type, OggPacketSource, PacketSource, StreamType, StreamTypeSniffer,
};
pub use ring_buffer::RingBuffer;
pub use traits::{AudioCodec, AudioFormat, DecoderState, PcmDecoder};
