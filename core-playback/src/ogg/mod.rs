//! # Ogg Container Support
//!
//! Presents an Ogg file as a flat pull sequence of packets for its first
//! logical bitstream, and classifies that bitstream from its first packet.
//!
//! ```text
//! File → BufReader → ogg::PacketReader → OggPacketSource → StreamTypeSniffer
//!                                                        ↘ audio packets (on demand)
//! ```
//!
//! Identification headers are parsed with explicit little-endian offsets.

mod packet_source;
mod sniffer;

pub use packet_source::{OggPacketSource, PacketSource};
pub use sniffer::{ogg_file_stream_type, SniffResult, StreamTypeSniffer};

#[cfg(test)]
pub(crate) use packet_source::MockPacketSource;

use serde::{Deserialize, Serialize};

/// Bytes 1..7 of a Vorbis header packet.
pub const VORBIS_PATTERN: [u8; 6] = *b"vorbis";
/// First 8 bytes of an Opus identification header.
pub const OPUS_HEAD_PATTERN: [u8; 8] = *b"OpusHead";
/// First 8 bytes of an Opus comment header.
pub const OPUS_TAGS_PATTERN: [u8; 8] = *b"OpusTags";

/// Codec carried by an Ogg logical bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StreamType {
    #[default]
    Unknown,
    Vorbis,
    Opus,
}

impl StreamType {
    /// Header packets (including the identification packet) that precede
    /// audio data: identification, comments, setup for Vorbis; head and tags
    /// for Opus.
    pub fn header_budget(&self) -> usize {
        match self {
            StreamType::Unknown => 0,
            StreamType::Vorbis => 3,
            StreamType::Opus => 2,
        }
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StreamType::Unknown => "unknown",
            StreamType::Vorbis => "vorbis",
            StreamType::Opus => "opus",
        };
        f.write_str(name)
    }
}

/// Classify a packet by its leading magic bytes.
///
/// Vorbis: packet type byte `1` followed by `"vorbis"`. Opus: `"OpusHead"`.
/// Packets too short for either shape are `Unknown`.
pub fn sniff_packet(packet: &[u8]) -> StreamType {
    if packet.len() >= 7 && packet[0] == 1 && packet[1..7] == VORBIS_PATTERN {
        return StreamType::Vorbis;
    }
    if packet.len() >= 8 && packet[..8] == OPUS_HEAD_PATTERN {
        return StreamType::Opus;
    }
    StreamType::Unknown
}

/// Opus identification header (RFC 7845 §5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHead {
    pub version: u8,
    pub channels: u8,
    /// Samples at 48 kHz to discard from the decoder output.
    pub pre_skip: u16,
    /// Informational only; output is always 48 kHz.
    pub input_sample_rate: u32,
    /// Q7.8 dB gain to apply to the decoded output.
    pub output_gain: i16,
    pub mapping_family: u8,
}

impl OpusHead {
    pub const MIN_LEN: usize = 19;

    pub fn parse(packet: &[u8]) -> Option<Self> {
        if packet.len() < Self::MIN_LEN || packet[..8] != OPUS_HEAD_PATTERN {
            return None;
        }
        Some(Self {
            version: packet[8],
            channels: packet[9],
            pre_skip: u16::from_le_bytes([packet[10], packet[11]]),
            input_sample_rate: u32::from_le_bytes([
                packet[12], packet[13], packet[14], packet[15],
            ]),
            output_gain: i16::from_le_bytes([packet[16], packet[17]]),
            mapping_family: packet[18],
        })
    }
}

/// Vorbis identification header (Vorbis I §4.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VorbisIdent {
    pub version: u32,
    pub channels: u8,
    pub sample_rate: u32,
    pub bitrate_max: i32,
    pub bitrate_nominal: i32,
    pub bitrate_min: i32,
    /// log2 of the short block size.
    pub blocksize_0: u8,
    /// log2 of the long block size.
    pub blocksize_1: u8,
    pub framing: bool,
}

impl VorbisIdent {
    pub const LEN: usize = 30;

    pub fn parse(packet: &[u8]) -> Option<Self> {
        if packet.len() < Self::LEN || sniff_packet(packet) != StreamType::Vorbis {
            return None;
        }
        let le_u32 = |at: usize| {
            u32::from_le_bytes([packet[at], packet[at + 1], packet[at + 2], packet[at + 3]])
        };
        Some(Self {
            version: le_u32(7),
            channels: packet[11],
            sample_rate: le_u32(12),
            bitrate_max: le_u32(16) as i32,
            bitrate_nominal: le_u32(20) as i32,
            bitrate_min: le_u32(24) as i32,
            blocksize_0: packet[28] & 0x0f,
            blocksize_1: packet[28] >> 4,
            framing: packet[29] & 0x01 == 1,
        })
    }

    /// Most frames a single audio packet can produce.
    pub fn max_packet_frames(&self) -> usize {
        (1usize << self.blocksize_1) / 2
    }
}
