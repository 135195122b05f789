//! # Ogg Opus Packet-Streaming Adapter
//!
//! Shares the container path with the Vorbis adapter: packets come from
//! [`OggPacketSource`], the sniffer consumes `OpusHead` and `OpusTags`, and each
//! audio packet is decoded by libopus straight into 16-bit samples at 48 kHz.
//!
//! Pre-skip and output gain are not applied here; [`super::OpusFileDecoder`]
//! does that.

use super::sample_converter::SampleConverter;
use super::stream::{StreamSlot, UnitSource};
use crate::config::DecoderConfig;
use crate::error::{PlaybackError, Result};
use crate::ogg::{OggPacketSource, OpusHead, PacketSource, StreamType, StreamTypeSniffer};
use crate::traits::{AudioCodec, AudioFormat, DecoderState, PcmDecoder};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, instrument, trace};

/// Opus always decodes at 48 kHz.
pub const OPUS_SAMPLE_RATE: u32 = 48_000;

/// Map an identification header channel count to a libopus layout.
pub(crate) fn opus_channels(head: &OpusHead) -> Result<opus::Channels> {
    match head.channels {
        1 => Ok(opus::Channels::Mono),
        2 => Ok(opus::Channels::Stereo),
        n => Err(PlaybackError::UnsupportedCodec(format!(
            "opus stream with {n} channels"
        ))),
    }
}

/// Decoded Opus units over any packet source.
pub struct OpusStreamUnits<P: PacketSource> {
    packets: P,
    decoder: opus::Decoder,
    head: OpusHead,
    pcm: Vec<i16>,
    decode_frames: usize,
}

impl<P: PacketSource> OpusStreamUnits<P> {
    /// Sniff `packets`, parse `OpusHead` and create the libopus decoder.
    ///
    /// `decode_frames` is the per-packet decode budget in frames.
    pub fn from_source(mut packets: P, decode_frames: usize) -> Result<Self> {
        let sniffed = StreamTypeSniffer::sniff(&mut packets)?;
        if sniffed.stream_type != StreamType::Opus {
            return Err(PlaybackError::UnsupportedCodec(format!(
                "expected an opus stream, found {}",
                sniffed.stream_type
            )));
        }

        let head = OpusHead::parse(&sniffed.headers[0]).ok_or_else(|| {
            PlaybackError::InvalidFormat("truncated OpusHead packet".to_string())
        })?;
        let channels = opus_channels(&head)?;
        let decoder = opus::Decoder::new(OPUS_SAMPLE_RATE, channels)
            .map_err(|e| PlaybackError::DecoderError(e.to_string()))?;

        debug!(
            channels = head.channels,
            input_sample_rate = head.input_sample_rate,
            pre_skip = head.pre_skip,
            "opus headers consumed"
        );

        Ok(Self {
            packets,
            decoder,
            head,
            pcm: vec![0; decode_frames * usize::from(head.channels)],
            decode_frames,
        })
    }

    pub fn head(&self) -> &OpusHead {
        &self.head
    }
}

impl<P: PacketSource> UnitSource for OpusStreamUnits<P> {
    fn channels(&self) -> usize {
        usize::from(self.head.channels)
    }

    fn sample_rate(&self) -> u32 {
        OPUS_SAMPLE_RATE
    }

    fn max_unit_frames(&self) -> usize {
        self.decode_frames
    }

    fn next_unit(&mut self, out: &mut Vec<u8>) -> Result<bool> {
        let Some(packet) = self.packets.next_packet()? else {
            return Ok(false);
        };

        let frames = self
            .decoder
            .decode(&packet, &mut self.pcm, false)
            .map_err(|e| PlaybackError::DecodingError(e.to_string()))?;

        // A zero-length result is just an empty unit, not the end
        trace!(frames, "opus packet decoded");
        SampleConverter::push_i16(&self.pcm[..frames * self.channels()], out);
        Ok(true)
    }

    fn close(&mut self) {
        self.packets.close();
    }
}

type FileUnits = OpusStreamUnits<OggPacketSource<BufReader<File>>>;

/// [`PcmDecoder`] decoding Ogg Opus packet by packet.
#[derive(Default)]
pub struct OpusStreamDecoder {
    config: DecoderConfig,
    slot: StreamSlot<FileUnits>,
}

impl OpusStreamDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            slot: StreamSlot::default(),
        }
    }
}

impl PcmDecoder for OpusStreamDecoder {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn open(&mut self, path: &Path) -> Result<()> {
        self.slot.begin_open();
        let decode_frames = self.config.opus_decode_frames;
        let opened = OggPacketSource::open(path)
            .and_then(|packets| OpusStreamUnits::from_source(packets, decode_frames));
        self.slot.finish_open(
            opened,
            |units| AudioFormat::new(AudioCodec::Opus, OPUS_SAMPLE_RATE, units.channels() as u16),
            &self.config,
        )
    }

    fn format(&self) -> Result<AudioFormat> {
        self.slot.format()
    }

    fn decode_samples(&mut self, frames: usize, out: &mut [u8]) -> Result<usize> {
        self.slot.decode_samples(frames, out)
    }

    fn close(&mut self) -> Result<()> {
        self.slot.close();
        Ok(())
    }

    fn state(&self) -> DecoderState {
        self.slot.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ogg::fixtures::{opus_head, vorbis_ident};
    use crate::ogg::MockPacketSource;
    use bytes::Bytes;
    use mockall::Sequence;

    fn scripted(packets: Vec<Vec<u8>>) -> MockPacketSource {
        let mut source = MockPacketSource::new();
        let mut seq = Sequence::new();
        for packet in packets {
            source
                .expect_next_packet()
                .times(1)
                .in_sequence(&mut seq)
                .return_once(move || Ok(Some(Bytes::from(packet))));
        }
        source
            .expect_next_packet()
            .returning(|| Ok(None));
        source.expect_close().returning(|| ());
        source
    }

    fn encoded_silence(channels: opus::Channels, frames: usize) -> Vec<u8> {
        let mut encoder =
            opus::Encoder::new(OPUS_SAMPLE_RATE, channels, opus::Application::Audio).unwrap();
        let count = match channels {
            opus::Channels::Mono => 1,
            opus::Channels::Stereo => 2,
        };
        let pcm = vec![0i16; frames * count];
        let mut packet = vec![0u8; 4000];
        let len = encoder.encode(&pcm, &mut packet).unwrap();
        packet.truncate(len);
        packet
    }

    #[test]
    fn test_decodes_each_packet_as_a_unit() {
        let source = scripted(vec![
            opus_head(2, 312, 0),
            b"OpusTags\x00\x00\x00\x00\x00\x00\x00\x00".to_vec(),
            encoded_silence(opus::Channels::Stereo, 960),
            encoded_silence(opus::Channels::Stereo, 960),
        ]);
        let mut units = OpusStreamUnits::from_source(source, 2048).unwrap();
        assert_eq!(units.channels(), 2);
        assert_eq!(units.sample_rate(), 48_000);
        assert_eq!(units.head().pre_skip, 312);

        let mut out = Vec::new();
        assert!(units.next_unit(&mut out).unwrap());
        assert_eq!(out.len(), 960 * 2 * 2);
        assert!(units.next_unit(&mut out).unwrap());
        assert_eq!(out.len(), 2 * 960 * 2 * 2);
        assert!(!units.next_unit(&mut out).unwrap());
        units.close();
    }

    #[test]
    fn test_rejects_multichannel_streams() {
        let source = scripted(vec![opus_head(6, 0, 0), b"OpusTags".to_vec()]);
        let err = OpusStreamUnits::from_source(source, 2048).err().unwrap();
        assert!(matches!(err, PlaybackError::UnsupportedCodec(_)));
    }

    #[test]
    fn test_rejects_vorbis_stream() {
        let source = scripted(vec![
            vorbis_ident(1, 8000),
            b"\x03vorbis".to_vec(),
            b"\x05vorbis".to_vec(),
        ]);
        let err = OpusStreamUnits::from_source(source, 2048).err().unwrap();
        assert!(matches!(err, PlaybackError::UnsupportedCodec(_)));
    }

    #[test]
    fn test_packet_longer_than_budget_is_a_decoding_error() {
        let source = scripted(vec![
            opus_head(1, 0, 0),
            b"OpusTags".to_vec(),
            // 20 ms CELT frame, larger than the 64 frame budget
            vec![0xfc; 3],
        ]);
        let mut units = OpusStreamUnits::from_source(source, 64).unwrap();
        let mut out = Vec::new();
        let err = units.next_unit(&mut out).unwrap_err();
        assert!(matches!(err, PlaybackError::DecodingError(_)));
    }
}
