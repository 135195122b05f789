//! # Ogg Vorbis Adapter
//!
//! Ogg packets are pulled through [`OggPacketSource`], classified by the
//! sniffer and handed to `lewton` one audio packet at a time.

use super::sample_converter::{SampleConversion, SampleConverter};
use super::stream::{StreamSlot, UnitSource};
use crate::config::DecoderConfig;
use crate::error::{PlaybackError, Result};
use crate::ogg::{OggPacketSource, PacketSource, StreamType, StreamTypeSniffer, VorbisIdent};
use crate::traits::{AudioCodec, AudioFormat, DecoderState, PcmDecoder};
use lewton::audio::{read_audio_packet_generic, PreviousWindowRight};
use lewton::header::{
    read_header_comment, read_header_ident, read_header_setup, IdentHeader, SetupHeader,
};
use lewton::samples::InterleavedSamples;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, instrument, trace};

/// Decoded Vorbis units over any packet source.
pub struct VorbisUnits<P: PacketSource> {
    packets: P,
    ident: IdentHeader,
    setup: SetupHeader,
    previous_window: PreviousWindowRight,
    conversion: SampleConversion,
    max_frames: usize,
}

impl<P: PacketSource> VorbisUnits<P> {
    /// Sniff `packets` and initialize the codec from its three header packets.
    pub fn from_source(mut packets: P, conversion: SampleConversion) -> Result<Self> {
        let sniffed = StreamTypeSniffer::sniff(&mut packets)?;
        if sniffed.stream_type != StreamType::Vorbis {
            return Err(PlaybackError::UnsupportedCodec(format!(
                "expected a vorbis stream, found {}",
                sniffed.stream_type
            )));
        }

        let parsed = VorbisIdent::parse(&sniffed.headers[0]).ok_or_else(|| {
            PlaybackError::InvalidFormat("truncated vorbis identification header".to_string())
        })?;
        if parsed.channels == 0 || parsed.sample_rate == 0 {
            return Err(PlaybackError::InvalidFormat(format!(
                "vorbis header declares {} channels at {} Hz",
                parsed.channels, parsed.sample_rate
            )));
        }

        let ident = read_header_ident(&sniffed.headers[0])
            .map_err(|e| PlaybackError::DecoderError(format!("identification header: {e:?}")))?;
        read_header_comment(&sniffed.headers[1])
            .map_err(|e| PlaybackError::DecoderError(format!("comment header: {e:?}")))?;
        let setup = read_header_setup(
            &sniffed.headers[2],
            ident.audio_channels,
            (ident.blocksize_0, ident.blocksize_1),
        )
        .map_err(|e| PlaybackError::DecoderError(format!("setup header: {e:?}")))?;

        debug!(
            channels = parsed.channels,
            sample_rate = parsed.sample_rate,
            nominal_bitrate = parsed.bitrate_nominal,
            "vorbis headers consumed"
        );

        Ok(Self {
            packets,
            ident,
            setup,
            previous_window: PreviousWindowRight::new(),
            conversion,
            max_frames: parsed.max_packet_frames(),
        })
    }
}

impl<P: PacketSource> UnitSource for VorbisUnits<P> {
    fn channels(&self) -> usize {
        usize::from(self.ident.audio_channels)
    }

    fn sample_rate(&self) -> u32 {
        self.ident.audio_sample_rate
    }

    fn max_unit_frames(&self) -> usize {
        self.max_frames
    }

    fn next_unit(&mut self, out: &mut Vec<u8>) -> Result<bool> {
        let Some(packet) = self.packets.next_packet()? else {
            return Ok(false);
        };
        if packet.is_empty() {
            return Ok(true);
        }

        let decoded: InterleavedSamples<f32> = read_audio_packet_generic(
            &self.ident,
            &self.setup,
            &packet,
            &mut self.previous_window,
        )
        .map_err(|e| PlaybackError::DecodingError(format!("vorbis packet: {e:?}")))?;

        trace!(samples = decoded.samples.len(), "vorbis packet decoded");
        SampleConverter::push_f32(&decoded.samples, self.conversion, out);
        Ok(true)
    }

    fn close(&mut self) {
        self.packets.close();
    }
}

type FileUnits = VorbisUnits<OggPacketSource<BufReader<File>>>;

/// [`PcmDecoder`] for Ogg Vorbis files.
#[derive(Default)]
pub struct VorbisDecoder {
    config: DecoderConfig,
    slot: StreamSlot<FileUnits>,
}

impl VorbisDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            slot: StreamSlot::default(),
        }
    }
}

impl PcmDecoder for VorbisDecoder {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn open(&mut self, path: &Path) -> Result<()> {
        self.slot.begin_open();
        let conversion = self.config.conversion;
        let opened = OggPacketSource::open(path)
            .and_then(|packets| VorbisUnits::from_source(packets, conversion));
        self.slot.finish_open(
            opened,
            |units| {
                AudioFormat::new(
                    AudioCodec::Vorbis,
                    units.sample_rate(),
                    units.channels() as u16,
                )
            },
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
