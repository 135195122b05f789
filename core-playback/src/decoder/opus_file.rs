//! # Whole-File Ogg Opus Adapter
//!
//! [`OpusFile`] owns its container parsing end to end: it reads pages with
//! its own `ogg::PacketReader`, validates `OpusHead` and `OpusTags`, and
//! presents the decoded audio as one continuous sample stream with pre-skip
//! removed, the tail trimmed to the final granule position and the header's
//! output gain applied. The adapter then pulls it in fixed-size reads.

use super::opus_stream::{opus_channels, OPUS_SAMPLE_RATE};
use super::sample_converter::SampleConverter;
use super::stream::{StreamSlot, UnitSource};
use crate::config::DecoderConfig;
use crate::error::{PlaybackError, Result};
use crate::ogg::{OpusHead, OPUS_TAGS_PATTERN};
use crate::traits::{AudioCodec, AudioFormat, DecoderState, PcmDecoder};
use ogg::{Packet, PacketReader};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, instrument, trace};

/// Longest Opus packet: 120 ms at 48 kHz.
const MAX_PACKET_FRAMES: usize = 5760;

/// Whole-file Opus reader.
pub struct OpusFile<R: Read + Seek> {
    reader: PacketReader<R>,
    serial: u32,
    decoder: opus::Decoder,
    head: OpusHead,
    /// Linear factor derived from the Q7.8 dB output gain; `None` for 0 dB.
    gain: Option<f32>,
    /// Decoded samples not yet handed out, interleaved.
    pending: Vec<i16>,
    pending_pos: usize,
    /// Frames still to discard from the start of the stream.
    skip_frames: usize,
    /// Frames decoded so far, pre-skip included (granule position units).
    decoded_frames: u64,
    eof: bool,
}

impl OpusFile<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> OpusFile<R> {
    /// Read and validate both header packets from `reader`.
    pub fn new(reader: R) -> Result<Self> {
        let mut reader = PacketReader::new(reader);

        let first = reader
            .read_packet()
            .map_err(|e| PlaybackError::ContainerError(e.to_string()))?
            .ok_or(PlaybackError::UnexpectedEndOfStream)?;
        let serial = first.stream_serial();
        let head = OpusHead::parse(&first.data)
            .ok_or_else(|| PlaybackError::InvalidFormat("missing OpusHead packet".to_string()))?;
        let channels = opus_channels(&head)?;

        let mut file = Self {
            reader,
            serial,
            decoder: opus::Decoder::new(OPUS_SAMPLE_RATE, channels)
                .map_err(|e| PlaybackError::DecoderError(e.to_string()))?,
            head,
            gain: gain_factor(head.output_gain),
            pending: Vec::with_capacity(MAX_PACKET_FRAMES * usize::from(head.channels)),
            pending_pos: 0,
            skip_frames: usize::from(head.pre_skip),
            decoded_frames: 0,
            eof: false,
        };

        let tags = file
            .next_stream_packet()?
            .ok_or(PlaybackError::UnexpectedEndOfStream)?;
        if tags.data.len() < OPUS_TAGS_PATTERN.len() || tags.data[..8] != OPUS_TAGS_PATTERN {
            return Err(PlaybackError::InvalidFormat(
                "OpusHead is not followed by OpusTags".to_string(),
            ));
        }

        debug!(
            channels = head.channels,
            pre_skip = head.pre_skip,
            output_gain = head.output_gain,
            "opus file opened"
        );
        Ok(file)
    }

    pub fn head(&self) -> &OpusHead {
        &self.head
    }

    pub fn channels(&self) -> usize {
        usize::from(self.head.channels)
    }

    /// Fill `out` with interleaved samples; returns frames written, `0` at
    /// the end of the file.
    pub fn read(&mut self, out: &mut [i16]) -> Result<usize> {
        let channels = self.channels();
        let wanted = out.len() / channels * channels;
        let mut written = 0;

        while written < wanted {
            if self.pending_pos == self.pending.len() && !self.refill()? {
                break;
            }
            let available = &self.pending[self.pending_pos..];
            let n = available.len().min(wanted - written);
            out[written..written + n].copy_from_slice(&available[..n]);
            self.pending_pos += n;
            written += n;
        }

        Ok(written / channels)
    }

    /// Decode the next audio packet into `pending`. `false` at end of file.
    fn refill(&mut self) -> Result<bool> {
        let channels = self.channels();
        loop {
            if self.eof {
                return Ok(false);
            }
            let Some(packet) = self.next_stream_packet()? else {
                self.eof = true;
                return Ok(false);
            };

            self.pending.resize(MAX_PACKET_FRAMES * channels, 0);
            let decoded = self
                .decoder
                .decode(&packet.data, &mut self.pending, false)
                .map_err(|e| PlaybackError::DecodingError(e.to_string()))?;
            let frames = self.end_trimmed(&packet, decoded);
            self.decoded_frames += frames as u64;
            self.pending.truncate(frames * channels);

            let skipped = self.skip_frames.min(frames);
            self.skip_frames -= skipped;
            self.pending_pos = skipped * channels;
            trace!(frames, skipped, "opus file packet decoded");

            if let Some(gain) = self.gain {
                for sample in &mut self.pending[self.pending_pos..] {
                    *sample = (f32::from(*sample) * gain)
                        .round()
                        .clamp(f32::from(i16::MIN), f32::from(i16::MAX))
                        as i16;
                }
            }

            if self.pending_pos < self.pending.len() {
                return Ok(true);
            }
        }
    }

    /// Frames of the final packet that fall before the end granule. The
    /// last page's granule position counts pre-skip plus every playable
    /// frame; anything decoded past it is encoder padding.
    fn end_trimmed(&self, packet: &Packet, decoded: usize) -> usize {
        if !packet.last_in_stream() {
            return decoded;
        }
        let end = packet.absgp_page();
        let kept = end.saturating_sub(self.decoded_frames).min(decoded as u64) as usize;
        if kept < decoded {
            debug!(end_granule = end, trimmed = decoded - kept, "opus end trimming");
        }
        kept
    }

    fn next_stream_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            let packet = self
                .reader
                .read_packet()
                .map_err(|e| PlaybackError::ContainerError(e.to_string()))?;
            match packet {
                None => return Ok(None),
                Some(p) if p.stream_serial() == self.serial => return Ok(Some(p)),
                Some(_) => continue,
            }
        }
    }
}

/// Convert a Q7.8 dB gain to a linear factor.
fn gain_factor(q78_db: i16) -> Option<f32> {
    if q78_db == 0 {
        return None;
    }
    let db = f32::from(q78_db) / 256.0;
    Some(10f32.powf(db / 20.0))
}

/// Fixed-size reads from an [`OpusFile`].
pub struct OpusFileUnits<R: Read + Seek> {
    file: OpusFile<R>,
    pcm: Vec<i16>,
    read_frames: usize,
}

impl<R: Read + Seek> OpusFileUnits<R> {
    pub fn new(file: OpusFile<R>, read_frames: usize) -> Self {
        let pcm = vec![0; read_frames * file.channels()];
        Self {
            file,
            pcm,
            read_frames,
        }
    }
}

impl<R: Read + Seek> UnitSource for OpusFileUnits<R> {
    fn channels(&self) -> usize {
        self.file.channels()
    }

    fn sample_rate(&self) -> u32 {
        OPUS_SAMPLE_RATE
    }

    fn max_unit_frames(&self) -> usize {
        self.read_frames
    }

    fn next_unit(&mut self, out: &mut Vec<u8>) -> Result<bool> {
        let frames = self.file.read(&mut self.pcm)?;
        if frames == 0 {
            return Ok(false);
        }
        SampleConverter::push_i16(&self.pcm[..frames * self.file.channels()], out);
        Ok(true)
    }
}

type FileUnits = OpusFileUnits<BufReader<File>>;

/// [`PcmDecoder`] over a whole Ogg Opus file, pre-skip and gain applied.
#[derive(Default)]
pub struct OpusFileDecoder {
    config: DecoderConfig,
    slot: StreamSlot<FileUnits>,
}

impl OpusFileDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            slot: StreamSlot::default(),
        }
    }
}

impl PcmDecoder for OpusFileDecoder {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn open(&mut self, path: &Path) -> Result<()> {
        self.slot.begin_open();
        let read_frames = self.config.opus_decode_frames;
        let opened = OpusFile::open(path).map(|file| OpusFileUnits::new(file, read_frames));
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
