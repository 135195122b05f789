//! # Symphonia-Backed Adapters
//!
//! WAV, MP3 and FLAC are demuxed and decoded by Symphonia. Decoded buffers
//! are converted to s16le as they come out: native 16-bit buffers are copied
//! through, everything else goes through the float path.

use crate::config::DecoderConfig;
use crate::decoder::dispatch::FormatDetector;
use crate::decoder::sample_converter::{SampleConversion, SampleConverter};
use crate::decoder::stream::{StreamSlot, UnitSource};
use crate::error::{PlaybackError, Result};
use crate::traits::{AudioCodec, AudioFormat, DecoderState, PcmDecoder};
use std::fs::File;
use std::path::Path;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use tracing::{debug, instrument, trace};

/// Frame bound used when the container does not declare one (largest FLAC
/// block).
const FALLBACK_MAX_FRAMES: usize = 65_535;

/// Decoded units from a Symphonia format reader and codec.
pub struct SymphoniaUnits {
    /// Format reader (demuxer), owns the media source stream
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    codec: AudioCodec,
    sample_rate: u32,
    channels: usize,
    max_frames: usize,
    conversion: SampleConversion,
}

impl SymphoniaUnits {
    /// Probe `path` and prepare the decoder for its first audio track.
    pub fn open(path: &Path, conversion: SampleConversion) -> Result<Self> {
        let file = File::open(path)?;
        let hint = FormatDetector::hint_from_path(path);
        let media_source = Box::new(file) as Box<dyn MediaSource>;
        let mss = MediaSourceStream::new(media_source, Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| PlaybackError::InvalidFormat(format!("Failed to probe format: {}", e)))?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PlaybackError::InvalidFormat("No audio track".to_string()))?;
        let track_id = track.id;

        let codec = FormatDetector::detect_codec(track.codec_params.codec).ok_or_else(|| {
            PlaybackError::UnsupportedCodec(format!("{:?}", track.codec_params.codec))
        })?;
        FormatDetector::validate_codec_support(&codec)?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| PlaybackError::InvalidFormat("Missing sample rate".to_string()))?;
        let channels = track
            .codec_params
            .channels
            .map(|ch| ch.count())
            .ok_or_else(|| PlaybackError::InvalidFormat("Missing channel layout".to_string()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                PlaybackError::DecoderError(format!("Failed to create codec decoder: {}", e))
            })?;

        // Demuxers may leave the bound to the codec (FLAC reads it from
        // STREAMINFO when the decoder is built).
        let max_frames = decoder
            .codec_params()
            .max_frames_per_packet
            .or(track.codec_params.max_frames_per_packet)
            .map(|n| n as usize)
            .unwrap_or(FALLBACK_MAX_FRAMES);

        debug!(
            ?codec,
            sample_rate,
            channels,
            bits = ?track.codec_params.bits_per_sample,
            max_frames,
            "symphonia track selected"
        );

        Ok(Self {
            track_id,
            format_reader,
            decoder,
            codec,
            sample_rate,
            channels,
            max_frames,
            conversion,
        })
    }

    pub fn codec(&self) -> AudioCodec {
        self.codec
    }
}

impl UnitSource for SymphoniaUnits {
    fn channels(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn max_unit_frames(&self) -> usize {
        self.max_frames
    }

    fn next_unit(&mut self, out: &mut Vec<u8>) -> Result<bool> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => {
                    return Err(PlaybackError::DecodingError(
                        "Track list changed, reset required".to_string(),
                    ));
                }
                Err(e) => {
                    return Err(PlaybackError::DecodingError(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
            };

            // Skip packets not belonging to our selected track
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = self.decoder.decode(&packet).map_err(|e| {
                PlaybackError::DecodingError(format!("Failed to decode packet: {}", e))
            })?;

            let decoded_channels = decoded.spec().channels.count();
            if decoded_channels != self.channels {
                return Err(PlaybackError::DecodingError(format!(
                    "channel count changed from {} to {}",
                    self.channels, decoded_channels
                )));
            }

            trace!(frames = decoded.frames(), "symphonia packet decoded");
            SampleConverter::push_audio_buffer(&decoded, self.conversion, out);
            return Ok(true);
        }
    }
}

fn symphonia_format(units: &SymphoniaUnits) -> AudioFormat {
    AudioFormat::new(units.codec, units.sample_rate, units.channels as u16)
}

/// [`PcmDecoder`] for RIFF WAVE files.
///
/// 16-bit PCM is copied through unchanged; other sample formats are
/// normalized through the float path.
#[derive(Default)]
pub struct WavDecoder {
    config: DecoderConfig,
    slot: StreamSlot<SymphoniaUnits>,
}

impl WavDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            slot: StreamSlot::default(),
        }
    }
}

impl PcmDecoder for WavDecoder {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn open(&mut self, path: &Path) -> Result<()> {
        self.slot.begin_open();
        let opened = SymphoniaUnits::open(path, self.config.conversion).and_then(|units| {
            if units.codec() == AudioCodec::Wav {
                Ok(units)
            } else {
                Err(PlaybackError::UnsupportedCodec(format!(
                    "expected PCM audio, found {:?}",
                    units.codec()
                )))
            }
        });
        self.slot.finish_open(opened, symphonia_format, &self.config)
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

/// [`PcmDecoder`] for the compressed formats Symphonia handles natively
/// (MP3, FLAC).
pub struct NativeDecoder {
    codec: AudioCodec,
    config: DecoderConfig,
    slot: StreamSlot<SymphoniaUnits>,
}

impl NativeDecoder {
    /// Decoder that accepts only `codec` streams.
    pub fn new(codec: AudioCodec, config: DecoderConfig) -> Self {
        Self {
            codec,
            config,
            slot: StreamSlot::default(),
        }
    }

    pub fn codec(&self) -> AudioCodec {
        self.codec
    }
}

impl PcmDecoder for NativeDecoder {
    #[instrument(skip(self), fields(path = %path.display(), codec = ?self.codec))]
    fn open(&mut self, path: &Path) -> Result<()> {
        self.slot.begin_open();
        let expected = self.codec;
        let opened = SymphoniaUnits::open(path, self.config.conversion).and_then(|units| {
            if units.codec() == expected {
                Ok(units)
            } else {
                Err(PlaybackError::UnsupportedCodec(format!(
                    "expected {:?}, found {:?}",
                    expected,
                    units.codec()
                )))
            }
        });
        self.slot.finish_open(opened, symphonia_format, &self.config)
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
