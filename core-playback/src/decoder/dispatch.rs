//! # Decoder Dispatch
//!
//! Picks the adapter for a file from its extension and, for Ogg files, from
//! the codec carried by the first packet.

use super::symphonia::{NativeDecoder, WavDecoder};
#[cfg(feature = "decoder-opus")]
use super::{OpusFileDecoder, OpusStreamDecoder};
#[cfg(feature = "decoder-vorbis")]
use super::VorbisDecoder;
use crate::config::DecoderConfig;
use crate::error::{PlaybackError, Result};
use crate::ogg::{ogg_file_stream_type, StreamType};
use crate::traits::{AudioCodec, AudioFormat, DecoderState, PcmDecoder};
use std::path::Path;
use symphonia::core::codecs::CodecType;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

/// Container family, judged by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Mp3,
    Ogg,
    Flac,
    Wav,
}

impl FileFormat {
    /// Map a file extension (case-insensitive, without the dot).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "mp3" => Some(FileFormat::Mp3),
            "ogg" | "oga" | "opus" => Some(FileFormat::Ogg),
            "flac" => Some(FileFormat::Flac),
            "wav" => Some(FileFormat::Wav),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Concrete adapter to construct for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    Vorbis,
    OpusStream,
    OpusFile,
    Wav,
    Mp3,
    Flac,
}

impl DecoderKind {
    pub fn codec(&self) -> AudioCodec {
        match self {
            DecoderKind::Vorbis => AudioCodec::Vorbis,
            DecoderKind::OpusStream | DecoderKind::OpusFile => AudioCodec::Opus,
            DecoderKind::Wav => AudioCodec::Wav,
            DecoderKind::Mp3 => AudioCodec::Mp3,
            DecoderKind::Flac => AudioCodec::Flac,
        }
    }
}

/// Symphonia probe hints and codec feature checks.
pub struct FormatDetector;

impl FormatDetector {
    /// Create a probe hint from the file extension, if any.
    pub fn hint_from_path(path: &Path) -> Hint {
        let mut hint = Hint::new();

        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            debug!("Setting probe hint extension: {}", extension);
            hint.with_extension(extension);
        }

        hint
    }

    /// Map a Symphonia codec to the codecs its adapters serve.
    pub fn detect_codec(codec_type: CodecType) -> Option<AudioCodec> {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_MP3 {
            Some(AudioCodec::Mp3)
        } else if codec_type == CODEC_TYPE_FLAC {
            Some(AudioCodec::Flac)
        } else if [
            CODEC_TYPE_PCM_U8,
            CODEC_TYPE_PCM_S8,
            CODEC_TYPE_PCM_S16LE,
            CODEC_TYPE_PCM_S24LE,
            CODEC_TYPE_PCM_S32LE,
            CODEC_TYPE_PCM_F32LE,
            CODEC_TYPE_PCM_F64LE,
            CODEC_TYPE_PCM_ALAW,
            CODEC_TYPE_PCM_MULAW,
        ]
        .contains(&codec_type)
        {
            Some(AudioCodec::Wav)
        } else {
            None
        }
    }

    /// Check that the adapter for `codec` was compiled in.
    pub fn validate_codec_support(codec: &AudioCodec) -> Result<()> {
        let (enabled, feature) = match codec {
            AudioCodec::Mp3 => (cfg!(feature = "decoder-mp3"), "decoder-mp3"),
            AudioCodec::Flac => (cfg!(feature = "decoder-flac"), "decoder-flac"),
            AudioCodec::Vorbis => (cfg!(feature = "decoder-vorbis"), "decoder-vorbis"),
            AudioCodec::Opus => (cfg!(feature = "decoder-opus"), "decoder-opus"),
            AudioCodec::Wav => (cfg!(feature = "decoder-wav"), "decoder-wav"),
        };

        if enabled {
            Ok(())
        } else {
            Err(PlaybackError::UnsupportedCodec(format!(
                "{:?} decoder not enabled. Enable '{}' feature",
                codec, feature
            )))
        }
    }
}

/// Choose the adapter for `path`.
///
/// Ogg files are probed by their first packet; `prefer_opus_file` selects the
/// whole-file Opus reader over the packet-streaming one. Ogg streams of an
/// unrecognized codec are `UnsupportedCodec`.
pub fn select_decoder_kind(path: &Path, prefer_opus_file: bool) -> Result<DecoderKind> {
    let format = FileFormat::from_path(path).ok_or_else(|| {
        PlaybackError::UnsupportedCodec(format!("unrecognized file extension: {}", path.display()))
    })?;

    let kind = match format {
        FileFormat::Mp3 => DecoderKind::Mp3,
        FileFormat::Flac => DecoderKind::Flac,
        FileFormat::Wav => DecoderKind::Wav,
        FileFormat::Ogg => match ogg_file_stream_type(path)? {
            StreamType::Vorbis => DecoderKind::Vorbis,
            StreamType::Opus if prefer_opus_file => DecoderKind::OpusFile,
            StreamType::Opus => DecoderKind::OpusStream,
            StreamType::Unknown => {
                return Err(PlaybackError::UnsupportedCodec(
                    "ogg stream carries neither vorbis nor opus".to_string(),
                ))
            }
        },
    };

    FormatDetector::validate_codec_support(&kind.codec())?;
    debug!(?format, ?kind, "selected decoder");
    Ok(kind)
}

/// Any of the adapters, behind one [`PcmDecoder`].
pub enum AnyDecoder {
    #[cfg(feature = "decoder-vorbis")]
    Vorbis(VorbisDecoder),
    #[cfg(feature = "decoder-opus")]
    OpusStream(OpusStreamDecoder),
    #[cfg(feature = "decoder-opus")]
    OpusFile(OpusFileDecoder),
    Wav(WavDecoder),
    Native(NativeDecoder),
}

impl AnyDecoder {
    /// Unopened decoder of `kind`.
    pub fn new(kind: DecoderKind, config: DecoderConfig) -> Result<Self> {
        FormatDetector::validate_codec_support(&kind.codec())?;
        let decoder = match kind {
            #[cfg(feature = "decoder-vorbis")]
            DecoderKind::Vorbis => AnyDecoder::Vorbis(VorbisDecoder::new(config)),
            #[cfg(feature = "decoder-opus")]
            DecoderKind::OpusStream => AnyDecoder::OpusStream(OpusStreamDecoder::new(config)),
            #[cfg(feature = "decoder-opus")]
            DecoderKind::OpusFile => AnyDecoder::OpusFile(OpusFileDecoder::new(config)),
            DecoderKind::Wav => AnyDecoder::Wav(WavDecoder::new(config)),
            DecoderKind::Mp3 => AnyDecoder::Native(NativeDecoder::new(AudioCodec::Mp3, config)),
            DecoderKind::Flac => AnyDecoder::Native(NativeDecoder::new(AudioCodec::Flac, config)),
            #[allow(unreachable_patterns)]
            other => {
                return Err(PlaybackError::UnsupportedCodec(format!(
                    "{:?} decoder not compiled in",
                    other
                )))
            }
        };
        Ok(decoder)
    }

    fn inner(&self) -> &dyn PcmDecoder {
        match self {
            #[cfg(feature = "decoder-vorbis")]
            AnyDecoder::Vorbis(d) => d,
            #[cfg(feature = "decoder-opus")]
            AnyDecoder::OpusStream(d) => d,
            #[cfg(feature = "decoder-opus")]
            AnyDecoder::OpusFile(d) => d,
            AnyDecoder::Wav(d) => d,
            AnyDecoder::Native(d) => d,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PcmDecoder {
        match self {
            #[cfg(feature = "decoder-vorbis")]
            AnyDecoder::Vorbis(d) => d,
            #[cfg(feature = "decoder-opus")]
            AnyDecoder::OpusStream(d) => d,
            #[cfg(feature = "decoder-opus")]
            AnyDecoder::OpusFile(d) => d,
            AnyDecoder::Wav(d) => d,
            AnyDecoder::Native(d) => d,
        }
    }
}

impl std::fmt::Debug for AnyDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            #[cfg(feature = "decoder-vorbis")]
            AnyDecoder::Vorbis(_) => "Vorbis",
            #[cfg(feature = "decoder-opus")]
            AnyDecoder::OpusStream(_) => "OpusStream",
            #[cfg(feature = "decoder-opus")]
            AnyDecoder::OpusFile(_) => "OpusFile",
            AnyDecoder::Wav(_) => "Wav",
            AnyDecoder::Native(_) => "Native",
        };
        f.debug_tuple("AnyDecoder").field(&name).finish()
    }
}

impl PcmDecoder for AnyDecoder {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.inner_mut().open(path)
    }

    fn format(&self) -> Result<AudioFormat> {
        self.inner().format()
    }

    fn decode_samples(&mut self, frames: usize, out: &mut [u8]) -> Result<usize> {
        self.inner_mut().decode_samples(frames, out)
    }

    fn close(&mut self) -> Result<()> {
        self.inner_mut().close()
    }

    fn state(&self) -> DecoderState {
        self.inner().state()
    }
}

/// Select, construct and open the right adapter for `path`.
pub fn open_decoder(path: &Path, config: &DecoderConfig) -> Result<AnyDecoder> {
    config.validate().map_err(PlaybackError::InvalidRequest)?;

    let kind = select_decoder_kind(path, config.prefer_opus_file)?;
    let mut decoder = AnyDecoder::new(kind, config.clone())?;
    decoder.open(path)?;

    let format = decoder.format()?;
    info!(
        path = %path.display(),
        ?kind,
        sample_rate = format.sample_rate,
        channels = format.channels,
        "decoder opened"
    );
    Ok(decoder)
}
