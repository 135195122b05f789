//! # Sample Format Converter
//!
//! Converts native codec samples into canonical interleaved s16le bytes.

use serde::{Deserialize, Serialize};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Policy for float samples that land outside the 16-bit range after scaling.
///
/// Both modes compute `floor(sample × 32767)`. They differ only for inputs
/// outside `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleConversion {
    /// Saturate to `[-32768, 32767]`.
    #[default]
    Clamp,
    /// Truncate to the low 16 bits (two's-complement wrap), matching a
    /// float → int64 → int16 cast.
    Wrap,
}

/// Sample converter producing the crate's single output format.
pub struct SampleConverter;

impl SampleConverter {
    /// Convert one float sample with `floor(sample × 32767)`.
    ///
    /// NaN maps to 0 in both modes.
    pub fn f32_to_i16(sample: f32, conversion: SampleConversion) -> i16 {
        let scaled = (f64::from(sample) * 32767.0).floor();
        match conversion {
            SampleConversion::Clamp => scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16,
            SampleConversion::Wrap => (scaled as i64) as i16,
        }
    }

    /// Append interleaved float samples to `out` as s16le bytes.
    pub fn push_f32(samples: &[f32], conversion: SampleConversion, out: &mut Vec<u8>) {
        out.reserve(samples.len() * 2);
        for &sample in samples {
            out.extend_from_slice(&Self::f32_to_i16(sample, conversion).to_le_bytes());
        }
    }

    /// Append interleaved native 16-bit samples to `out` unchanged.
    pub fn push_i16(samples: &[i16], out: &mut Vec<u8>) {
        out.reserve(samples.len() * 2);
        for &sample in samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
    }

    /// Append a decoded Symphonia buffer to `out`, interleaving its planes.
    ///
    /// 16-bit buffers are copied through without scaling; every other sample
    /// format is normalised to float first and then goes through `conversion`.
    pub fn push_audio_buffer(
        buffer: &AudioBufferRef<'_>,
        conversion: SampleConversion,
        out: &mut Vec<u8>,
    ) {
        match buffer {
            AudioBufferRef::S16(buf) => Self::push_planar(buf, out, |sample: i16| sample),
            AudioBufferRef::F32(buf) => {
                Self::push_planar(buf, out, |sample: f32| Self::f32_to_i16(sample, conversion))
            }
            AudioBufferRef::F64(buf) => Self::push_planar(buf, out, Self::via_f32(conversion)),
            AudioBufferRef::S32(buf) => Self::push_planar(buf, out, Self::via_f32(conversion)),
            AudioBufferRef::S24(buf) => Self::push_planar(buf, out, Self::via_f32(conversion)),
            AudioBufferRef::S8(buf) => Self::push_planar(buf, out, Self::via_f32(conversion)),
            AudioBufferRef::U32(buf) => Self::push_planar(buf, out, Self::via_f32(conversion)),
            AudioBufferRef::U24(buf) => Self::push_planar(buf, out, Self::via_f32(conversion)),
            AudioBufferRef::U16(buf) => Self::push_planar(buf, out, Self::via_f32(conversion)),
            AudioBufferRef::U8(buf) => Self::push_planar(buf, out, Self::via_f32(conversion)),
        }
    }

    /// Symphonia's own normalisation to `[-1.0, 1.0]`, then `f32_to_i16`.
    fn via_f32<T: IntoSample<f32>>(conversion: SampleConversion) -> impl Fn(T) -> i16 {
        move |sample| Self::f32_to_i16(sample.into_sample(), conversion)
    }

    fn push_planar<T>(buf: &AudioBuffer<T>, out: &mut Vec<u8>, convert: impl Fn(T) -> i16)
    where
        T: Sample + Copy,
    {
        let channels = buf.spec().channels.count();
        out.reserve(buf.frames() * channels * 2);

        for frame in 0..buf.frames() {
            for channel in 0..channels {
                out.extend_from_slice(&convert(buf.chan(channel)[frame]).to_le_bytes());
            }
        }
    }
}
