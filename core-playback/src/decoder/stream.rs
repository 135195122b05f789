//! # Streaming Adapter Loop
//!
//! The pull protocol shared by every codec adapter. Codec-specific code only
//! supplies a [`UnitSource`]: something that can decode one more unit of audio
//! into canonical s16le bytes. [`PcmStream`] owns that source plus the ring
//! buffer and turns irregular unit sizes into exact frame-sized reads.

use crate::config::DecoderConfig;
use crate::error::{PlaybackError, Result};
use crate::ring_buffer::RingBuffer;
use crate::traits::{AudioFormat, DecoderState, OUTPUT_BYTES_PER_SAMPLE};
use tracing::{debug, trace};

/// One codec's way of producing the next chunk of PCM.
pub trait UnitSource {
    fn channels(&self) -> usize;

    fn sample_rate(&self) -> u32;

    /// Upper bound on the frames a single `next_unit` call can append.
    fn max_unit_frames(&self) -> usize;

    /// Decode one more unit and append its interleaved s16le bytes to `out`.
    ///
    /// Returns `Ok(false)` once the source is exhausted. A unit may legitimately
    /// append nothing (e.g. the first Vorbis audio packet).
    fn next_unit(&mut self, out: &mut Vec<u8>) -> Result<bool>;

    /// Release codec and file handles.
    fn close(&mut self) {}
}

/// Ring-buffered pull stream over a [`UnitSource`].
pub struct PcmStream<S: UnitSource> {
    source: S,
    ring: RingBuffer,
    scratch: Vec<u8>,
    bytes_per_frame: usize,
    exhausted: bool,
    frames_delivered: u64,
}

impl<S: UnitSource> PcmStream<S> {
    pub fn new(source: S, config: &DecoderConfig) -> Self {
        let channels = source.channels();
        let capacity = config.ring_capacity_bytes(channels, source.max_unit_frames());
        debug!(
            channels,
            sample_rate = source.sample_rate(),
            capacity,
            "allocated PCM ring buffer"
        );

        Self {
            source,
            ring: RingBuffer::new(capacity),
            scratch: Vec::new(),
            bytes_per_frame: channels * OUTPUT_BYTES_PER_SAMPLE,
            exhausted: false,
            frames_delivered: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// `true` once the source has no more units; buffered bytes may remain.
    pub fn is_drained(&self) -> bool {
        self.exhausted
    }

    /// Frames handed out so far.
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    /// Frames currently buffered.
    pub fn buffered_frames(&self) -> usize {
        self.ring.size() / self.bytes_per_frame
    }

    /// Fill `out` with `frames` frames, pulling units until enough are
    /// buffered.
    ///
    /// Returns fewer frames only at the end of the stream, and `0` once both
    /// source and ring buffer are empty. Asking for zero frames is an
    /// [`PlaybackError::InvalidRequest`]: `0` is reserved for end of stream.
    pub fn decode_samples(&mut self, frames: usize, out: &mut [u8]) -> Result<usize> {
        if frames == 0 {
            return Err(PlaybackError::InvalidRequest(
                "requested zero frames".to_string(),
            ));
        }
        let requested_bytes = frames * self.bytes_per_frame;
        if out.len() < requested_bytes {
            return Err(PlaybackError::InvalidRequest(format!(
                "output buffer holds {} bytes, {} frames need {}",
                out.len(),
                frames,
                requested_bytes
            )));
        }
        if requested_bytes > self.ring.capacity() - self.max_unit_bytes() {
            return Err(PlaybackError::InvalidRequest(format!(
                "{} frames exceed the {} frame buffer",
                frames,
                self.ring.capacity() / self.bytes_per_frame - self.source.max_unit_frames()
            )));
        }

        loop {
            if self.ring.size() >= requested_bytes {
                return Ok(self.drain(requested_bytes, out));
            }

            if self.exhausted {
                let residual = self.ring.size() - self.ring.size() % self.bytes_per_frame;
                return Ok(self.drain(residual, out));
            }

            self.scratch.clear();
            if !self.source.next_unit(&mut self.scratch)? {
                debug!(
                    frames_delivered = self.frames_delivered,
                    buffered = self.buffered_frames(),
                    "source exhausted"
                );
                self.exhausted = true;
                continue;
            }

            trace!(bytes = self.scratch.len(), "decoded unit");
            self.ring.write(&self.scratch)?;
        }
    }

    /// Release the source. The stream must not be used afterwards.
    pub fn close(&mut self) {
        self.source.close();
        self.ring.clear();
        self.exhausted = true;
    }

    fn drain(&mut self, bytes: usize, out: &mut [u8]) -> usize {
        let read = self.ring.read_up_to(bytes, out);
        let frames = read / self.bytes_per_frame;
        self.frames_delivered += frames as u64;
        frames
    }

    fn max_unit_bytes(&self) -> usize {
        self.source.max_unit_frames() * self.bytes_per_frame
    }
}

/// Lifecycle bookkeeping shared by the codec adapters.
///
/// Holds the open stream (if any), its negotiated format and the decoder
/// state, so each adapter only has to know how to build its [`UnitSource`].
pub(crate) struct StreamSlot<S: UnitSource> {
    stream: Option<PcmStream<S>>,
    format: Option<AudioFormat>,
    state: DecoderState,
}

impl<S: UnitSource> Default for StreamSlot<S> {
    fn default() -> Self {
        Self {
            stream: None,
            format: None,
            state: DecoderState::Unopened,
        }
    }
}

impl<S: UnitSource> StreamSlot<S> {
    /// Drop anything still open and enter the header phase.
    pub fn begin_open(&mut self) {
        self.release();
        self.state = DecoderState::Sniffing;
    }

    /// Finish `open`: install the stream, or fall back to `Unopened`.
    pub fn finish_open(
        &mut self,
        opened: Result<S>,
        format: impl FnOnce(&S) -> AudioFormat,
        config: &DecoderConfig,
    ) -> Result<()> {
        match opened {
            Ok(source) => {
                let format = format(&source);
                debug!(?format, "decoder ready");
                self.stream = Some(PcmStream::new(source, config));
                self.format = Some(format);
                self.state = DecoderState::Streaming;
                Ok(())
            }
            Err(e) => {
                self.state = DecoderState::Unopened;
                Err(e)
            }
        }
    }

    pub fn format(&self) -> Result<AudioFormat> {
        self.format.ok_or(PlaybackError::NoTrackLoaded)
    }

    pub fn decode_samples(&mut self, frames: usize, out: &mut [u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(PlaybackError::NoTrackLoaded)?;
        let decoded = stream.decode_samples(frames, out)?;
        if stream.is_drained() {
            self.state = DecoderState::Drained;
        }
        Ok(decoded)
    }

    pub fn close(&mut self) {
        self.release();
        if self.state != DecoderState::Unopened {
            self.state = DecoderState::Closed;
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
        self.format = None;
    }
}
