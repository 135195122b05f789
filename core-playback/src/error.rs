//! # Playback Error Types
//!
//! Error types for opening containers and pulling PCM out of them.

use thiserror::Error;

/// Errors that can occur while opening or decoding an audio file.
///
/// Clean end of stream is never an error: `decode_samples` returns `Ok(0)`.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// I/O error while opening or reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The container reader failed (bad capture pattern, checksum, ...).
    #[error("Container read error: {0}")]
    ContainerError(String),

    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    /// Audio format is not recognized or cannot be parsed.
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// Codec is not supported by any adapter (or its feature is disabled).
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// The container ended before all header packets were seen.
    #[error("Unexpected end of stream")]
    UnexpectedEndOfStream,

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// Codec initialization failed (header rejected, unsupported layout).
    #[error("Decoder internal error: {0}")]
    DecoderError(String),

    /// A packet or native read failed mid-stream.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    // ========================================================================
    // Buffering Errors
    // ========================================================================
    /// Ring buffer cannot accept the write.
    #[error("Buffer overflow: {requested} bytes requested, {free} bytes free")]
    BufferOverflow { requested: usize, free: usize },

    /// Caller asked for something the decoder can never satisfy.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Attempted operation before `open` or after `close`.
    #[error("No track loaded")]
    NoTrackLoaded,
}

impl PlaybackError {
    /// Returns `true` if this error is related to audio format/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidFormat(_)
                | PlaybackError::UnsupportedCodec(_)
                | PlaybackError::ContainerError(_)
        )
    }

    /// Returns `true` if the container was truncated inside its headers.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, PlaybackError::UnexpectedEndOfStream)
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
