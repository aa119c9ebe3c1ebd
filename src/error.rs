//! Error types for WAV playback.

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Errors that abort a `play_file` call.
///
/// Every variant is fatal to the current attempt: whatever hardware was
/// acquired before the failure is released before the error is returned.
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    /// Opening or reading the source file failed
    #[error("IO error: {0}")]
    Io(IoErrorKind),

    /// The WAV header is not a mono linear PCM header
    #[error("Format error: {0}")]
    Format(FormatErrorKind),

    /// Another playback session is still active
    #[error("A playback session is already active")]
    AlreadyPlaying,

    /// The amplifier enable line could not be driven
    #[error("Amplifier GPIO error: {0}")]
    Gpio(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// I/O failure detail
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    /// The storage backend refused to open the file
    #[error("could not open {path}: {reason}")]
    OpenFailed {
        /// Requested path
        path: String,
        /// Backend-provided reason
        reason: String,
    },

    /// The file ended before all header fields were read
    #[error("truncated WAV header")]
    TruncatedHeader,
}

/// Header validation failure detail
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    /// First four bytes are not `RIFF`
    #[error("no RIFF format header")]
    BadRiffMagic,

    /// Form type is not `WAVE`
    #[error("no WAVE format header")]
    BadWaveMagic,

    /// First sub-chunk is not `fmt `
    #[error("no 'fmt ' sub-chunk")]
    BadFmtMagic,

    /// Second sub-chunk is not `data`
    #[error("no 'data' sub-chunk")]
    BadDataMagic,

    /// Audio format code other than 1 (linear PCM)
    #[error("unsupported audio format {0}, only linear PCM is accepted")]
    UnsupportedCodec(u16),

    /// Channel count other than 1
    #[error("{0} channels, only mono files are accepted")]
    UnsupportedChannelLayout(u16),

    /// Bit depth other than 8 or 16
    #[error("unsupported bit depth {0}")]
    UnsupportedBitDepth(u16),
}

impl From<IoErrorKind> for PlayerError {
    fn from(kind: IoErrorKind) -> Self {
        PlayerError::Io(kind)
    }
}

impl From<FormatErrorKind> for PlayerError {
    fn from(kind: FormatErrorKind) -> Self {
        PlayerError::Format(kind)
    }
}

impl PlayerError {
    /// Header format detail, if this is a format error
    pub fn format_kind(&self) -> Option<FormatErrorKind> {
        match self {
            PlayerError::Format(kind) => Some(*kind),
            _ => None,
        }
    }

    /// True for a header that ended early
    pub fn is_truncated_header(&self) -> bool {
        matches!(self, PlayerError::Io(IoErrorKind::TruncatedHeader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let err = PlayerError::from(FormatErrorKind::UnsupportedChannelLayout(2));
        assert_eq!(
            err.to_string(),
            "Format error: 2 channels, only mono files are accepted"
        );
        let err = PlayerError::from(IoErrorKind::TruncatedHeader);
        assert_eq!(err.to_string(), "IO error: truncated WAV header");
    }

    #[test]
    fn test_kind_helpers() {
        assert!(PlayerError::from(IoErrorKind::TruncatedHeader).is_truncated_header());
        assert_eq!(
            PlayerError::from(FormatErrorKind::BadRiffMagic).format_kind(),
            Some(FormatErrorKind::BadRiffMagic)
        );
        assert_eq!(PlayerError::AlreadyPlaying.format_kind(), None);
    }
}
