//! Error types for module identification and sample extraction

use std::io;

use thiserror::Error;

/// Errors that can occur while identifying a module or extracting its samples
///
/// Every variant is terminal for the decode in progress; no partial module is
/// ever returned alongside an error.
#[derive(Debug, Error)]
pub enum RipError {
    /// No format signature matched and the fallback MOD title check failed
    #[error("File is not a tracker module")]
    UnrecognizedFormat,
    /// Valid module using a feature this crate does not extract
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
    /// A fixed-size record failed its signature check
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    /// A read returned fewer bytes than the format requires
    #[error("Unexpected end of stream")]
    TruncatedStream,
    /// Package envelope does not wrap exactly one music object
    #[error("Invalid package envelope: {0}")]
    InvalidEnvelope(String),
    /// IO error other than end of stream
    #[error("IO error: {0}")]
    Io(#[source] io::Error),
}

impl RipError {
    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Self::UnsupportedFeature(what.into())
    }

    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        Self::MalformedHeader(what.into())
    }

    pub(crate) fn envelope(what: impl Into<String>) -> Self {
        Self::InvalidEnvelope(what.into())
    }
}

impl From<io::Error> for RipError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::TruncatedStream
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            RipError::UnrecognizedFormat.to_string(),
            "File is not a tracker module"
        );
        assert_eq!(
            RipError::unsupported("stereo samples").to_string(),
            "Unsupported feature: stereo samples"
        );
        assert_eq!(
            RipError::TruncatedStream.to_string(),
            "Unexpected end of stream"
        );
    }

    #[test]
    fn test_eof_maps_to_truncated_stream() {
        let err = RipError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(err, RipError::TruncatedStream));

        let err = RipError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, RipError::Io(_)));
    }
}
