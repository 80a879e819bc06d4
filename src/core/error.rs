//! Error types for metadata operations
//!
//! Only the write path surfaces errors. Read-side decoding (EXIF values, XMP
//! packets, JPEG scans) degrades to empty or omitted fields instead.

use thiserror::Error;

/// Error types for metadata operations
#[derive(Debug, Error)]
pub enum MetaError {
    /// The buffer is not a recognizable or openable image container
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// The container format has no writer for the requested metadata kind
    #[error("Unsupported write format: cannot write {kind} metadata to {format}")]
    UnsupportedWriteFormat {
        /// Detected or declared container format name
        format: String,
        /// Requested metadata kind
        kind: String,
    },

    /// A single field value could not be encoded
    #[error("Failed to encode field '{key}': {reason}")]
    FieldEncodingError {
        /// The field key as given by the caller
        key: String,
        /// Why encoding failed
        reason: String,
    },

    /// The serialized XMP does not fit in one JPEG APP1 segment
    #[error("XMP packet too large for APP1 segment: length field {length} exceeds {limit}")]
    PacketTooLarge {
        /// Computed APP1 length field value
        length: usize,
        /// Maximum value of a segment length field
        limit: usize,
    },

    /// The downstream re-encode or text-chunk embed step failed
    #[error("Embed failure during {stage}: {reason}")]
    EmbedFailure {
        /// Which step failed (e.g. "exif re-encode", "png text embed")
        stage: String,
        /// Underlying failure description
        reason: String,
    },

    /// IO error (raised by the XML writer)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MetaError {
    /// Build a [`MetaError::FieldEncodingError`] for `key`
    pub fn field(key: impl Into<String>, reason: impl Into<String>) -> Self {
        MetaError::FieldEncodingError {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`MetaError::EmbedFailure`] for `stage`
    pub fn embed(stage: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        MetaError::EmbedFailure {
            stage: stage.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a collaborator failure as an [`MetaError::EmbedFailure`], keeping
    /// errors that already are one.
    pub(crate) fn into_embed(self, stage: &str) -> Self {
        match self {
            MetaError::EmbedFailure { .. } => self,
            other => MetaError::embed(stage, other),
        }
    }
}

/// Result type alias for metadata operations
pub type MetaResult<T> = Result<T, MetaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetaError::PacketTooLarge {
            length: 70000,
            limit: 65535,
        };
        assert!(err.to_string().contains("70000"));
        assert!(err.to_string().contains("65535"));

        let err = MetaError::field("artist", "contains NUL");
        assert_eq!(
            err.to_string(),
            "Failed to encode field 'artist': contains NUL"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "writer closed");
        let err: MetaError = io_err.into();
        assert!(matches!(err, MetaError::IoError(_)));
    }

    #[test]
    fn test_into_embed_keeps_existing_stage() {
        let err = MetaError::embed("png text embed", "missing IEND").into_embed("other");
        match err {
            MetaError::EmbedFailure { stage, .. } => assert_eq!(stage, "png text embed"),
            other => panic!("unexpected error: {other}"),
        }

        let err = MetaError::InvalidContainer("bad".into()).into_embed("exif re-encode");
        assert!(matches!(err, MetaError::EmbedFailure { ref stage, .. } if stage == "exif re-encode"));
    }
}
