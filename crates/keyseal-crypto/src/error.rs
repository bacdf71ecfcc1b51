//! Error types for key construction and message sealing

use thiserror::Error;

/// Errors from key and message codec operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Key material has the wrong number of bytes
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },

    /// Key material has the right length but cannot be used
    #[error("invalid key encoding: {reason}")]
    InvalidKeyEncoding {
        /// Why the key was rejected
        reason: String,
    },

    /// Counterparty public key produced a non-contributory shared secret
    #[error("counterparty public key is a low-order point")]
    LowOrderPointRejected,

    /// Authentication tag did not verify
    #[error("message authentication failed")]
    AuthenticationFailed,

    /// Encoded message framing could not be parsed
    #[error("malformed frame: {reason}")]
    MalformedFrame {
        /// What was wrong with the frame
        reason: String,
    },
}

impl CodecError {
    /// Returns true if this error is fatal to the current call
    ///
    /// Construction and key agreement errors abort the call. Decode-time
    /// failures are expected when probing arbitrary data and are never fatal.
    pub fn is_fatal(&self) -> bool {
        match self {
            // Untrusted key material or unsafe counterparty - fatal
            Self::InvalidKeyLength { .. } => true,
            Self::InvalidKeyEncoding { .. } => true,
            Self::LowOrderPointRejected => true,

            // Normal outcomes of speculative decoding
            Self::AuthenticationFailed => false,
            Self::MalformedFrame { .. } => false,
        }
    }
}

/// Result alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_errors_are_fatal() {
        assert!(CodecError::InvalidKeyLength { expected: 32, actual: 31 }.is_fatal());
        assert!(CodecError::InvalidKeyEncoding { reason: "zero".to_string() }.is_fatal());
        assert!(CodecError::LowOrderPointRejected.is_fatal());
    }

    #[test]
    fn decode_errors_are_not_fatal() {
        assert!(!CodecError::AuthenticationFailed.is_fatal());
        assert!(!CodecError::MalformedFrame { reason: "short".to_string() }.is_fatal());
    }

    #[test]
    fn error_display() {
        let err = CodecError::InvalidKeyLength { expected: 32, actual: 16 };
        assert_eq!(err.to_string(), "invalid key length: expected 32, got 16");
    }
}
