use thiserror::Error as ThisError;

/// Errors reported while building a response.
///
/// Inputs come from two places with very different trust levels: the database
/// rows (expected to be well-formed JSON, but checked anyway) and the host
/// framework (field descriptors, projection paths). Both surface here as
/// [`Error::InvalidInput`] with a byte offset into the offending input where
/// one is known.
///
/// Schema misses are deliberately *not* errors: a position that claims an
/// unregistered type is rewritten without a `__typename` so that partial
/// registrations never break production traffic.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// Malformed source JSON, an invalid field descriptor, or an otherwise
    /// inconsistent caller-provided input.
    #[error("invalid input at byte {offset}: {message}")]
    InvalidInput {
        /// Human-readable description of what was rejected.
        message: String,
        /// Byte index into the input where the problem begins.
        offset: usize,
    },

    /// A bug in this crate. Callers should treat this as a 500-class failure.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>, offset: usize) -> Self {
        Self::InvalidInput {
            message: message.into(),
            offset,
        }
    }

    /// Byte offset into the input this error points at, if known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::InvalidInput { offset, .. } => Some(*offset),
            Self::Internal { .. } => None,
        }
    }

    /// The error's message, without location information.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput { message, .. } | Self::Internal { message } => message,
        }
    }
}
