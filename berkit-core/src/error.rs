use thiserror::Error;

/// Main error type for berkit operations
///
/// The variants follow the four failure families of the codec engine:
/// schema construction, encoding, decoding and façade configuration.
/// `Internal` is reserved for invariant violations inside the engine itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BerError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Encoding error at {path}: {reason}")]
    Encoding { path: String, reason: String },

    #[error("Decoding error at offset {offset}: {kind}")]
    Decoding { offset: usize, kind: DecodeErrorKind },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal invariant violated: {0}")]
    Internal(String),
}

/// What went wrong while decoding a buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error("truncated input: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("unexpected tag: expected {expected}, found {found}")]
    UnexpectedTag { expected: String, found: String },

    #[error("no CHOICE alternative claims tag {0}")]
    UnknownAlternative(String),

    #[error("missing mandatory field '{0}'")]
    MissingField(String),

    #[error("invalid length: {0}")]
    InvalidLength(String),

    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("unknown enumeration value {0}")]
    UnknownEnumValue(i128),

    #[error("maximum nesting depth {0} exceeded")]
    DepthExceeded(usize),

    #[error("{0} unexpected trailing bytes")]
    TrailingData(usize),
}

impl BerError {
    /// Build an encoding error for the value found at `path`
    pub fn encoding(path: impl Into<String>, reason: impl Into<String>) -> Self {
        BerError::Encoding {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a decoding error at an absolute buffer offset
    pub fn decoding(offset: usize, kind: DecodeErrorKind) -> Self {
        BerError::Decoding { offset, kind }
    }

    /// Decoding failure kind, if this is a decoding error
    pub fn decode_kind(&self) -> Option<&DecodeErrorKind> {
        match self {
            BerError::Decoding { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// True when the input ended before a complete TLV could be read
    ///
    /// Used by incremental decoding to tell "need more data" apart from
    /// malformed input.
    pub fn is_truncated(&self) -> bool {
        matches!(self.decode_kind(), Some(DecodeErrorKind::Truncated { .. }))
    }
}

/// Result type alias for berkit operations
pub type BerResult<T> = Result<T, BerError>;
