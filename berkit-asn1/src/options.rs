//! Transcoder settings

/// Settings shared by [`BerEncoder`](crate::ber::BerEncoder) and
/// [`BerDecoder`](crate::ber::BerDecoder)
///
/// # Defaults
///
/// | setting                   | default |
/// |---------------------------|---------|
/// | `max_depth`               | 64      |
/// | `allow_indefinite_length` | true    |
/// | `omit_default_fields`     | false   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BerOptions {
    /// Maximum nesting depth of constructed encodings
    pub max_depth: usize,
    /// Accept indefinite-length constructed encodings on decoding
    pub allow_indefinite_length: bool,
    /// Leave out SEQUENCE fields whose value equals their declared default
    pub omit_default_fields: bool,
}

impl BerOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_indefinite_length(mut self, allow: bool) -> Self {
        self.allow_indefinite_length = allow;
        self
    }

    pub fn with_omit_default_fields(mut self, omit: bool) -> Self {
        self.omit_default_fields = omit;
        self
    }
}

impl Default for BerOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            allow_indefinite_length: true,
            omit_default_fields: false,
        }
    }
}
