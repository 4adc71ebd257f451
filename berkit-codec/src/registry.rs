//! Named codec registry
//!
//! Applications register each message schema once at startup and then
//! encode and decode by name:
//!
//! ```rust
//! use berkit_asn1::schema::{self, SequenceBuilder};
//! use berkit_codec::{CodecProperties, CodecRegistry, DefaultSummary, Message};
//!
//! let ping = SequenceBuilder::new("Ping")
//!     .field("id", schema::integer())
//!     .build()
//!     .unwrap();
//!
//! let mut registry = CodecRegistry::new();
//! registry.register_codec("ping", ping, DefaultSummary).unwrap();
//! registry
//!     .alias("ping.strict", "ping", CodecProperties::new().with("indefinite_length", false))
//!     .unwrap();
//!
//! let message = Message::map([("id", Message::Int(1))]);
//! let (bytes, summary) = registry.encode("ping", &message).unwrap().unwrap();
//! assert_eq!(bytes, vec![0x30, 0x03, 0x02, 0x01, 0x01]);
//! assert_eq!(summary, "Ping");
//! assert!(registry.encode("pong", &message).is_none());
//! ```
//!
//! # Concurrency
//!
//! Registration takes `&mut self`; lookups take `&self` and never mutate,
//! so a fully populated registry can be shared behind an `Arc`.

use crate::codec::BerCodec;
use crate::message::Message;
use crate::properties::CodecProperties;
use crate::summary::{DefaultSummary, Summarizer};
use berkit_asn1::SchemaNode;
use berkit_core::{BerError, BerResult};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Everything needed to build a codec for one name
#[derive(Clone)]
pub struct Registration {
    pub schema: Arc<SchemaNode>,
    pub summarizer: Arc<dyn Summarizer>,
    pub properties: CodecProperties,
}

impl Registration {
    /// Registration with the default summary and no properties
    pub fn new(schema: impl Into<Arc<SchemaNode>>) -> Self {
        Self {
            schema: schema.into(),
            summarizer: Arc::new(DefaultSummary),
            properties: CodecProperties::new(),
        }
    }

    pub fn with_summarizer(mut self, summarizer: impl Summarizer + 'static) -> Self {
        self.summarizer = Arc::new(summarizer);
        self
    }

    pub fn with_properties(mut self, properties: CodecProperties) -> Self {
        self.properties = properties;
        self
    }

    fn codec(&self, overrides: &CodecProperties) -> BerResult<BerCodec> {
        BerCodec::new(
            self.schema.clone(),
            self.summarizer.clone(),
            &self.properties.merged(overrides),
        )
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("schema", &self.schema.label())
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// Outcome of decoding from a buffer that may still be filling up
#[derive(Debug, Clone, PartialEq)]
pub enum IncrementalDecode {
    /// A complete message was found at the front of the buffer
    Decoded {
        consumed: usize,
        message: Message,
        summary: String,
    },
    /// The buffer holds the beginning of a message only
    NeedMoreData,
    Error(BerError),
}

#[derive(Debug, Default)]
pub struct CodecRegistry {
    codecs: BTreeMap<String, Registration>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` under `name`
    ///
    /// The first registration of a name wins; registering it again is
    /// silently ignored.
    ///
    /// # Error Handling
    /// Returns `BerError::Schema` when the schema does not validate.
    pub fn register_codec(
        &mut self,
        name: impl Into<String>,
        schema: impl Into<Arc<SchemaNode>>,
        summarizer: impl Summarizer + 'static,
    ) -> BerResult<()> {
        self.register(name, Registration::new(schema).with_summarizer(summarizer))
    }

    /// Register a prepared [`Registration`], properties included
    ///
    /// A name that is already taken is left as it is, whatever `registration`
    /// holds.
    ///
    /// # Error Handling
    /// Returns `BerError::Schema` when the schema does not validate and
    /// `BerError::Config` for malformed properties.
    pub fn register(&mut self, name: impl Into<String>, registration: Registration) -> BerResult<()> {
        let name = name.into();
        if self.codecs.contains_key(&name) {
            debug!("codec '{}' already registered, keeping the first one", name);
            return Ok(());
        }
        registration.schema.validate()?;
        registration.codec(&CodecProperties::new())?;
        debug!("registered codec '{}' ({})", name, registration.schema.label());
        self.codecs.insert(name, registration);
        Ok(())
    }

    /// Register `new_name` as `existing` with `overrides` on top of its properties
    ///
    /// An existing `new_name` is replaced.
    ///
    /// # Error Handling
    /// Returns `BerError::Config` when `existing` is not registered or the
    /// merged properties are malformed.
    pub fn alias(
        &mut self,
        new_name: impl Into<String>,
        existing: &str,
        overrides: CodecProperties,
    ) -> BerResult<()> {
        let new_name = new_name.into();
        let base = self
            .codecs
            .get(existing)
            .ok_or_else(|| BerError::Config(format!("cannot alias unknown codec '{}'", existing)))?;
        let registration = Registration {
            schema: base.schema.clone(),
            summarizer: base.summarizer.clone(),
            properties: base.properties.merged(&overrides),
        };
        registration.codec(&CodecProperties::new())?;
        debug!("aliased codec '{}' to '{}'", new_name, existing);
        self.codecs.insert(new_name, registration);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.codecs.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }

    pub fn registration(&self, name: &str) -> Option<&Registration> {
        self.codecs.get(name)
    }

    /// Fresh codec for `name` with `overrides` applied for this codec only
    pub fn codec(&self, name: &str, overrides: &CodecProperties) -> Option<BerResult<BerCodec>> {
        self.codecs.get(name).map(|r| r.codec(overrides))
    }

    /// Encode with the codec registered as `name`; `None` if there is none
    pub fn encode(&self, name: &str, message: &Message) -> Option<BerResult<(Vec<u8>, String)>> {
        self.encode_with(name, message, &CodecProperties::new())
    }

    pub fn encode_with(
        &self,
        name: &str,
        message: &Message,
        overrides: &CodecProperties,
    ) -> Option<BerResult<(Vec<u8>, String)>> {
        let codec = self.codec(name, overrides)?;
        Some(codec.and_then(|c| c.encode(message)))
    }

    /// Decode with the codec registered as `name`; `None` if there is none
    pub fn decode(&self, name: &str, data: &[u8]) -> Option<BerResult<(Message, String)>> {
        self.decode_with(name, data, &CodecProperties::new())
    }

    pub fn decode_with(
        &self,
        name: &str,
        data: &[u8],
        overrides: &CodecProperties,
    ) -> Option<BerResult<(Message, String)>> {
        let codec = self.codec(name, overrides)?;
        Some(codec.and_then(|c| c.decode(data)))
    }

    /// Decode the first message of a buffer that may be incomplete
    ///
    /// With `complete` unset, a buffer that ends inside the message yields
    /// [`IncrementalDecode::NeedMoreData`]; with it set, the same buffer is
    /// an error.
    pub fn incremental_decode(&self, name: &str, data: &[u8], complete: bool) -> Option<IncrementalDecode> {
        let codec = match self.codec(name, &CodecProperties::new())? {
            Ok(codec) => codec,
            Err(e) => return Some(IncrementalDecode::Error(e)),
        };
        Some(match codec.decode_prefix(data) {
            Ok((message, summary, consumed)) => IncrementalDecode::Decoded {
                consumed,
                message,
                summary,
            },
            Err(e) if e.is_truncated() && !complete => IncrementalDecode::NeedMoreData,
            Err(e) => IncrementalDecode::Error(e),
        })
    }
}
