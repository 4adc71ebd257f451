//! berkit - schema-driven ASN.1 BER codec engine
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `berkit-core`: error handling and the OBJECT IDENTIFIER datatype
//! - `berkit-asn1`: schema model, native values, BER encoder and decoder
//! - `berkit-codec`: message model, value adapter, summaries, codec registry
//!
//! # Usage
//!
//! ```rust
//! use berkit::prelude::*;
//! use berkit::schema;
//!
//! let payload = ChoiceBuilder::new()
//!     .alternative("text", schema::octet_string())
//!     .alternative("empty", schema::null())
//!     .build()
//!     .unwrap();
//! let message_type = SequenceBuilder::new("Message")
//!     .field("id", schema::integer())
//!     .field("payload", payload)
//!     .build()
//!     .unwrap();
//!
//! let mut registry = CodecRegistry::new();
//! registry
//!     .register_codec("message", message_type, FieldChoiceSummary::new("MSG", "payload"))
//!     .unwrap();
//!
//! let message = Message::map([
//!     ("id", Message::Int(1)),
//!     ("payload", Message::choice("text", Message::bytes(b"hi"))),
//! ]);
//! let (bytes, summary) = registry.encode("message", &message).unwrap().unwrap();
//! assert_eq!(summary, "MSG text");
//! let (decoded, _) = registry.decode("message", &bytes).unwrap().unwrap();
//! assert_eq!(decoded, message);
//! ```

// Re-export core types
pub use berkit_core::{BerError, BerResult, DecodeErrorKind, ObjectIdentifier};

// Re-export the transcoder
pub use berkit_asn1::{ber, schema, BerOptions, SchemaNode, Value};

// Re-export the codec façade
pub use berkit_codec::{
    adapter, properties, BerCodec, ChoiceSummary, CodecProperties, CodecRegistry,
    DefaultSummary, FieldChoiceSummary, IncrementalDecode, Message, PropertyValue,
    Registration, Summarizer,
};

/// Types most applications need
pub mod prelude {
    pub use berkit_asn1::schema::{ChoiceBuilder, SequenceBuilder};
    pub use berkit_codec::{
        ChoiceSummary, CodecProperties, CodecRegistry, DefaultSummary, FieldChoiceSummary,
        IncrementalDecode, Message, Summarizer,
    };
    pub use berkit_core::{BerError, BerResult};
}
