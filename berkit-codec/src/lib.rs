//! Codec façade for the berkit BER engine
//!
//! This crate turns the schema-driven transcoder of `berkit-asn1` into
//! named codecs working on a simple [`Message`] model:
//!
//! - [`message`]: user value model
//! - [`adapter`]: `Message` <-> `Value` conversion
//! - [`properties`]: per-registration settings
//! - [`summary`]: one-line message summaries
//! - [`codec`]: a codec bound to one schema
//! - [`registry`]: the named registry applications talk to

pub mod adapter;
pub mod codec;
pub mod message;
pub mod properties;
pub mod registry;
pub mod summary;

pub use codec::BerCodec;
pub use message::Message;
pub use properties::{CodecProperties, PropertyValue};
pub use registry::{CodecRegistry, IncrementalDecode, Registration};
pub use summary::{ChoiceSummary, DefaultSummary, FieldChoiceSummary, Summarizer};
