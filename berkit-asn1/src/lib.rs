//! ASN.1 schema model and schema-driven BER transcoder
//!
//! - [`schema`]: immutable type trees describing messages
//! - [`ber`]: TLV primitives, [`BerEncoder`](ber::BerEncoder) and
//!   [`BerDecoder`](ber::BerDecoder)
//! - [`Value`]: the decoded value tree

pub mod ber;
pub mod options;
pub mod schema;
pub mod value;

pub use options::BerOptions;
pub use schema::SchemaNode;
pub use value::Value;
