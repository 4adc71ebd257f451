//! ASN.1 schema model
//!
//! A schema is a tree of immutable [`SchemaNode`]s describing one message
//! type. The BER encoder and decoder walk this tree; they never guess the
//! type of an element from its bytes alone.

pub mod builder;
pub mod node;
mod validate;

pub use builder::*;
pub use node::{
    Alternative, BitStringSpec, Field, IntegerSpec, SchemaKind, SchemaNode, StringType, TagMode,
    TagOverride, TaggedSpec,
};
