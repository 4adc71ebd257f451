//! Builder API for schema trees
//!
//! Schema trees are normally produced by a schema compilation step and
//! written down with these helpers, e.g. SNMPv1's `VarBind`:
//!
//! ```rust
//! use berkit_asn1::schema::{self, SequenceBuilder};
//!
//! let var_bind = SequenceBuilder::new("VarBind")
//!     .field("name", schema::object_identifier())
//!     .field("value", schema::any())
//!     .build()
//!     .unwrap();
//! assert_eq!(var_bind.fields().len(), 2);
//! ```

use super::node::{
    Alternative, BitStringSpec, Field, IntegerSpec, SchemaKind, SchemaNode, StringType, TagMode,
    TagOverride, TaggedSpec,
};
use crate::ber::types::BerTagClass;
use crate::value::Value;
use berkit_core::BerResult;
use std::sync::Arc;

pub fn boolean() -> SchemaNode {
    SchemaNode::new(SchemaKind::Boolean)
}

/// Unconstrained INTEGER
pub fn integer() -> SchemaNode {
    SchemaNode::new(SchemaKind::Integer(IntegerSpec::new()))
}

pub fn integer_with(spec: IntegerSpec) -> SchemaNode {
    SchemaNode::new(SchemaKind::Integer(spec))
}

/// INTEGER (min..max)
pub fn integer_range(min: i128, max: i128) -> SchemaNode {
    integer_with(IntegerSpec::range(min, max))
}

/// INTEGER { name(value), ... } or ENUMERATED
pub fn enumerated(values: &[(&str, i128)]) -> SchemaNode {
    let spec = values
        .iter()
        .fold(IntegerSpec::new(), |spec, (name, value)| spec.named(*name, *value));
    integer_with(spec)
}

/// BIT STRING without named bits; bits are keyed by their decimal index
pub fn bit_string() -> SchemaNode {
    SchemaNode::new(SchemaKind::BitString(BitStringSpec::new()))
}

/// BIT STRING { name(bit), ... }
pub fn named_bits(bits: &[(&str, u32)]) -> SchemaNode {
    let spec = bits
        .iter()
        .fold(BitStringSpec::new(), |spec, (name, bit)| spec.named(*name, *bit));
    SchemaNode::new(SchemaKind::BitString(spec))
}

pub fn octet_string() -> SchemaNode {
    SchemaNode::new(SchemaKind::OctetString)
}

pub fn visible_string() -> SchemaNode {
    SchemaNode::new(SchemaKind::CharacterString(StringType::Visible))
}

pub fn ia5_string() -> SchemaNode {
    SchemaNode::new(SchemaKind::CharacterString(StringType::Ia5))
}

pub fn numeric_string() -> SchemaNode {
    SchemaNode::new(SchemaKind::CharacterString(StringType::Numeric))
}

pub fn null() -> SchemaNode {
    SchemaNode::new(SchemaKind::Null)
}

pub fn object_identifier() -> SchemaNode {
    SchemaNode::new(SchemaKind::ObjectIdentifier)
}

pub fn any() -> SchemaNode {
    SchemaNode::new(SchemaKind::Any)
}

/// SEQUENCE OF element
pub fn sequence_of(element: impl Into<Arc<SchemaNode>>) -> SchemaNode {
    SchemaNode::new(SchemaKind::SequenceOf(element.into()))
}

/// `[class number] IMPLICIT inner`
///
/// CHOICE and ANY have no tag of their own to replace, so an implicit tag
/// on them is turned into an explicit one, as X.680 31.2.7 requires.
pub fn implicit(class: BerTagClass, number: u32, inner: impl Into<Arc<SchemaNode>>) -> SchemaNode {
    let inner = inner.into();
    let mode = if inner.tag().is_some() {
        TagMode::Implicit
    } else {
        TagMode::Explicit
    };
    tagged(TagOverride { class, number, mode }, inner)
}

/// `[class number] EXPLICIT inner`
pub fn explicit(class: BerTagClass, number: u32, inner: impl Into<Arc<SchemaNode>>) -> SchemaNode {
    tagged(
        TagOverride {
            class,
            number,
            mode: TagMode::Explicit,
        },
        inner,
    )
}

/// `[number] IMPLICIT inner`, context-specific class
pub fn context(number: u32, inner: impl Into<Arc<SchemaNode>>) -> SchemaNode {
    implicit(BerTagClass::ContextSpecific, number, inner)
}

/// `[APPLICATION number] IMPLICIT inner`
pub fn application(number: u32, inner: impl Into<Arc<SchemaNode>>) -> SchemaNode {
    implicit(BerTagClass::Application, number, inner)
}

/// Wrap `inner` with an arbitrary tag override, exactly as given
pub fn tagged(tag: TagOverride, inner: impl Into<Arc<SchemaNode>>) -> SchemaNode {
    SchemaNode::new(SchemaKind::Tagged(TaggedSpec {
        tag,
        inner: inner.into(),
    }))
}

/// Builder for SEQUENCE nodes
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    name: Option<String>,
    fields: Vec<Field>,
}

impl SequenceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            fields: Vec::new(),
        }
    }

    /// Builder for an anonymous inner SEQUENCE
    pub fn anonymous() -> Self {
        Self {
            name: None,
            fields: Vec::new(),
        }
    }

    /// Mandatory field
    pub fn field(mut self, name: impl Into<String>, node: impl Into<Arc<SchemaNode>>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            node: node.into(),
            optional: false,
            default: None,
        });
        self
    }

    /// OPTIONAL field
    pub fn optional(mut self, name: impl Into<String>, node: impl Into<Arc<SchemaNode>>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            node: node.into(),
            optional: true,
            default: None,
        });
        self
    }

    /// Field with a DEFAULT value
    pub fn with_default(
        mut self,
        name: impl Into<String>,
        node: impl Into<Arc<SchemaNode>>,
        default: Value,
    ) -> Self {
        self.fields.push(Field {
            name: name.into(),
            node: node.into(),
            optional: true,
            default: Some(default),
        });
        self
    }

    /// Build and validate the SEQUENCE node
    pub fn build(self) -> BerResult<SchemaNode> {
        let node = SchemaNode::new(SchemaKind::Sequence(self.fields));
        let node = match self.name {
            Some(name) => node.named(name),
            None => node,
        };
        node.validate()?;
        Ok(node)
    }
}

/// Builder for CHOICE nodes
#[derive(Debug, Clone, Default)]
pub struct ChoiceBuilder {
    name: Option<String>,
    alternatives: Vec<Alternative>,
}

impl ChoiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            alternatives: Vec::new(),
        }
    }

    pub fn alternative(mut self, name: impl Into<String>, node: impl Into<Arc<SchemaNode>>) -> Self {
        self.alternatives.push(Alternative {
            name: name.into(),
            node: node.into(),
        });
        self
    }

    /// Build and validate the CHOICE node
    pub fn build(self) -> BerResult<SchemaNode> {
        let node = SchemaNode::new(SchemaKind::Choice(self.alternatives));
        let node = match self.name {
            Some(name) => node.named(name),
            None => node,
        };
        node.validate()?;
        Ok(node)
    }
}
