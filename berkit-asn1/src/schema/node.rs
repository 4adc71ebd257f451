//! Schema node types

use crate::ber::types::{universal, BerTag, BerTagClass};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// One ASN.1 type definition
///
/// Nodes are immutable once built. Children are held through `Arc` so that a
/// sub-tree such as `VarBindList` can be referenced from several parents and
/// shared read-only between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    name: Option<String>,
    kind: SchemaKind,
}

/// The type constructor of a [`SchemaNode`]
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Boolean,
    Integer(IntegerSpec),
    BitString(BitStringSpec),
    OctetString,
    CharacterString(StringType),
    Null,
    ObjectIdentifier,
    Sequence(Vec<Field>),
    SequenceOf(Arc<SchemaNode>),
    Choice(Vec<Alternative>),
    /// TYPE wrapper: a tag override around another node
    Tagged(TaggedSpec),
    /// Open type: any single TLV, kept undecoded
    Any,
}

/// Constraints and named values of an INTEGER
///
/// An INTEGER with named values behaves as an enumeration: decoding yields
/// the symbol and values without a symbol are rejected.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntegerSpec {
    named: Vec<(String, i128)>,
    min: Option<i128>,
    max: Option<i128>,
}

impl IntegerSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive value range
    pub fn range(min: i128, max: i128) -> Self {
        Self {
            named: Vec::new(),
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn with_min(mut self, min: i128) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: i128) -> Self {
        self.max = Some(max);
        self
    }

    /// Declare a named value
    pub fn named(mut self, name: impl Into<String>, value: i128) -> Self {
        self.named.push((name.into(), value));
        self
    }

    pub fn min(&self) -> Option<i128> {
        self.min
    }

    pub fn max(&self) -> Option<i128> {
        self.max
    }

    pub fn named_values(&self) -> &[(String, i128)] {
        &self.named
    }

    pub fn is_enumerated(&self) -> bool {
        !self.named.is_empty()
    }

    /// Symbol declared for `value`
    pub fn symbol(&self, value: i128) -> Option<&str> {
        self.named
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }

    /// Value declared for `symbol`
    pub fn value_of(&self, symbol: &str) -> Option<i128> {
        self.named.iter().find(|(n, _)| n == symbol).map(|(_, v)| *v)
    }

    /// Check `value` against the range constraint
    pub fn check_range(&self, value: i128) -> Result<(), String> {
        let below = self.min.is_some_and(|min| value < min);
        let above = self.max.is_some_and(|max| value > max);
        if below || above {
            return Err(format!("integer {} violates constraint {}", value, self.range_label()));
        }
        Ok(())
    }

    fn range_label(&self) -> String {
        let bound = |b: Option<i128>, open: &str| b.map_or_else(|| open.to_string(), |v| v.to_string());
        format!("[{}..{}]", bound(self.min, "MIN"), bound(self.max, "MAX"))
    }
}

/// Named bits of a BIT STRING
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BitStringSpec {
    bits: Vec<(String, u32)>,
}

impl BitStringSpec {
    /// Longest BIT STRING, in bits, accepted on encoding and decoding
    pub const MAX_BITS: u32 = 1 << 16;

    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a named bit; bit 0 is the most significant bit of the first byte
    pub fn named(mut self, name: impl Into<String>, bit: u32) -> Self {
        self.bits.push((name.into(), bit));
        self
    }

    pub fn named_bits(&self) -> &[(String, u32)] {
        &self.bits
    }

    pub fn has_named_bits(&self) -> bool {
        !self.bits.is_empty()
    }

    pub fn bit_of(&self, name: &str) -> Option<u32> {
        self.bits.iter().find(|(n, _)| n == name).map(|(_, b)| *b)
    }

    pub fn name_of(&self, bit: u32) -> Option<&str> {
        self.bits.iter().find(|(_, b)| *b == bit).map(|(n, _)| n.as_str())
    }

    /// Number of bits needed to carry every named bit
    pub fn bit_count(&self) -> u32 {
        self.bits.iter().map(|(_, b)| b.saturating_add(1)).max().unwrap_or(0)
    }
}

/// Restricted character string types sharing one representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringType {
    Visible,
    Ia5,
    Numeric,
}

impl StringType {
    pub fn universal_number(self) -> u32 {
        match self {
            StringType::Visible => universal::VISIBLE_STRING,
            StringType::Ia5 => universal::IA5_STRING,
            StringType::Numeric => universal::NUMERIC_STRING,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StringType::Visible => "VisibleString",
            StringType::Ia5 => "IA5String",
            StringType::Numeric => "NumericString",
        }
    }

    /// Whether `byte` belongs to this type's character set
    pub fn accepts(self, byte: u8) -> bool {
        match self {
            StringType::Visible => (0x20..=0x7E).contains(&byte),
            StringType::Ia5 => byte <= 0x7F,
            StringType::Numeric => byte.is_ascii_digit() || byte == b' ',
        }
    }
}

/// A named SEQUENCE component
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub node: Arc<SchemaNode>,
    pub optional: bool,
    /// Value the decoder fills in when an optional field is absent
    pub default: Option<Value>,
}

/// A named CHOICE alternative
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub name: String,
    pub node: Arc<SchemaNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagMode {
    /// The override tag replaces the inner type's tag
    Implicit,
    /// The inner encoding becomes the content of a constructed wrapper
    Explicit,
}

/// Tag of a TYPE wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagOverride {
    pub class: BerTagClass,
    pub number: u32,
    pub mode: TagMode,
}

impl TagOverride {
    /// Wire tag carrying the given form bit
    pub fn ber_tag(&self, constructed: bool) -> BerTag {
        BerTag::new(self.class, constructed, self.number)
    }
}

impl fmt::Display for TagOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            TagMode::Implicit => "IMPLICIT",
            TagMode::Explicit => "EXPLICIT",
        };
        write!(f, "[{} {}] {}", self.class.label(), self.number, mode)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSpec {
    pub tag: TagOverride,
    pub inner: Arc<SchemaNode>,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self { name: None, kind }
    }

    /// Attach a type name, used in diagnostics and default summaries
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Type name, or the ASN.1 constructor name for anonymous nodes
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.kind {
            SchemaKind::Boolean => "BOOLEAN".to_string(),
            SchemaKind::Integer(_) => "INTEGER".to_string(),
            SchemaKind::BitString(_) => "BIT STRING".to_string(),
            SchemaKind::OctetString => "OCTET STRING".to_string(),
            SchemaKind::CharacterString(t) => t.label().to_string(),
            SchemaKind::Null => "NULL".to_string(),
            SchemaKind::ObjectIdentifier => "OBJECT IDENTIFIER".to_string(),
            SchemaKind::Sequence(_) => "SEQUENCE".to_string(),
            SchemaKind::SequenceOf(element) => format!("SEQUENCE OF {}", element.label()),
            SchemaKind::Choice(_) => "CHOICE".to_string(),
            SchemaKind::Tagged(spec) => format!("{} {}", spec.tag, spec.inner.label()),
            SchemaKind::Any => "ANY".to_string(),
        }
    }

    /// Outer wire tag of this node
    ///
    /// `None` for untagged CHOICE and ANY, whose tag depends on the value.
    pub fn tag(&self) -> Option<BerTag> {
        match &self.kind {
            SchemaKind::Boolean => Some(BerTag::universal(false, universal::BOOLEAN)),
            SchemaKind::Integer(_) => Some(BerTag::universal(false, universal::INTEGER)),
            SchemaKind::BitString(_) => Some(BerTag::universal(false, universal::BIT_STRING)),
            SchemaKind::OctetString => Some(BerTag::universal(false, universal::OCTET_STRING)),
            SchemaKind::CharacterString(t) => Some(BerTag::universal(false, t.universal_number())),
            SchemaKind::Null => Some(BerTag::universal(false, universal::NULL)),
            SchemaKind::ObjectIdentifier => {
                Some(BerTag::universal(false, universal::OBJECT_IDENTIFIER))
            }
            SchemaKind::Sequence(_) | SchemaKind::SequenceOf(_) => {
                Some(BerTag::universal(true, universal::SEQUENCE))
            }
            SchemaKind::Tagged(spec) => match spec.tag.mode {
                TagMode::Implicit => spec
                    .inner
                    .tag()
                    .map(|inner| spec.tag.ber_tag(inner.is_constructed())),
                TagMode::Explicit => Some(spec.tag.ber_tag(true)),
            },
            SchemaKind::Choice(_) | SchemaKind::Any => None,
        }
    }

    /// Whether an element carrying `tag` can be decoded with this node
    pub fn matches_tag(&self, tag: &BerTag) -> bool {
        match &self.kind {
            SchemaKind::Choice(alternatives) => {
                alternatives.iter().any(|a| a.node.matches_tag(tag))
            }
            SchemaKind::Any => true,
            _ => self.tag().is_some_and(|own| own.matches(tag)),
        }
    }

    /// Human readable description of the tags this node accepts
    pub fn expected_tags(&self) -> String {
        match self.tag() {
            Some(tag) => format!("{} {}", self.label(), tag),
            None => format!("an alternative of {}", self.label()),
        }
    }

    /// The node with every TYPE wrapper stripped
    pub fn untagged(&self) -> &SchemaNode {
        let mut node = self;
        while let SchemaKind::Tagged(spec) = &node.kind {
            node = &spec.inner;
        }
        node
    }

    /// SEQUENCE fields in declaration order (empty for other kinds)
    pub fn fields(&self) -> &[Field] {
        match &self.untagged().kind {
            SchemaKind::Sequence(fields) => fields,
            _ => &[],
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// CHOICE alternatives in declaration order (empty for other kinds)
    pub fn alternatives(&self) -> &[Alternative] {
        match &self.untagged().kind {
            SchemaKind::Choice(alternatives) => alternatives,
            _ => &[],
        }
    }

    /// Resolve the node of CHOICE alternative `name`
    pub fn alternative(&self, name: &str) -> Option<&SchemaNode> {
        self.alternatives()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.node.as_ref())
    }

    /// Element node of a SEQUENCE OF
    pub fn element(&self) -> Option<&SchemaNode> {
        match &self.untagged().kind {
            SchemaKind::SequenceOf(element) => Some(element.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_range_check() {
        let spec = IntegerSpec::range(0, 2147483647);
        assert!(spec.check_range(0).is_ok());
        assert!(spec.check_range(2147483647).is_ok());
        assert_eq!(
            spec.check_range(-1).unwrap_err(),
            "integer -1 violates constraint [0..2147483647]"
        );
        assert!(spec.check_range(4294967296).is_err());
        assert!(IntegerSpec::new().with_max(10).check_range(i128::MIN).is_ok());
        assert!(IntegerSpec::new().with_max(10).check_range(11).is_err());
    }

    #[test]
    fn test_integer_named_values() {
        let spec = IntegerSpec::new().named("noError", 0).named("tooBig", 1);
        assert!(spec.is_enumerated());
        assert_eq!(spec.symbol(1), Some("tooBig"));
        assert_eq!(spec.value_of("noError"), Some(0));
        assert_eq!(spec.symbol(7), None);
    }

    #[test]
    fn test_bit_count() {
        let spec = BitStringSpec::new().named("a", 0).named("b", 9);
        assert_eq!(spec.bit_count(), 10);
        assert_eq!(BitStringSpec::new().bit_count(), 0);
    }

    #[test]
    fn test_implicit_tag_keeps_inner_form() {
        let inner = Arc::new(SchemaNode::new(SchemaKind::Sequence(Vec::new())));
        let node = SchemaNode::new(SchemaKind::Tagged(TaggedSpec {
            tag: TagOverride {
                class: BerTagClass::Application,
                number: 2,
                mode: TagMode::Implicit,
            },
            inner,
        }));
        assert_eq!(node.tag(), Some(BerTag::application(true, 2)));
        assert!(node.matches_tag(&BerTag::application(true, 2)));
        assert!(!node.matches_tag(&BerTag::application(true, 3)));
    }

    #[test]
    fn test_explicit_tag_is_constructed() {
        let inner = Arc::new(SchemaNode::new(SchemaKind::Integer(IntegerSpec::new())));
        let node = SchemaNode::new(SchemaKind::Tagged(TaggedSpec {
            tag: TagOverride {
                class: BerTagClass::ContextSpecific,
                number: 0,
                mode: TagMode::Explicit,
            },
            inner,
        }));
        assert_eq!(node.tag(), Some(BerTag::context_specific(true, 0)));
        assert_eq!(node.untagged().label(), "INTEGER");
    }

    #[test]
    fn test_string_type_charsets() {
        assert!(StringType::Visible.accepts(b'~'));
        assert!(!StringType::Visible.accepts(b'\n'));
        assert!(StringType::Ia5.accepts(b'\n'));
        assert!(!StringType::Numeric.accepts(b'a'));
    }
}
