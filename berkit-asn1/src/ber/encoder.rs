//! Schema-driven BER encoder
//!
//! # Usage Example
//!
//! ```rust
//! use berkit_asn1::ber::BerEncoder;
//! use berkit_asn1::schema::{self, SequenceBuilder};
//! use berkit_asn1::Value;
//!
//! let node = SequenceBuilder::new("Ping")
//!     .field("id", schema::integer())
//!     .build()
//!     .unwrap();
//! let mut encoder = BerEncoder::new();
//! encoder
//!     .encode(&node, &Value::sequence([("id", Value::Integer(5))]))
//!     .unwrap();
//! assert_eq!(encoder.into_bytes(), vec![0x30, 0x03, 0x02, 0x01, 0x05]);
//! ```

use crate::ber::decoder;
use crate::ber::types::{BerLength, BerTag};
use crate::options::BerOptions;
use crate::schema::{BitStringSpec, IntegerSpec, SchemaKind, SchemaNode, StringType, TagMode};
use crate::value::Value;
use berkit_core::{BerError, BerResult, ObjectIdentifier};
use bytes::{BufMut, BytesMut};
use log::trace;
use std::collections::BTreeSet;

/// BER encoder for ASN.1 structures
///
/// This encoder follows the BER encoding rules as specified in ITU-T X.690,
/// restricted to definite lengths and primitive string encodings. Values are
/// encoded against a [`SchemaNode`]; the schema decides tags and field order.
///
/// # Error Handling
///
/// Encoding either appends one complete TLV to the buffer or fails with
/// `BerError::Encoding` naming the dotted path of the offending value. A
/// failed call leaves the buffer untouched.
pub struct BerEncoder {
    buffer: BytesMut,
    options: BerOptions,
}

impl BerEncoder {
    /// Create a new BER encoder with default options
    pub fn new() -> Self {
        Self::with_options(BerOptions::default())
    }

    pub fn with_options(options: BerOptions) -> Self {
        Self {
            buffer: BytesMut::new(),
            options,
        }
    }

    /// Create a new BER encoder with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            options: BerOptions::default(),
        }
    }

    /// Encode a TLV (Tag-Length-Value) triplet with a definite length
    pub fn encode_tlv(&mut self, tag: &BerTag, value: &[u8]) {
        self.buffer.put_slice(&tlv(tag, value));
    }

    /// Encode `value` as described by `node` and append it to the buffer
    pub fn encode(&mut self, node: &SchemaNode, value: &Value) -> BerResult<()> {
        let encoded = self.encode_node(node, value, &node.label(), 1)?;
        self.buffer.put_slice(&encoded);
        Ok(())
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Clear the encoder buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Complete TLV of `value`
    fn encode_node(
        &self,
        node: &SchemaNode,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> BerResult<Vec<u8>> {
        if depth > self.options.max_depth {
            return Err(BerError::encoding(
                path,
                format!("nesting exceeds max_depth {}", self.options.max_depth),
            ));
        }
        match node.kind() {
            SchemaKind::Choice(alternatives) => {
                let Value::Choice(name, inner) = value else {
                    return Err(mismatch(node, value, path));
                };
                let alternative = alternatives
                    .iter()
                    .find(|a| &a.name == name)
                    .ok_or_else(|| {
                        BerError::encoding(path, format!("unknown alternative '{}'", name))
                    })?;
                trace!("{}: alternative {}", path, name);
                self.encode_node(&alternative.node, inner, &format!("{}.{}", path, name), depth)
            }
            SchemaKind::Any => {
                let Value::Any(bytes) = value else {
                    return Err(mismatch(node, value, path));
                };
                match decoder::element_length(bytes, &self.options) {
                    Ok(length) if length == bytes.len() => Ok(bytes.clone()),
                    _ => Err(BerError::encoding(
                        path,
                        "ANY value must hold exactly one complete TLV",
                    )),
                }
            }
            _ => {
                let (tag, content) = self.encode_parts(node, value, path, depth)?;
                trace!("{}: {} with {} content bytes", path, tag, content.len());
                Ok(tlv(&tag, &content))
            }
        }
    }

    /// Outer tag and content octets of `value`
    fn encode_parts(
        &self,
        node: &SchemaNode,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> BerResult<(BerTag, Vec<u8>)> {
        match node.kind() {
            SchemaKind::Tagged(spec) => match spec.tag.mode {
                TagMode::Implicit => {
                    let (inner_tag, content) = self.encode_parts(&spec.inner, value, path, depth)?;
                    Ok((spec.tag.ber_tag(inner_tag.is_constructed()), content))
                }
                TagMode::Explicit => {
                    let inner = self.encode_node(&spec.inner, value, path, depth + 1)?;
                    Ok((spec.tag.ber_tag(true), inner))
                }
            },
            SchemaKind::Choice(_) | SchemaKind::Any => Err(BerError::Internal(format!(
                "{}: {} has no tag of its own to replace",
                path,
                node.label()
            ))),
            _ => {
                let tag = node.tag().ok_or_else(|| {
                    BerError::Internal(format!("{}: {} has no tag", path, node.label()))
                })?;
                let content = self.encode_content(node, value, path, depth)?;
                Ok((tag, content))
            }
        }
    }

    fn encode_content(
        &self,
        node: &SchemaNode,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> BerResult<Vec<u8>> {
        match (node.kind(), value) {
            (SchemaKind::Boolean, Value::Boolean(b)) => Ok(vec![if *b { 0xFF } else { 0x00 }]),
            (SchemaKind::Integer(spec), Value::Integer(_) | Value::Enumerated(_)) => {
                let number = resolve_integer(spec, value).map_err(|r| BerError::encoding(path, r))?;
                Ok(encode_integer_value(number))
            }
            (SchemaKind::BitString(spec), Value::BitString(bits)) => {
                encode_bit_string(spec, bits).map_err(|r| BerError::encoding(path, r))
            }
            (SchemaKind::OctetString, Value::OctetString(bytes)) => Ok(bytes.clone()),
            (SchemaKind::CharacterString(string_type), Value::String(text)) => {
                encode_character_string(*string_type, text).map_err(|r| BerError::encoding(path, r))
            }
            (SchemaKind::Null, Value::Null) => Ok(Vec::new()),
            (SchemaKind::ObjectIdentifier, Value::ObjectIdentifier(oid)) => {
                encode_oid_content(oid).map_err(|r| BerError::encoding(path, r))
            }
            (SchemaKind::Sequence(_), Value::Sequence(entries)) => {
                self.encode_sequence(node, entries, path, depth)
            }
            (SchemaKind::SequenceOf(element), Value::SequenceOf(items)) => {
                let mut content = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    let encoded =
                        self.encode_node(element, item, &format!("{}[{}]", path, i), depth + 1)?;
                    content.extend_from_slice(&encoded);
                }
                Ok(content)
            }
            _ => Err(mismatch(node, value, path)),
        }
    }

    fn encode_sequence(
        &self,
        node: &SchemaNode,
        entries: &[(String, Value)],
        path: &str,
        depth: usize,
    ) -> BerResult<Vec<u8>> {
        for (i, (name, _)) in entries.iter().enumerate() {
            if node.field(name).is_none() {
                return Err(BerError::encoding(
                    path,
                    format!("{} has no field '{}'", node.label(), name),
                ));
            }
            if entries[..i].iter().any(|(other, _)| other == name) {
                return Err(BerError::encoding(path, format!("field '{}' given twice", name)));
            }
        }

        let mut content = Vec::new();
        for field in node.fields() {
            let field_path = format!("{}.{}", path, field.name);
            match entries.iter().find(|(name, _)| *name == field.name) {
                Some((_, value)) => {
                    if self.options.omit_default_fields && field.default.as_ref() == Some(value) {
                        trace!("{}: equal to its default, omitted", field_path);
                        continue;
                    }
                    let encoded = self.encode_node(&field.node, value, &field_path, depth + 1)?;
                    content.extend_from_slice(&encoded);
                }
                None if field.optional => {}
                None => return Err(BerError::encoding(field_path, "mandatory field is missing")),
            }
        }
        Ok(content)
    }
}

impl Default for BerEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn tlv(tag: &BerTag, value: &[u8]) -> Vec<u8> {
    let mut out = tag.encode();
    out.extend_from_slice(&BerLength::new(value.len()).encode());
    out.extend_from_slice(value);
    out
}

fn mismatch(node: &SchemaNode, value: &Value, path: &str) -> BerError {
    BerError::encoding(
        path,
        format!("expected a {} value, got {}", node.label(), value.type_name()),
    )
}

/// Minimal two's complement, big-endian
///
/// BER requires minimal encoding: 127 is `7F`, 128 is `00 80`, -129 is
/// `FF 7F`.
pub fn encode_integer_value(value: i128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = match bytes[start] {
            0x00 => bytes[start + 1] & 0x80 == 0,
            0xFF => bytes[start + 1] & 0x80 != 0,
            _ => false,
        };
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn resolve_integer(spec: &IntegerSpec, value: &Value) -> Result<i128, String> {
    let number = match value {
        Value::Enumerated(symbol) => spec
            .value_of(symbol)
            .ok_or_else(|| format!("unknown enumeration symbol '{}'", symbol))?,
        Value::Integer(number) if spec.is_enumerated() => {
            return Err(format!(
                "{} given for an enumeration; expected one of its symbols",
                number
            ));
        }
        Value::Integer(number) => *number,
        other => return Err(format!("expected an INTEGER value, got {}", other.type_name())),
    };
    spec.check_range(number)?;
    Ok(number)
}

/// Leading unused-bit count, then the bits, bit 0 first
///
/// The string is as long as the highest declared or set bit requires. A
/// bit without a declared name is given by its decimal index; a declared
/// bit must be given by its name.
fn encode_bit_string(spec: &BitStringSpec, bits: &BTreeSet<String>) -> Result<Vec<u8>, String> {
    let mut count = spec.bit_count();
    let mut set = Vec::with_capacity(bits.len());
    for name in bits {
        let bit = match spec.bit_of(name) {
            Some(bit) => bit,
            None => unnamed_bit(spec, name)?,
        };
        count = count.max(bit.saturating_add(1));
        set.push(bit);
    }
    if count > BitStringSpec::MAX_BITS {
        return Err(format!(
            "BIT STRING of {} bits exceeds {}",
            count,
            BitStringSpec::MAX_BITS
        ));
    }

    let length = count.div_ceil(8) as usize;
    let unused = (length * 8) as u32 - count;
    let mut content = vec![0u8; length + 1];
    content[0] = unused as u8;
    for bit in set {
        content[1 + (bit / 8) as usize] |= 0x80 >> (bit % 8);
    }
    Ok(content)
}

fn unnamed_bit(spec: &BitStringSpec, key: &str) -> Result<u32, String> {
    let bit = key
        .parse::<u32>()
        .ok()
        .filter(|bit| *bit < BitStringSpec::MAX_BITS && bit.to_string() == key)
        .ok_or_else(|| format!("unknown bit '{}'", key))?;
    match spec.name_of(bit) {
        Some(name) => Err(format!("bit {} must be given by its name '{}'", bit, name)),
        None => Ok(bit),
    }
}

fn encode_character_string(string_type: StringType, text: &str) -> Result<Vec<u8>, String> {
    if let Some(c) = text
        .chars()
        .find(|c| !c.is_ascii() || !string_type.accepts(*c as u8))
    {
        return Err(format!("character {:?} not allowed in {}", c, string_type.label()));
    }
    Ok(text.as_bytes().to_vec())
}

/// OBJECT IDENTIFIER content octets
///
/// The first two arcs share one sub-identifier (`40 * X + Y`); every
/// sub-identifier is written in base-128, most significant group first.
pub fn encode_oid_content(oid: &ObjectIdentifier) -> Result<Vec<u8>, String> {
    let [first, second, rest @ ..] = oid.arcs() else {
        return Err("OBJECT IDENTIFIER needs at least two arcs".to_string());
    };
    let head = first
        .checked_mul(40)
        .and_then(|x| x.checked_add(*second))
        .ok_or_else(|| format!("OBJECT IDENTIFIER {} has an oversized second arc", oid))?;

    let mut content = Vec::new();
    push_base128(&mut content, head);
    for arc in rest {
        push_base128(&mut content, *arc);
    }
    Ok(content)
}

fn push_base128(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = [0u8; 10];
    let mut i = groups.len();
    loop {
        i -= 1;
        groups[i] = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    let last = groups.len() - 1;
    for (k, group) in groups.iter().enumerate().skip(i) {
        out.push(if k < last { group | 0x80 } else { *group });
    }
}
