//! Schema-driven BER decoder
//!
//! # Usage Example
//!
//! ```rust
//! use berkit_asn1::ber::BerDecoder;
//! use berkit_asn1::schema;
//! use berkit_asn1::Value;
//!
//! let data = [0x02, 0x02, 0x30, 0x39];
//! let mut decoder = BerDecoder::new(&data);
//! let value = decoder.decode(&schema::integer()).unwrap();
//! assert_eq!(value, Value::Integer(12345));
//! assert!(!decoder.has_remaining());
//! ```

use crate::ber::types::{universal, BerLength, BerTag};
use crate::options::BerOptions;
use crate::schema::{BitStringSpec, IntegerSpec, SchemaKind, SchemaNode, StringType, TagMode};
use crate::value::Value;
use berkit_core::{BerError, BerResult, DecodeErrorKind, ObjectIdentifier};
use log::trace;
use std::collections::BTreeSet;

/// Position of one TLV inside the decoder's buffer
///
/// All offsets are absolute. For indefinite-length encodings `content_end`
/// points at the end-of-contents marker and `end` just past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub tag: BerTag,
    pub offset: usize,
    pub content_start: usize,
    pub content_end: usize,
    pub end: usize,
}

/// BER decoder for ASN.1 structures
///
/// This decoder follows the BER decoding rules as specified in ITU-T X.690.
/// It reads TLV (Tag-Length-Value) triplets from a byte buffer and interprets
/// them against a [`SchemaNode`].
///
/// # Position Tracking
///
/// The decoder maintains a position pointer that advances as values are
/// decoded, and a limit marking the end of the content window it may read.
/// Nested content is read through child decoders sharing the same buffer, so
/// every reported offset is absolute.
///
/// # Error Handling
///
/// Input that stops before a TLV is complete is reported as
/// `DecodeErrorKind::Truncated` only when the end of the whole buffer was
/// hit. Running past the end of an enclosing definite length is
/// `DecodeErrorKind::InvalidLength`: more data would not help.
pub struct BerDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
    limit: usize,
    /// Whether `limit` comes from an enclosing length rather than the buffer end
    bounded: bool,
    options: BerOptions,
}

impl<'a> BerDecoder<'a> {
    /// Create a new BER decoder with default options
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_options(buffer, BerOptions::default())
    }

    pub fn with_options(buffer: &'a [u8], options: BerOptions) -> Self {
        Self {
            buffer,
            position: 0,
            limit: buffer.len(),
            bounded: false,
            options,
        }
    }

    /// Get current position in buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.position)
    }

    /// Check if there is more data to decode
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Decode one value described by `node`
    pub fn decode(&mut self, node: &SchemaNode) -> BerResult<Value> {
        self.decode_node(node, 1)
    }

    /// Read the next TLV without interpreting it
    pub fn decode_tlv(&mut self) -> BerResult<(BerTag, &'a [u8], usize)> {
        let element = self.element_at(self.position, 1)?;
        self.position = element.end;
        let content = &self.buffer[element.content_start..element.content_end];
        Ok((element.tag, content, element.end - element.offset))
    }

    /// Tag of the next element, `None` at the end of the content window
    pub fn peek_tag(&self) -> BerResult<Option<BerTag>> {
        if !self.has_remaining() {
            return Ok(None);
        }
        let (tag, _) = BerTag::decode(&self.buffer[self.position..self.limit])
            .map_err(|kind| self.header_error(self.position, kind))?;
        Ok(Some(tag))
    }

    /// Fail unless the content window has been consumed completely
    pub fn expect_end(&self, label: &str) -> BerResult<()> {
        match self.peek_tag()? {
            None => Ok(()),
            Some(tag) => Err(BerError::decoding(
                self.position,
                DecodeErrorKind::UnexpectedTag {
                    expected: format!("end of {}", label),
                    found: tag.to_string(),
                },
            )),
        }
    }

    /// Locate the TLV starting at `at`
    ///
    /// Indefinite lengths are resolved by walking the nested TLVs up to the
    /// matching end-of-contents marker.
    fn element_at(&self, at: usize, depth: usize) -> BerResult<Element> {
        if depth > self.options.max_depth {
            return Err(BerError::decoding(
                at,
                DecodeErrorKind::DepthExceeded(self.options.max_depth),
            ));
        }
        let (tag, tag_len) = BerTag::decode(&self.buffer[at..self.limit])
            .map_err(|kind| self.header_error(at, kind))?;
        let length_at = at + tag_len;
        let (length, length_len) = BerLength::decode(&self.buffer[length_at..self.limit])
            .map_err(|kind| self.header_error(length_at, kind))?;
        let content_start = length_at + length_len;

        if let Some(length) = length.value() {
            let available = self.limit - content_start;
            if length > available {
                let needed = length.saturating_add(content_start - at);
                return Err(self.overrun(at, needed, self.limit - at));
            }
            return Ok(Element {
                tag,
                offset: at,
                content_start,
                content_end: content_start + length,
                end: content_start + length,
            });
        }

        if !tag.is_constructed() {
            return Err(BerError::decoding(
                length_at,
                DecodeErrorKind::InvalidLength("indefinite length on a primitive encoding".to_string()),
            ));
        }
        if !self.options.allow_indefinite_length {
            return Err(BerError::decoding(
                length_at,
                DecodeErrorKind::InvalidLength("indefinite length not allowed".to_string()),
            ));
        }

        let mut cursor = content_start;
        loop {
            if self.limit - cursor < 2 {
                return Err(self.overrun(cursor, 2, self.limit - cursor));
            }
            if self.buffer[cursor] as u32 == universal::END_OF_CONTENTS {
                if self.buffer[cursor + 1] != 0x00 {
                    return Err(BerError::decoding(
                        cursor,
                        DecodeErrorKind::InvalidLength("malformed end-of-contents marker".to_string()),
                    ));
                }
                return Ok(Element {
                    tag,
                    offset: at,
                    content_start,
                    content_end: cursor,
                    end: cursor + 2,
                });
            }
            cursor = self.element_at(cursor, depth + 1)?.end;
        }
    }

    fn header_error(&self, at: usize, kind: DecodeErrorKind) -> BerError {
        match kind {
            DecodeErrorKind::Truncated { needed, available } => self.overrun(at, needed, available),
            kind => BerError::decoding(at, kind),
        }
    }

    fn overrun(&self, at: usize, needed: usize, available: usize) -> BerError {
        if self.bounded {
            BerError::decoding(
                at,
                DecodeErrorKind::InvalidLength(format!(
                    "element needs {} bytes but its enclosing content has {}",
                    needed, available
                )),
            )
        } else {
            BerError::decoding(at, DecodeErrorKind::Truncated { needed, available })
        }
    }

    /// Decoder over the content octets of `element`
    fn child(&self, element: &Element) -> BerDecoder<'a> {
        BerDecoder {
            buffer: self.buffer,
            position: element.content_start,
            limit: element.content_end,
            bounded: true,
            options: self.options,
        }
    }

    fn decode_node(&mut self, node: &SchemaNode, depth: usize) -> BerResult<Value> {
        match node.kind() {
            SchemaKind::Choice(alternatives) => {
                let at = self.position;
                let tag = self
                    .peek_tag()?
                    .ok_or_else(|| self.overrun(at, 1, 0))?;
                let alternative = alternatives
                    .iter()
                    .find(|a| a.node.matches_tag(&tag))
                    .ok_or_else(|| {
                        BerError::decoding(
                            at,
                            DecodeErrorKind::UnknownAlternative(format!("{} in {}", tag, node.label())),
                        )
                    })?;
                trace!("offset {}: {} alternative {}", at, node.label(), alternative.name);
                let value = self.decode_node(&alternative.node, depth)?;
                Ok(Value::Choice(alternative.name.clone(), Box::new(value)))
            }
            SchemaKind::Any => {
                let element = self.element_at(self.position, depth)?;
                self.position = element.end;
                Ok(Value::Any(self.buffer[element.offset..element.end].to_vec()))
            }
            _ => {
                let element = self.element_at(self.position, depth)?;
                if !node.matches_tag(&element.tag) {
                    return Err(BerError::decoding(
                        element.offset,
                        DecodeErrorKind::UnexpectedTag {
                            expected: node.expected_tags(),
                            found: element.tag.to_string(),
                        },
                    ));
                }
                trace!("offset {}: {} {}", element.offset, node.label(), element.tag);
                let value = self.decode_element(node, &element, depth)?;
                self.position = element.end;
                Ok(value)
            }
        }
    }

    /// Interpret an element whose tag already matched `node`
    fn decode_element(&self, node: &SchemaNode, element: &Element, depth: usize) -> BerResult<Value> {
        match node.kind() {
            SchemaKind::Tagged(spec) => match spec.tag.mode {
                TagMode::Implicit => self.decode_element(&spec.inner, element, depth),
                TagMode::Explicit => {
                    if !element.tag.is_constructed() {
                        return Err(invalid_content(
                            element.offset,
                            format!("{} must be constructed", spec.tag),
                        ));
                    }
                    let mut inner = self.child(element);
                    let value = inner.decode_node(&spec.inner, depth + 1)?;
                    inner.expect_end(&node.label())?;
                    Ok(value)
                }
            },
            _ => self.decode_content(node, element, depth),
        }
    }

    fn decode_content(&self, node: &SchemaNode, element: &Element, depth: usize) -> BerResult<Value> {
        let content = &self.buffer[element.content_start..element.content_end];
        let at = element.content_start;
        let primitive = || {
            if element.tag.is_constructed() {
                Err(invalid_content(
                    element.offset,
                    format!("{} must use the primitive form", node.label()),
                ))
            } else {
                Ok(())
            }
        };

        match node.kind() {
            SchemaKind::Boolean => {
                primitive()?;
                match content {
                    [byte] => Ok(Value::Boolean(*byte != 0)),
                    _ => Err(invalid_length(at, "BOOLEAN content must be one byte")),
                }
            }
            SchemaKind::Integer(spec) => {
                primitive()?;
                let number =
                    decode_integer_value(content).map_err(|kind| BerError::decoding(at, kind))?;
                integer_value(spec, number).map_err(|kind| BerError::decoding(at, kind))
            }
            SchemaKind::BitString(spec) => {
                primitive()?;
                decode_bit_string(spec, content)
                    .map(Value::BitString)
                    .map_err(|reason| invalid_content(at, reason))
            }
            SchemaKind::OctetString => Ok(Value::OctetString(self.collect_string(node, element, depth)?)),
            SchemaKind::CharacterString(string_type) => {
                let bytes = self.collect_string(node, element, depth)?;
                decode_character_string(*string_type, bytes)
                    .map(Value::String)
                    .map_err(|reason| invalid_content(at, reason))
            }
            SchemaKind::Null => {
                primitive()?;
                if content.is_empty() {
                    Ok(Value::Null)
                } else {
                    Err(invalid_length(at, "NULL content must be empty"))
                }
            }
            SchemaKind::ObjectIdentifier => {
                primitive()?;
                decode_oid_content(content)
                    .map(Value::ObjectIdentifier)
                    .map_err(|reason| invalid_content(at, reason))
            }
            SchemaKind::Sequence(_) => {
                self.constructed(node, element)?;
                let mut fields = self.child(element);
                let entries = fields.decode_fields(node, depth + 1)?;
                Ok(Value::Sequence(entries))
            }
            SchemaKind::SequenceOf(item) => {
                self.constructed(node, element)?;
                let mut items = self.child(element);
                let mut values = Vec::new();
                while items.has_remaining() {
                    values.push(items.decode_node(item, depth + 1)?);
                }
                Ok(Value::SequenceOf(values))
            }
            SchemaKind::Tagged(_) | SchemaKind::Choice(_) | SchemaKind::Any => Err(BerError::Internal(
                format!("{} reached content decoding", node.label()),
            )),
        }
    }

    fn constructed(&self, node: &SchemaNode, element: &Element) -> BerResult<()> {
        if element.tag.is_constructed() {
            Ok(())
        } else {
            Err(invalid_content(
                element.offset,
                format!("{} must use the constructed form", node.label()),
            ))
        }
    }

    /// SEQUENCE fields in declaration order
    ///
    /// Absent optional fields are skipped, or filled with their default.
    fn decode_fields(&mut self, node: &SchemaNode, depth: usize) -> BerResult<Vec<(String, Value)>> {
        let mut entries = Vec::with_capacity(node.fields().len());
        for field in node.fields() {
            let next = self.peek_tag()?;
            if next.is_some_and(|tag| field.node.matches_tag(&tag)) {
                let value = self.decode_node(&field.node, depth)?;
                entries.push((field.name.clone(), value));
                continue;
            }
            if let Some(default) = &field.default {
                trace!("{}.{} absent, using default", node.label(), field.name);
                entries.push((field.name.clone(), default.clone()));
                continue;
            }
            if field.optional {
                continue;
            }
            let kind = match next {
                Some(tag) => DecodeErrorKind::UnexpectedTag {
                    expected: format!("{} for field '{}'", field.node.expected_tags(), field.name),
                    found: tag.to_string(),
                },
                None => DecodeErrorKind::MissingField(format!("{}.{}", node.label(), field.name)),
            };
            return Err(BerError::decoding(self.position, kind));
        }
        self.expect_end(&node.label())?;
        Ok(entries)
    }

    /// Content of a string type, joining the segments of a constructed encoding
    fn collect_string(&self, node: &SchemaNode, element: &Element, depth: usize) -> BerResult<Vec<u8>> {
        if !element.tag.is_constructed() {
            return Ok(self.buffer[element.content_start..element.content_end].to_vec());
        }
        let segment_tag = node.tag().ok_or_else(|| {
            BerError::Internal(format!("{} has no universal tag", node.label()))
        })?;
        let mut segments = self.child(element);
        let mut bytes = Vec::new();
        while segments.has_remaining() {
            let segment = segments.element_at(segments.position, depth + 1)?;
            if !segment_tag.matches(&segment.tag) {
                return Err(BerError::decoding(
                    segment.offset,
                    DecodeErrorKind::UnexpectedTag {
                        expected: format!("{} segment", node.label()),
                        found: segment.tag.to_string(),
                    },
                ));
            }
            bytes.extend(segments.collect_string(node, &segment, depth + 1)?);
            segments.position = segment.end;
        }
        Ok(bytes)
    }
}

/// Total length of the TLV at the start of `data`, header included
pub fn element_length(data: &[u8], options: &BerOptions) -> BerResult<usize> {
    let decoder = BerDecoder::with_options(data, *options);
    Ok(decoder.element_at(0, 1)?.end)
}

fn invalid_content(offset: usize, reason: impl Into<String>) -> BerError {
    BerError::decoding(offset, DecodeErrorKind::InvalidContent(reason.into()))
}

fn invalid_length(offset: usize, reason: impl Into<String>) -> BerError {
    BerError::decoding(offset, DecodeErrorKind::InvalidLength(reason.into()))
}

/// Two's complement, big-endian, up to 16 bytes
pub fn decode_integer_value(bytes: &[u8]) -> Result<i128, DecodeErrorKind> {
    let Some(first) = bytes.first() else {
        return Err(DecodeErrorKind::InvalidContent("empty INTEGER".to_string()));
    };
    if bytes.len() > 16 {
        return Err(DecodeErrorKind::InvalidContent(format!(
            "INTEGER of {} bytes does not fit in 128 bits",
            bytes.len()
        )));
    }
    let mut value: i128 = if first & 0x80 != 0 { -1 } else { 0 };
    for &byte in bytes {
        value = (value << 8) | byte as i128;
    }
    Ok(value)
}

fn integer_value(spec: &IntegerSpec, number: i128) -> Result<Value, DecodeErrorKind> {
    spec.check_range(number).map_err(DecodeErrorKind::InvalidContent)?;
    if !spec.is_enumerated() {
        return Ok(Value::Integer(number));
    }
    spec.symbol(number)
        .map(|symbol| Value::Enumerated(symbol.to_string()))
        .ok_or(DecodeErrorKind::UnknownEnumValue(number))
}

/// The bits that are set, keyed by their declared name, or by their
/// decimal index when none is declared
fn decode_bit_string(spec: &BitStringSpec, content: &[u8]) -> Result<BTreeSet<String>, String> {
    let Some((&unused, bytes)) = content.split_first() else {
        return Err("BIT STRING without unused-bits octet".to_string());
    };
    if unused > 7 || (bytes.is_empty() && unused != 0) {
        return Err(format!("invalid unused-bits count {}", unused));
    }
    let wire_bits = bytes.len() as u64 * 8 - unused as u64;
    if wire_bits > BitStringSpec::MAX_BITS as u64 {
        return Err(format!(
            "BIT STRING of {} bits exceeds {}",
            wire_bits,
            BitStringSpec::MAX_BITS
        ));
    }

    let mut bits = BTreeSet::new();
    for bit in 0..wire_bits as u32 {
        if bytes[(bit / 8) as usize] & (0x80 >> (bit % 8)) != 0 {
            bits.insert(spec.name_of(bit).map_or_else(|| bit.to_string(), str::to_string));
        }
    }
    Ok(bits)
}

fn decode_character_string(string_type: StringType, bytes: Vec<u8>) -> Result<String, String> {
    if let Some(byte) = bytes.iter().find(|b| !string_type.accepts(**b)) {
        return Err(format!("byte 0x{:02X} not allowed in {}", byte, string_type.label()));
    }
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// OBJECT IDENTIFIER from its content octets
pub fn decode_oid_content(content: &[u8]) -> Result<ObjectIdentifier, String> {
    let mut sub_ids = Vec::new();
    let mut current = 0u64;
    let mut pending = false;
    for &byte in content {
        if !pending && byte == 0x80 {
            return Err("sub-identifier with a leading 0x80 byte".to_string());
        }
        if current > u64::MAX >> 7 {
            return Err("sub-identifier does not fit in 64 bits".to_string());
        }
        current = (current << 7) | (byte & 0x7F) as u64;
        pending = byte & 0x80 != 0;
        if !pending {
            sub_ids.push(current);
            current = 0;
        }
    }
    if pending {
        return Err("last sub-identifier is incomplete".to_string());
    }
    let Some((&head, rest)) = sub_ids.split_first() else {
        return Err("empty OBJECT IDENTIFIER".to_string());
    };

    let (first, second) = match head {
        0..40 => (0, head),
        40..80 => (1, head - 40),
        _ => (2, head - 80),
    };
    let mut arcs = Vec::with_capacity(sub_ids.len() + 1);
    arcs.push(first);
    arcs.push(second);
    arcs.extend_from_slice(rest);
    ObjectIdentifier::new(arcs).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    fn decode(node: &SchemaNode, data: &[u8]) -> BerResult<Value> {
        BerDecoder::new(data).decode(node)
    }

    fn kind(err: BerError) -> (usize, DecodeErrorKind) {
        match err {
            BerError::Decoding { offset, kind } => (offset, kind),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_integer_value() {
        assert_eq!(decode_integer_value(&[0x00]), Ok(0));
        assert_eq!(decode_integer_value(&[0x7F]), Ok(127));
        assert_eq!(decode_integer_value(&[0x00, 0x80]), Ok(128));
        assert_eq!(decode_integer_value(&[0xFF, 0x7F]), Ok(-129));
        assert_eq!(decode_integer_value(&[0x80]), Ok(-128));
        assert!(decode_integer_value(&[]).is_err());
        assert!(decode_integer_value(&[0x01; 17]).is_err());
    }

    #[test]
    fn test_decode_tlv() {
        let data = [0x04, 0x02, 0xAB, 0xCD, 0x05, 0x00];
        let mut decoder = BerDecoder::new(&data);
        let (tag, content, consumed) = decoder.decode_tlv().unwrap();
        assert_eq!(tag, BerTag::universal(false, 4));
        assert_eq!(content, &[0xAB, 0xCD]);
        assert_eq!(consumed, 4);
        assert_eq!(decoder.position(), 4);
        assert_eq!(decoder.remaining(), 2);
    }

    #[test]
    fn test_decode_oid() {
        let data = [0x06, 0x06, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D];
        let value = decode(&object_identifier(), &data).unwrap();
        assert_eq!(
            value,
            Value::ObjectIdentifier(ObjectIdentifier::from_string("1.2.840.113549").unwrap())
        );

        let value = decode(&object_identifier(), &[0x06, 0x03, 0x88, 0x37, 0x03]).unwrap();
        assert_eq!(value, Value::ObjectIdentifier(ObjectIdentifier::from_string("2.999.3").unwrap()));

        assert!(decode_oid_content(&[0x2A, 0x86]).is_err());
        assert!(decode_oid_content(&[0x80, 0x01]).is_err());
    }

    #[test]
    fn test_decode_unexpected_tag() {
        let (offset, kind) = kind(decode(&integer(), &[0x04, 0x01, 0x00]).unwrap_err());
        assert_eq!(offset, 0);
        assert!(matches!(kind, DecodeErrorKind::UnexpectedTag { .. }));
    }

    #[test]
    fn test_truncated_versus_invalid_length() {
        let (_, kind) = kind(decode(&octet_string(), &[0x04, 0x05, 0x01]).unwrap_err());
        assert_eq!(kind, DecodeErrorKind::Truncated { needed: 7, available: 3 });

        // inner OCTET STRING claims more than the SEQUENCE holds
        let node = SequenceBuilder::new("S").field("a", octet_string()).build().unwrap();
        let data = [0x30, 0x03, 0x04, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05];
        let (offset, kind) = self::kind(decode(&node, &data).unwrap_err());
        assert_eq!(offset, 2);
        assert!(matches!(kind, DecodeErrorKind::InvalidLength(_)));
    }

    #[test]
    fn test_decode_enumerated() {
        let node = enumerated(&[("noError", 0), ("tooBig", 1)]);
        assert_eq!(
            decode(&node, &[0x02, 0x01, 0x01]).unwrap(),
            Value::Enumerated("tooBig".to_string())
        );
        let (_, kind) = kind(decode(&node, &[0x02, 0x01, 0x09]).unwrap_err());
        assert_eq!(kind, DecodeErrorKind::UnknownEnumValue(9));
    }

    #[test]
    fn test_decode_range_violation() {
        let (offset, kind) = kind(decode(&integer_range(0, 10), &[0x02, 0x01, 0xFF]).unwrap_err());
        assert_eq!(offset, 2);
        assert!(matches!(kind, DecodeErrorKind::InvalidContent(_)));
    }

    #[test]
    fn test_decode_sequence_with_optional_and_default() {
        let node = SequenceBuilder::new("S")
            .optional("tag", context(0, integer()))
            .with_default("version", integer(), Value::Integer(3))
            .field("body", octet_string())
            .build()
            .unwrap();
        let value = decode(&node, &[0x30, 0x03, 0x04, 0x01, 0xAB]).unwrap();
        assert_eq!(
            value,
            Value::sequence([
                ("version", Value::Integer(3)),
                ("body", Value::octets([0xAB])),
            ])
        );
    }

    #[test]
    fn test_decode_sequence_missing_and_trailing() {
        let node = SequenceBuilder::new("S")
            .field("a", integer())
            .field("b", integer())
            .build()
            .unwrap();
        let (offset, kind) = kind(decode(&node, &[0x30, 0x03, 0x02, 0x01, 0x01]).unwrap_err());
        assert_eq!(offset, 5);
        assert_eq!(kind, DecodeErrorKind::MissingField("S.b".to_string()));

        let data = [0x30, 0x09, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02, 0x05, 0x00, 0x00];
        let err = decode(&node, &data).unwrap_err();
        assert!(matches!(
            self::kind(err),
            (8, DecodeErrorKind::UnexpectedTag { .. })
        ));
    }

    #[test]
    fn test_decode_choice() {
        let node = ChoiceBuilder::named("Payload")
            .alternative("text", octet_string())
            .alternative("empty", null())
            .build()
            .unwrap();
        assert_eq!(
            decode(&node, &[0x05, 0x00]).unwrap(),
            Value::choice("empty", Value::Null)
        );
        let (_, kind) = kind(decode(&node, &[0x02, 0x01, 0x00]).unwrap_err());
        assert!(matches!(kind, DecodeErrorKind::UnknownAlternative(_)));
    }

    #[test]
    fn test_decode_indefinite_length() {
        let node = SequenceBuilder::new("S")
            .field("a", integer())
            .field("b", sequence_of(integer()))
            .build()
            .unwrap();
        let data = [
            0x30, 0x80, 0x02, 0x01, 0x07, 0x30, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut decoder = BerDecoder::new(&data);
        let value = decoder.decode(&node).unwrap();
        assert_eq!(decoder.position(), data.len());
        assert_eq!(
            value,
            Value::sequence([
                ("a", Value::Integer(7)),
                ("b", Value::SequenceOf(vec![Value::Integer(1)])),
            ])
        );

        let options = BerOptions::default().with_indefinite_length(false);
        let err = BerDecoder::with_options(&data, options).decode(&node).unwrap_err();
        assert!(matches!(kind(err), (1, DecodeErrorKind::InvalidLength(_))));

        // missing end-of-contents with the buffer exhausted
        let err = decode(&node, &data[..12]).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_primitive_indefinite_rejected() {
        let err = decode(&octet_string(), &[0x04, 0x80, 0x00, 0x00]).unwrap_err();
        assert!(matches!(kind(err), (1, DecodeErrorKind::InvalidLength(_))));
    }

    #[test]
    fn test_decode_segmented_octet_string() {
        let data = [0x24, 0x08, 0x04, 0x02, b'h', b'e', 0x04, 0x02, b'l', b'o'];
        assert_eq!(decode(&octet_string(), &data).unwrap(), Value::octets(b"helo"));

        let data = [0x3A, 0x80, 0x1A, 0x01, b'o', 0x1A, 0x01, b'k', 0x00, 0x00];
        assert_eq!(
            decode(&visible_string(), &data).unwrap(),
            Value::String("ok".to_string())
        );
    }

    #[test]
    fn test_decode_bit_string() {
        let node = named_bits(&[("a", 0), ("b", 3), ("c", 9)]);
        let value = decode(&node, &[0x03, 0x02, 0x04, 0x90]).unwrap();
        let Value::BitString(bits) = value else {
            panic!("expected BIT STRING");
        };
        assert!(bits.contains("a"));
        assert!(bits.contains("b"));
        assert_eq!(bits.len(), 2);

        let value = decode(&node, &[0x03, 0x03, 0x03, 0x00, 0x08]).unwrap();
        assert_eq!(value, Value::BitString(BTreeSet::from(["12".to_string()])));

        let err = decode(&node, &[0x23, 0x03, 0x03, 0x01, 0x00]).unwrap_err();
        assert!(matches!(kind(err), (0, DecodeErrorKind::InvalidContent(_))));
        assert!(decode(&node, &[0x03, 0x01, 0x03]).is_err());
    }

    #[test]
    fn test_decode_bit_string_limit() {
        let mut data = vec![0x03, 0x82, 0x20, 0x01, 0x00];
        data.resize(data.len() + 8192, 0);
        *data.last_mut().unwrap() = 0x01;
        let value = decode(&bit_string(), &data).unwrap();
        assert_eq!(value, Value::BitString(BTreeSet::from(["65535".to_string()])));
        assert_eq!(crate::ber::encode(&bit_string(), &value).unwrap(), data);

        // one content byte more than the limit allows
        let mut data = vec![0x03, 0x82, 0x20, 0x02, 0x00];
        data.resize(data.len() + 8193, 0xFF);
        let err = decode(&bit_string(), &data).unwrap_err();
        assert!(matches!(kind(err), (_, DecodeErrorKind::InvalidContent(_))));
    }

    #[test]
    fn test_decode_character_string_charset() {
        let err = decode(&visible_string(), &[0x1A, 0x01, 0x0A]).unwrap_err();
        assert!(matches!(kind(err), (2, DecodeErrorKind::InvalidContent(_))));
    }

    #[test]
    fn test_decode_any_keeps_tlv() {
        let node = SequenceBuilder::new("S")
            .field("n", integer())
            .optional("rest", any())
            .build()
            .unwrap();
        let data = [0x30, 0x07, 0x02, 0x01, 0x01, 0xA3, 0x02, 0x05, 0x00];
        let value = decode(&node, &data).unwrap();
        assert_eq!(value.field("rest"), Some(&Value::Any(vec![0xA3, 0x02, 0x05, 0x00])));
    }

    #[test]
    fn test_depth_exceeded() {
        let node = sequence_of(sequence_of(integer()));
        let data = [0x30, 0x05, 0x30, 0x03, 0x02, 0x01, 0x01];
        let options = BerOptions::default().with_max_depth(2);
        let err = BerDecoder::with_options(&data, options).decode(&node).unwrap_err();
        assert_eq!(kind(err), (4, DecodeErrorKind::DepthExceeded(2)));
    }

    #[test]
    fn test_element_length() {
        let options = BerOptions::default();
        assert_eq!(element_length(&[0x05, 0x00, 0xFF], &options), Ok(2));
        assert_eq!(element_length(&[0x30, 0x80, 0x05, 0x00, 0x00, 0x00], &options), Ok(6));
        assert!(element_length(&[0x30, 0x80, 0x05, 0x00], &options).unwrap_err().is_truncated());
    }
}
