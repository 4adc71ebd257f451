//! Conversion between decoded [`Value`] trees and user [`Message`]s
//!
//! Towards the user the mapping is schema-free. The way back needs the
//! schema, because a `Message::Str` may stand for an OBJECT IDENTIFIER, an
//! enumeration symbol or a character string.

use crate::message::Message;
use berkit_asn1::schema::{SchemaKind, SchemaNode};
use berkit_asn1::Value;
use berkit_core::{BerError, BerResult, ObjectIdentifier};
use std::collections::{BTreeMap, BTreeSet};

/// Native value to user message
///
/// | Value                              | Message          |
/// |------------------------------------|------------------|
/// | SEQUENCE                           | `Map`            |
/// | SEQUENCE OF                        | `List`           |
/// | CHOICE                             | `Choice`         |
/// | BIT STRING (set bits)              | `Map` of `Bool`  |
/// | OBJECT IDENTIFIER                  | dotted `Str`     |
/// | enumeration symbol, string types   | `Str`            |
/// | OCTET STRING, ANY                  | `Bytes`          |
///
/// # Error Handling
/// A SEQUENCE carrying the same field twice cannot come out of the decoder;
/// it is reported as `BerError::Internal`.
pub fn to_message(value: &Value) -> BerResult<Message> {
    Ok(match value {
        Value::Null => Message::Null,
        Value::Boolean(b) => Message::Bool(*b),
        Value::Integer(v) => Message::Int(*v),
        Value::Enumerated(symbol) => Message::Str(symbol.clone()),
        Value::OctetString(bytes) | Value::Any(bytes) => Message::Bytes(bytes.clone()),
        Value::BitString(bits) => Message::Map(
            bits.iter()
                .map(|name| (name.clone(), Message::Bool(true)))
                .collect(),
        ),
        Value::String(text) => Message::Str(text.clone()),
        Value::ObjectIdentifier(oid) => Message::Str(oid.to_string()),
        Value::Sequence(entries) => {
            let mut map = BTreeMap::new();
            for (name, entry) in entries {
                if map.insert(name.clone(), to_message(entry)?).is_some() {
                    return Err(BerError::Internal(format!(
                        "decoded SEQUENCE holds field '{}' twice",
                        name
                    )));
                }
            }
            Message::Map(map)
        }
        Value::SequenceOf(items) => {
            Message::List(items.iter().map(to_message).collect::<BerResult<_>>()?)
        }
        Value::Choice(name, inner) => Message::Choice(name.clone(), Box::new(to_message(inner)?)),
    })
}

/// User message to native value, guided by `node`
///
/// # Error Handling
/// Returns `BerError::Encoding`, with the dotted path of the offending part,
/// when the message does not have the shape `node` describes.
pub fn to_value(node: &SchemaNode, message: &Message) -> BerResult<Value> {
    convert(node, message, &node.label())
}

fn convert(node: &SchemaNode, message: &Message, path: &str) -> BerResult<Value> {
    match (node.kind(), message) {
        (SchemaKind::Tagged(spec), _) => convert(&spec.inner, message, path),
        (SchemaKind::Boolean, Message::Bool(b)) => Ok(Value::Boolean(*b)),
        (SchemaKind::Integer(spec), Message::Int(v)) if spec.is_enumerated() => spec
            .symbol(*v)
            .map(|symbol| Value::Enumerated(symbol.to_string()))
            .ok_or_else(|| {
                BerError::encoding(path, format!("{} is not a declared enumeration value", v))
            }),
        (SchemaKind::Integer(_), Message::Int(v)) => Ok(Value::Integer(*v)),
        (SchemaKind::Integer(spec), Message::Str(symbol)) if spec.is_enumerated() => {
            Ok(Value::Enumerated(symbol.clone()))
        }
        (SchemaKind::BitString(_), Message::Map(bits)) => {
            // cleared bits are dropped; only set bits reach the value
            let mut converted = BTreeSet::new();
            for (name, bit) in bits {
                let Message::Bool(on) = bit else {
                    return Err(BerError::encoding(
                        format!("{}.{}", path, name),
                        format!("expected bool, got {}", bit.type_name()),
                    ));
                };
                if *on {
                    converted.insert(name.clone());
                }
            }
            Ok(Value::BitString(converted))
        }
        (SchemaKind::OctetString, Message::Bytes(bytes)) => Ok(Value::OctetString(bytes.clone())),
        (SchemaKind::OctetString, Message::Str(text)) => {
            Ok(Value::OctetString(text.as_bytes().to_vec()))
        }
        (SchemaKind::CharacterString(_), Message::Str(text)) => Ok(Value::String(text.clone())),
        (SchemaKind::Null, Message::Null) => Ok(Value::Null),
        (SchemaKind::ObjectIdentifier, Message::Str(dotted)) => ObjectIdentifier::from_string(dotted)
            .map(Value::ObjectIdentifier)
            .map_err(|e| BerError::encoding(path, e.to_string())),
        (SchemaKind::Sequence(fields), Message::Map(entries)) => {
            if let Some(unknown) = entries.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
                return Err(BerError::encoding(
                    path,
                    format!("{} has no field '{}'", node.label(), unknown),
                ));
            }
            let mut converted = Vec::with_capacity(entries.len());
            for field in fields {
                if let Some(entry) = entries.get(&field.name) {
                    let value = convert(&field.node, entry, &format!("{}.{}", path, field.name))?;
                    converted.push((field.name.clone(), value));
                }
            }
            Ok(Value::Sequence(converted))
        }
        (SchemaKind::SequenceOf(element), Message::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| convert(element, item, &format!("{}[{}]", path, i)))
            .collect::<BerResult<Vec<_>>>()
            .map(Value::SequenceOf),
        (SchemaKind::Choice(_), Message::Choice(name, inner)) => {
            let alternative = node.alternative(name).ok_or_else(|| {
                BerError::encoding(path, format!("unknown alternative '{}'", name))
            })?;
            let value = convert(alternative, inner, &format!("{}.{}", path, name))?;
            Ok(Value::Choice(name.clone(), Box::new(value)))
        }
        (SchemaKind::Any, Message::Bytes(bytes)) => Ok(Value::Any(bytes.clone())),
        _ => Err(BerError::encoding(
            path,
            format!("expected a {} value, got {}", node.label(), message.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berkit_asn1::schema::{self, ChoiceBuilder, SequenceBuilder};

    fn message_schema() -> SchemaNode {
        let payload = ChoiceBuilder::new()
            .alternative("text", schema::octet_string())
            .alternative("empty", schema::null())
            .build()
            .unwrap();
        SequenceBuilder::new("Message")
            .field("id", schema::integer())
            .field("oid", schema::object_identifier())
            .field("status", schema::enumerated(&[("ok", 0), ("failed", 1)]))
            .field("payload", payload)
            .build()
            .unwrap()
    }

    #[test]
    fn test_to_value_resolves_strings_by_schema() {
        let message = Message::map([
            ("id", Message::Int(3)),
            ("oid", Message::from("1.3.6.1")),
            ("status", Message::from("failed")),
            ("payload", Message::choice("empty", Message::Null)),
        ]);
        let value = to_value(&message_schema(), &message).unwrap();
        assert_eq!(
            value,
            Value::sequence([
                ("id", Value::Integer(3)),
                (
                    "oid",
                    Value::ObjectIdentifier(ObjectIdentifier::from_string("1.3.6.1").unwrap())
                ),
                ("status", Value::Enumerated("failed".to_string())),
                ("payload", Value::choice("empty", Value::Null)),
            ])
        );
        assert_eq!(to_message(&value).unwrap(), message);
    }

    #[test]
    fn test_to_value_shape_mismatch_path() {
        let message = Message::map([
            ("id", Message::from("three")),
            ("oid", Message::from("1.3")),
            ("status", Message::Int(0)),
            ("payload", Message::choice("empty", Message::Null)),
        ]);
        match to_value(&message_schema(), &message).unwrap_err() {
            BerError::Encoding { path, .. } => assert_eq!(path, "Message.id"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_to_value_unknown_alternative_and_field() {
        let message = Message::map([("payload", Message::choice("C", Message::Null))]);
        assert!(matches!(
            to_value(&message_schema(), &message),
            Err(BerError::Encoding { .. })
        ));
        let message = Message::map([("bogus", Message::Null)]);
        assert!(matches!(
            to_value(&message_schema(), &message),
            Err(BerError::Encoding { .. })
        ));
    }

    #[test]
    fn test_to_message_duplicate_field_is_internal() {
        let value = Value::sequence([("a", Value::Null), ("a", Value::Null)]);
        assert!(matches!(to_message(&value), Err(BerError::Internal(_))));
    }

    #[test]
    fn test_bit_string_mapping() {
        let node = schema::named_bits(&[("a", 0), ("b", 1)]);
        let message = Message::map([("a", Message::Bool(true)), ("b", Message::Bool(false))]);
        let value = to_value(&node, &message).unwrap();
        assert_eq!(value, Value::BitString(BTreeSet::from(["a".to_string()])));
        assert_eq!(
            to_message(&value).unwrap(),
            Message::map([("a", Message::Bool(true))])
        );
        let message = Message::map([("a", Message::Int(1))]);
        assert!(to_value(&node, &message).is_err());
    }

    #[test]
    fn test_enumerated_from_int() {
        let node = schema::enumerated(&[("ok", 0), ("tooBig", 1)]);
        assert_eq!(
            to_value(&node, &Message::Int(1)).unwrap(),
            Value::Enumerated("tooBig".to_string())
        );
        assert!(matches!(
            to_value(&node, &Message::Int(7)),
            Err(BerError::Encoding { .. })
        ));
        assert_eq!(
            to_value(&schema::integer(), &Message::Int(7)).unwrap(),
            Value::Integer(7)
        );
    }
}
