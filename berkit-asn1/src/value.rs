//! Native decoded value representation
//!
//! This is the shape the BER transcoder produces and consumes. It mirrors
//! the schema node kinds one to one; the user-facing model lives in
//! `berkit-codec`.

use berkit_core::ObjectIdentifier;
use std::collections::BTreeSet;

/// A value described by a [`SchemaNode`](crate::schema::SchemaNode)
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL
    Null,
    /// BOOLEAN
    Boolean(bool),
    /// INTEGER without named values
    Integer(i128),
    /// INTEGER with named values, as its symbol
    Enumerated(String),
    /// OCTET STRING
    OctetString(Vec<u8>),
    /// BIT STRING, the bits that are set, by name (or decimal index when
    /// the bit has no name)
    BitString(BTreeSet<String>),
    /// VisibleString, IA5String, NumericString
    String(String),
    /// OBJECT IDENTIFIER
    ObjectIdentifier(ObjectIdentifier),
    /// SEQUENCE, fields in schema order
    Sequence(Vec<(String, Value)>),
    /// SEQUENCE OF, elements in wire order
    SequenceOf(Vec<Value>),
    /// CHOICE, as (alternative name, value)
    Choice(String, Box<Value>),
    /// ANY, a complete undecoded TLV
    Any(Vec<u8>),
}

impl Value {
    /// Build a SEQUENCE value from (field, value) pairs
    pub fn sequence<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Sequence(fields.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }

    /// Build a CHOICE value
    pub fn choice(name: impl Into<String>, value: Value) -> Self {
        Value::Choice(name.into(), Box::new(value))
    }

    /// Build an OCTET STRING value
    pub fn octets(bytes: impl AsRef<[u8]>) -> Self {
        Value::OctetString(bytes.as_ref().to_vec())
    }

    /// Look up a SEQUENCE field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Sequence(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Alternative name and payload of a CHOICE value
    pub fn as_choice(&self) -> Option<(&str, &Value)> {
        match self {
            Value::Choice(name, value) => Some((name.as_str(), value.as_ref())),
            _ => None,
        }
    }

    /// ASN.1 flavoured name of this value's shape, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::Enumerated(_) => "enumeration symbol",
            Value::OctetString(_) => "OCTET STRING",
            Value::BitString(_) => "BIT STRING",
            Value::String(_) => "character string",
            Value::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            Value::Sequence(_) => "SEQUENCE",
            Value::SequenceOf(_) => "SEQUENCE OF",
            Value::Choice(_, _) => "CHOICE",
            Value::Any(_) => "ANY",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        Value::Integer(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value as i128)
    }
}

impl From<ObjectIdentifier> for Value {
    fn from(value: ObjectIdentifier) -> Self {
        Value::ObjectIdentifier(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let value = Value::sequence([("id", Value::Integer(5)), ("flag", Value::Boolean(true))]);
        assert_eq!(value.field("id"), Some(&Value::Integer(5)));
        assert_eq!(value.field("missing"), None);
        assert_eq!(Value::Null.field("id"), None);
    }

    #[test]
    fn test_as_choice() {
        let value = Value::choice("text", Value::octets(b"hi"));
        let (name, payload) = value.as_choice().unwrap();
        assert_eq!(name, "text");
        assert_eq!(payload, &Value::OctetString(b"hi".to_vec()));
    }
}
