//! Construction-time schema validation
//!
//! Malformed schemas are rejected once, when they are built or registered,
//! instead of failing on the first message that reaches the faulty branch.

use super::node::{Alternative, BitStringSpec, Field, IntegerSpec, SchemaKind, SchemaNode, TagMode};
use crate::ber::types::BerTagClass;
use berkit_core::{BerError, BerResult};

impl SchemaNode {
    /// Check the whole tree rooted at this node
    ///
    /// # Error Handling
    /// Returns `BerError::Schema` if:
    /// - a CHOICE is empty, repeats an alternative name, or two alternatives
    ///   claim the same outer tag
    /// - a SEQUENCE repeats a field name, declares a default on a mandatory
    ///   field, a default that does not encode with the field type, or
    ///   optional fields whose tags cannot be told apart while decoding
    /// - an IMPLICIT tag wraps a node without a tag of its own (CHOICE, ANY)
    /// - an INTEGER range is empty or a named value lies outside it
    /// - a BIT STRING repeats a bit name or index
    pub fn validate(&self) -> BerResult<()> {
        validate_node(self, &self.label())
    }
}

fn validate_node(node: &SchemaNode, path: &str) -> BerResult<()> {
    match node.kind() {
        SchemaKind::Integer(spec) => validate_integer(spec, path),
        SchemaKind::BitString(spec) => validate_bits(spec, path),
        SchemaKind::Sequence(fields) => validate_sequence(fields, path),
        SchemaKind::SequenceOf(element) => validate_node(element, &format!("{}[]", path)),
        SchemaKind::Choice(alternatives) => validate_choice(alternatives, path),
        SchemaKind::Tagged(spec) => {
            if spec.tag.mode == TagMode::Implicit && spec.inner.tag().is_none() {
                return Err(BerError::Schema(format!(
                    "{}: {} cannot be implicitly tagged with {}",
                    path,
                    spec.inner.label(),
                    spec.tag
                )));
            }
            validate_node(&spec.inner, path)
        }
        SchemaKind::Boolean
        | SchemaKind::OctetString
        | SchemaKind::CharacterString(_)
        | SchemaKind::Null
        | SchemaKind::ObjectIdentifier
        | SchemaKind::Any => Ok(()),
    }
}

fn validate_integer(spec: &IntegerSpec, path: &str) -> BerResult<()> {
    if let (Some(min), Some(max)) = (spec.min(), spec.max()) {
        if min > max {
            return Err(BerError::Schema(format!(
                "{}: empty range [{}..{}]",
                path, min, max
            )));
        }
    }
    let named = spec.named_values();
    for (i, (name, value)) in named.iter().enumerate() {
        if named[..i].iter().any(|(other, _)| other == name) {
            return Err(BerError::Schema(format!(
                "{}: named value '{}' declared twice",
                path, name
            )));
        }
        spec.check_range(*value)
            .map_err(|reason| BerError::Schema(format!("{}: '{}': {}", path, name, reason)))?;
    }
    Ok(())
}

fn validate_bits(spec: &BitStringSpec, path: &str) -> BerResult<()> {
    let bits = spec.named_bits();
    for (i, (name, bit)) in bits.iter().enumerate() {
        if *bit >= BitStringSpec::MAX_BITS {
            return Err(BerError::Schema(format!(
                "{}: bit '{}' index {} is too large",
                path, name, bit
            )));
        }
        if let Some((other, _)) = bits[..i].iter().find(|(n, b)| n == name || b == bit) {
            return Err(BerError::Schema(format!(
                "{}: bits '{}' and '{}' collide",
                path, other, name
            )));
        }
    }
    Ok(())
}

fn validate_sequence(fields: &[Field], path: &str) -> BerResult<()> {
    for (i, field) in fields.iter().enumerate() {
        let field_path = format!("{}.{}", path, field.name);
        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(BerError::Schema(format!(
                "{}: field '{}' declared twice",
                path, field.name
            )));
        }
        validate_node(&field.node, &field_path)?;

        if let Some(default) = &field.default {
            if !field.optional {
                return Err(BerError::Schema(format!(
                    "{}: a DEFAULT value requires an optional field",
                    field_path
                )));
            }
            crate::ber::encode(&field.node, default).map_err(|e| {
                BerError::Schema(format!("{}: DEFAULT value does not match its type: {}", field_path, e))
            })?;
        }
    }

    // An optional field must be distinguishable from everything that may
    // follow it up to the next mandatory field.
    for (i, field) in fields.iter().enumerate().filter(|(_, f)| f.optional) {
        let own = outer_tags(&field.node);
        for next in &fields[i + 1..] {
            if overlaps(&own, &outer_tags(&next.node)) {
                return Err(BerError::Schema(format!(
                    "{}: optional field '{}' cannot be told apart from '{}'",
                    path, field.name, next.name
                )));
            }
            if !next.optional {
                break;
            }
        }
    }
    Ok(())
}

fn validate_choice(alternatives: &[Alternative], path: &str) -> BerResult<()> {
    if alternatives.is_empty() {
        return Err(BerError::Schema(format!("{}: CHOICE without alternatives", path)));
    }
    for (i, alternative) in alternatives.iter().enumerate() {
        if alternatives[..i].iter().any(|a| a.name == alternative.name) {
            return Err(BerError::Schema(format!(
                "{}: alternative '{}' declared twice",
                path, alternative.name
            )));
        }
        validate_node(&alternative.node, &format!("{}.{}", path, alternative.name))?;
    }

    let mut seen: Vec<(&str, (BerTagClass, u32))> = Vec::new();
    for alternative in alternatives {
        let Some(tags) = outer_tags(&alternative.node) else {
            if alternatives.len() > 1 {
                return Err(BerError::Schema(format!(
                    "{}: ANY alternative '{}' makes the CHOICE ambiguous",
                    path, alternative.name
                )));
            }
            continue;
        };
        for tag in tags {
            if let Some((other, _)) = seen.iter().find(|(_, t)| *t == tag) {
                return Err(BerError::Schema(format!(
                    "{}: alternatives '{}' and '{}' share tag [{} {}]",
                    path,
                    other,
                    alternative.name,
                    tag.0.label(),
                    tag.1
                )));
            }
            seen.push((alternative.name.as_str(), tag));
        }
    }
    Ok(())
}

/// Outer tags an element of `node` may start with; `None` when any tag fits
fn outer_tags(node: &SchemaNode) -> Option<Vec<(BerTagClass, u32)>> {
    match node.kind() {
        SchemaKind::Any => None,
        SchemaKind::Choice(alternatives) => {
            let mut tags = Vec::new();
            for alternative in alternatives {
                tags.extend(outer_tags(&alternative.node)?);
            }
            Some(tags)
        }
        _ => node.tag().map(|t| vec![(t.class(), t.number())]),
    }
}

fn overlaps(a: &Option<Vec<(BerTagClass, u32)>>, b: &Option<Vec<(BerTagClass, u32)>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.iter().any(|t| b.contains(t)),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::super::builder::*;
    use super::super::node::{Field, IntegerSpec, SchemaKind, SchemaNode};
    use crate::value::Value;
    use berkit_core::BerError;
    use std::sync::Arc;

    fn is_schema_error<T: std::fmt::Debug>(result: berkit_core::BerResult<T>) -> bool {
        matches!(result, Err(BerError::Schema(_)))
    }

    #[test]
    fn test_choice_duplicate_tags() {
        let result = ChoiceBuilder::new()
            .alternative("a", integer())
            .alternative("b", integer_range(0, 5))
            .build();
        assert!(is_schema_error(result));
    }

    #[test]
    fn test_choice_duplicate_tags_through_nested_choice() {
        let inner = ChoiceBuilder::new()
            .alternative("x", octet_string())
            .alternative("y", null())
            .build()
            .unwrap();
        let result = ChoiceBuilder::new()
            .alternative("inner", inner)
            .alternative("z", null())
            .build();
        assert!(is_schema_error(result));
    }

    #[test]
    fn test_choice_distinct_context_tags() {
        let result = ChoiceBuilder::new()
            .alternative("a", context(0, integer()))
            .alternative("b", context(1, integer()))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_empty_choice() {
        assert!(is_schema_error(ChoiceBuilder::new().build()));
    }

    #[test]
    fn test_choice_with_any_and_others() {
        let result = ChoiceBuilder::new()
            .alternative("raw", any())
            .alternative("n", integer())
            .build();
        assert!(is_schema_error(result));
    }

    #[test]
    fn test_default_must_match_type() {
        let result = SequenceBuilder::new("S")
            .with_default("version", integer(), Value::OctetString(vec![1]))
            .build();
        assert!(is_schema_error(result));

        let result = SequenceBuilder::new("S")
            .with_default("version", integer_range(0, 3), Value::Integer(9))
            .build();
        assert!(is_schema_error(result));

        let result = SequenceBuilder::new("S")
            .with_default("version", integer_range(0, 3), Value::Integer(1))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_on_mandatory_field() {
        let node = SchemaNode::new(SchemaKind::Sequence(vec![Field {
            name: "v".to_string(),
            node: Arc::new(integer()),
            optional: false,
            default: Some(Value::Integer(0)),
        }]));
        assert!(is_schema_error(node.validate()));
    }

    #[test]
    fn test_duplicate_field_names() {
        let result = SequenceBuilder::new("S")
            .field("a", integer())
            .field("a", octet_string())
            .build();
        assert!(is_schema_error(result));
    }

    #[test]
    fn test_ambiguous_optional_fields() {
        let result = SequenceBuilder::new("S")
            .optional("a", integer())
            .field("b", integer())
            .build();
        assert!(is_schema_error(result));

        let result = SequenceBuilder::new("S")
            .optional("a", context(0, integer()))
            .field("b", integer())
            .optional("c", integer())
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_implicit_choice_built_by_hand() {
        use super::super::node::{TagMode, TagOverride};
        use crate::ber::types::BerTagClass;

        let choice = ChoiceBuilder::new().alternative("a", integer()).build().unwrap();
        let node = tagged(
            TagOverride {
                class: BerTagClass::ContextSpecific,
                number: 1,
                mode: TagMode::Implicit,
            },
            choice,
        );
        assert!(is_schema_error(node.validate()));
    }

    #[test]
    fn test_integer_constraints() {
        assert!(is_schema_error(integer_range(5, 1).validate()));
        let spec = IntegerSpec::range(0, 3).named("ok", 0).named("bad", 7);
        assert!(is_schema_error(integer_with(spec).validate()));
        assert!(is_schema_error(enumerated(&[("a", 0), ("a", 1)]).validate()));
    }

    #[test]
    fn test_bit_collisions() {
        assert!(is_schema_error(named_bits(&[("a", 0), ("b", 0)]).validate()));
        assert!(is_schema_error(named_bits(&[("a", 0), ("a", 1)]).validate()));
        assert!(named_bits(&[("a", 0), ("b", 1)]).validate().is_ok());
        assert!(named_bits(&[("last", 0xFFFF)]).validate().is_ok());
        assert!(is_schema_error(named_bits(&[("past", 0x10000)]).validate()));
    }

    #[test]
    fn test_nested_errors_reported_with_path() {
        let inner = SchemaNode::new(SchemaKind::Choice(Vec::new()));
        let result = SequenceBuilder::new("Outer").field("payload", inner).build();
        match result {
            Err(BerError::Schema(message)) => assert!(message.starts_with("Outer.payload")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
