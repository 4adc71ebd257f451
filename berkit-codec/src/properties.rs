//! Codec properties
//!
//! A free-form bag of named settings attached to a registration. The BER
//! codec understands the keys listed below and keeps everything else
//! untouched for callers that attach their own metadata.
//!
//! | key                   | type | default |
//! |-----------------------|------|---------|
//! | `max_depth`           | int  | 64      |
//! | `indefinite_length`   | bool | true    |
//! | `omit_default_fields` | bool | false   |
//! | `summary_prefix`      | str  | none    |

use berkit_asn1::BerOptions;
use berkit_core::{BerError, BerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_DEPTH: &str = "max_depth";
pub const INDEFINITE_LENGTH: &str = "indefinite_length";
pub const OMIT_DEFAULT_FIELDS: &str = "omit_default_fields";
pub const SUMMARY_PREFIX: &str = "summary_prefix";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl PropertyValue {
    fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Str(_) => "string",
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value as i64)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecProperties {
    values: BTreeMap<String, PropertyValue>,
}

impl CodecProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of these properties with `overrides` applied on top
    pub fn merged(&self, overrides: &CodecProperties) -> Self {
        let mut values = self.values.clone();
        values.extend(overrides.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { values }
    }

    /// Transcoder settings described by these properties
    ///
    /// # Error Handling
    /// Returns `BerError::Config` when a recognised key holds a value of the
    /// wrong type, or `max_depth` is not a positive integer.
    pub fn ber_options(&self) -> BerResult<BerOptions> {
        let mut options = BerOptions::default();
        if let Some(value) = self.get(MAX_DEPTH) {
            let PropertyValue::Int(depth) = value else {
                return Err(wrong_type(MAX_DEPTH, "int", value));
            };
            options.max_depth = usize::try_from(*depth)
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| {
                    BerError::Config(format!("{} must be a positive integer, got {}", MAX_DEPTH, depth))
                })?;
        }
        if let Some(allow) = self.bool_value(INDEFINITE_LENGTH)? {
            options.allow_indefinite_length = allow;
        }
        if let Some(omit) = self.bool_value(OMIT_DEFAULT_FIELDS)? {
            options.omit_default_fields = omit;
        }
        Ok(options)
    }

    pub fn summary_prefix(&self) -> BerResult<Option<&str>> {
        match self.get(SUMMARY_PREFIX) {
            None => Ok(None),
            Some(PropertyValue::Str(prefix)) => Ok(Some(prefix)),
            Some(other) => Err(wrong_type(SUMMARY_PREFIX, "string", other)),
        }
    }

    fn bool_value(&self, key: &str) -> BerResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(PropertyValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(wrong_type(key, "bool", other)),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for CodecProperties
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn wrong_type(key: &str, expected: &str, found: &PropertyValue) -> BerError {
    BerError::Config(format!(
        "property {} must be a {}, got {}",
        key,
        expected,
        found.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CodecProperties::new().ber_options().unwrap();
        assert_eq!(options, BerOptions::default());
        assert_eq!(CodecProperties::new().summary_prefix().unwrap(), None);
    }

    #[test]
    fn test_recognised_keys() {
        let properties = CodecProperties::new()
            .with(MAX_DEPTH, 8)
            .with(INDEFINITE_LENGTH, false)
            .with(OMIT_DEFAULT_FIELDS, true)
            .with(SUMMARY_PREFIX, "SNMP")
            .with("vendor", "acme");
        let options = properties.ber_options().unwrap();
        assert_eq!(options.max_depth, 8);
        assert!(!options.allow_indefinite_length);
        assert!(options.omit_default_fields);
        assert_eq!(properties.summary_prefix().unwrap(), Some("SNMP"));
        assert_eq!(properties.get("vendor"), Some(&PropertyValue::from("acme")));
    }

    #[test]
    fn test_wrong_types_are_config_errors() {
        let bad = CodecProperties::new().with(MAX_DEPTH, "deep");
        assert!(matches!(bad.ber_options(), Err(BerError::Config(_))));
        let bad = CodecProperties::new().with(MAX_DEPTH, 0);
        assert!(matches!(bad.ber_options(), Err(BerError::Config(_))));
        let bad = CodecProperties::new().with(INDEFINITE_LENGTH, 1);
        assert!(matches!(bad.ber_options(), Err(BerError::Config(_))));
        let bad = CodecProperties::new().with(SUMMARY_PREFIX, true);
        assert!(matches!(bad.summary_prefix(), Err(BerError::Config(_))));
    }

    #[test]
    fn test_merged_overrides_win() {
        let base: CodecProperties = [("a", 1), ("b", 2)].into_iter().collect();
        let overrides = CodecProperties::new().with("b", 3).with("c", 4);
        let merged = base.merged(&overrides);
        assert_eq!(merged.get("a"), Some(&PropertyValue::Int(1)));
        assert_eq!(merged.get("b"), Some(&PropertyValue::Int(3)));
        assert_eq!(merged.get("c"), Some(&PropertyValue::Int(4)));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_serde_round_trip() {
        let properties = CodecProperties::new()
            .with(MAX_DEPTH, 8)
            .with(INDEFINITE_LENGTH, false)
            .with(SUMMARY_PREFIX, "SNMP");
        let json = serde_json::to_string(&properties).unwrap();
        let back: CodecProperties = serde_json::from_str(&json).unwrap();
        assert_eq!(back, properties);
        assert_eq!(back.ber_options().unwrap().max_depth, 8);

        // untagged values read back from plain JSON
        let parsed: CodecProperties = serde_json::from_str(
            r#"{"values":{"max_depth":3,"indefinite_length":true,"summary_prefix":"X"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.ber_options().unwrap().max_depth, 3);
        assert_eq!(parsed.summary_prefix().unwrap(), Some("X"));
    }
}
