//! User-facing message model
//!
//! `Message` is what applications build and read. It is deliberately
//! schema-free: a map is a map whether it came from a SEQUENCE or from a
//! BIT STRING, and an OBJECT IDENTIFIER is a dotted string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Null,
    Bool(bool),
    Int(i128),
    Str(String),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    List(Vec<Message>),
    Map(BTreeMap<String, Message>),
    /// Selected CHOICE alternative and its payload
    Choice(String, Box<Message>),
}

impl Message {
    /// Build a map from (key, value) pairs
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Message)>,
        K: Into<String>,
    {
        Message::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn choice(name: impl Into<String>, value: Message) -> Self {
        Message::Choice(name.into(), Box::new(value))
    }

    pub fn bytes(bytes: impl AsRef<[u8]>) -> Self {
        Message::Bytes(bytes.as_ref().to_vec())
    }

    /// Map entry lookup
    pub fn get(&self, key: &str) -> Option<&Message> {
        match self {
            Message::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<(&str, &Message)> {
        match self {
            Message::Choice(name, value) => Some((name.as_str(), value.as_ref())),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Message::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Message::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Message::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Message::Null => "null",
            Message::Bool(_) => "bool",
            Message::Int(_) => "int",
            Message::Str(_) => "string",
            Message::Bytes(_) => "bytes",
            Message::List(_) => "list",
            Message::Map(_) => "map",
            Message::Choice(_, _) => "choice",
        }
    }
}

impl From<bool> for Message {
    fn from(value: bool) -> Self {
        Message::Bool(value)
    }
}

impl From<i128> for Message {
    fn from(value: i128) -> Self {
        Message::Int(value)
    }
}

impl From<i64> for Message {
    fn from(value: i64) -> Self {
        Message::Int(value as i128)
    }
}

impl From<u32> for Message {
    fn from(value: u32) -> Self {
        Message::Int(value as i128)
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Message::Str(value.to_string())
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Message::Str(value)
    }
}

impl From<Vec<u8>> for Message {
    fn from(value: Vec<u8>) -> Self {
        Message::Bytes(value)
    }
}

impl From<Vec<Message>> for Message {
    fn from(value: Vec<Message>) -> Self {
        Message::List(value)
    }
}
