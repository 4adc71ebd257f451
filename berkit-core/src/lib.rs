//! Core types and utilities for the berkit BER codec engine
//!
//! This crate provides the error taxonomy shared by every layer and the
//! datatypes that are independent of any encoding rule.

pub mod error;
pub mod object_identifier;

pub use error::{BerError, BerResult, DecodeErrorKind};
pub use object_identifier::ObjectIdentifier;
