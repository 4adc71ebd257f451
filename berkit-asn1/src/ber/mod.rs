//! BER (Basic Encoding Rules) encoder and decoder for ASN.1
//!
//! This module transcodes between octet streams and [`Value`] trees, guided
//! by a [`SchemaNode`].
//!
//! # ASN.1 BER Encoding Overview
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! - **Class** (2 bits): Universal (00), Application (01), Context-specific (10), Private (11)
//! - **Constructed/Primitive** (1 bit): 0 = Primitive, 1 = Constructed
//! - **Tag Number** (5 bits): 0-30, or 11111 followed by base-128 octets
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form** (2-9 bytes): `0x80 | n` followed by n big-endian octets
//! - **Indefinite form** (`0x80`): constructed content terminated by `00 00`
//!
//! ## Tagging
//!
//! - `IMPLICIT` replaces the tag of the inner type; the constructed bit stays
//!   the inner type's.
//! - `EXPLICIT` wraps the complete inner encoding in a constructed TLV.
//!
//! # Implementation Notes
//!
//! 1. **Encoding** always produces definite lengths and primitive strings.
//! 2. **Decoding** accepts indefinite lengths (unless disabled through
//!    [`BerOptions`]) and segmented constructed strings.
//! 3. **Error offsets** are absolute positions in the decoded buffer.

pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::{BerDecoder, Element};
pub use encoder::{encode_integer_value, BerEncoder};
pub use types::{universal, BerLength, BerTag, BerTagClass};

use crate::options::BerOptions;
use crate::schema::SchemaNode;
use crate::value::Value;
use berkit_core::{BerError, BerResult, DecodeErrorKind};

/// Encode `value` as described by `node`, with default options
pub fn encode(node: &SchemaNode, value: &Value) -> BerResult<Vec<u8>> {
    encode_with(node, value, BerOptions::default())
}

/// Encode `value` as described by `node` with explicit options
///
/// Nothing is produced when any part of `value` fails to encode.
pub fn encode_with(node: &SchemaNode, value: &Value, options: BerOptions) -> BerResult<Vec<u8>> {
    let mut encoder = BerEncoder::with_options(options);
    encoder.encode(node, value)?;
    Ok(encoder.into_bytes())
}

/// Decode one value from the front of `data`
///
/// # Returns
/// The value and the number of bytes it occupied. Bytes after the value are
/// left alone.
pub fn decode(node: &SchemaNode, data: &[u8]) -> BerResult<(Value, usize)> {
    decode_with(node, data, BerOptions::default())
}

/// Decode one value from the front of `data` with explicit options
///
/// # Returns
/// The value and the number of bytes it occupied, as for [`decode`].
pub fn decode_with(node: &SchemaNode, data: &[u8], options: BerOptions) -> BerResult<(Value, usize)> {
    let mut decoder = BerDecoder::with_options(data, options);
    let value = decoder.decode(node)?;
    Ok((value, decoder.position()))
}

/// Decode a buffer holding exactly one value
pub fn decode_exact(node: &SchemaNode, data: &[u8], options: BerOptions) -> BerResult<Value> {
    let (value, consumed) = decode_with(node, data, options)?;
    if consumed < data.len() {
        return Err(BerError::decoding(
            consumed,
            DecodeErrorKind::TrailingData(data.len() - consumed),
        ));
    }
    Ok(value)
}
