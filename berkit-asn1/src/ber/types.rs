//! BER encoding types (Tag, Length, etc.)

use berkit_core::DecodeErrorKind;
use std::fmt;

/// Universal class tag numbers (X.680 clause 8.4)
pub mod universal {
    pub const END_OF_CONTENTS: u32 = 0;
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const SEQUENCE: u32 = 16;
    pub const NUMERIC_STRING: u32 = 18;
    pub const IA5_STRING: u32 = 22;
    pub const VISIBLE_STRING: u32 = 26;
}

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl BerTagClass {
    /// Get tag class from bits (bits 7-6 of tag byte)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }

    /// Upper-case label used in diagnostics
    pub fn label(self) -> &'static str {
        match self {
            BerTagClass::Universal => "UNIVERSAL",
            BerTagClass::Application => "APPLICATION",
            BerTagClass::ContextSpecific => "CONTEXT",
            BerTagClass::Private => "PRIVATE",
        }
    }
}

/// BER Tag
///
/// A BER tag identifies the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Constructed/Primitive**: Whether the value is constructed (contains other values)
/// - **Tag Number**: The actual tag number (0-30 for short form, or extended)
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Extended form (tag number > 30):
/// ```text
/// First byte:  C C P 1 1 1 1 1  (all tag bits set to 1)
/// Following bytes: 1 T T T T T T T  (continuation bytes, last byte has bit 7 = 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerTag {
    /// Tag class
    class: BerTagClass,
    /// Whether this is a constructed type
    constructed: bool,
    /// Tag number
    number: u32,
}

impl BerTag {
    /// Create a new BER tag
    ///
    /// # Arguments
    /// * `class` - Tag class
    /// * `constructed` - Whether this is a constructed type
    /// * `number` - Tag number
    pub fn new(class: BerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub fn universal(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub fn application(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    /// Create a Private class tag
    pub fn private(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Private, constructed, number)
    }

    /// Get tag class
    pub fn class(&self) -> BerTagClass {
        self.class
    }

    /// Check if tag is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get tag number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Same tag with the constructed bit set to `constructed`
    pub fn with_constructed(self, constructed: bool) -> Self {
        Self { constructed, ..self }
    }

    /// Compare class and number, ignoring the primitive/constructed bit
    ///
    /// BER lets a sender pick the constructed form for string types, so tag
    /// matching against a schema never looks at that bit.
    pub fn matches(&self, other: &BerTag) -> bool {
        self.class == other.class && self.number == other.number
    }

    /// Encode tag to bytes
    ///
    /// # Encoding Strategy
    /// - If tag number <= 30: Use short form (1 byte)
    /// - If tag number > 30: Use extended form (multiple bytes)
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(1);

        // Build first byte: class (2 bits) + constructed (1 bit) + tag (5 bits)
        let class_bits = self.class.to_bits();
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number <= 30 {
            result.push(class_bits | constructed_bit | (self.number as u8 & 0x1F));
        } else {
            result.push(class_bits | constructed_bit | 0x1F);

            // Tag number in base-128, most significant group first
            let mut remaining = self.number;
            let mut bytes = Vec::new();
            while remaining > 0 {
                bytes.push((remaining & 0x7F) as u8);
                remaining >>= 7;
            }

            for (i, &byte) in bytes.iter().rev().enumerate() {
                if i < bytes.len() - 1 {
                    result.push(byte | 0x80);
                } else {
                    result.push(byte);
                }
            }
        }

        result
    }

    /// Decode tag from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerTag, bytes_consumed))` if successful. Errors carry no
    /// offset; the decoder positions them.
    ///
    /// # Error Handling
    /// Returns error if:
    /// - Buffer is too short
    /// - Tag number does not fit in 32 bits
    pub fn decode(data: &[u8]) -> Result<(Self, usize), DecodeErrorKind> {
        let first_byte = *data.first().ok_or(DecodeErrorKind::Truncated {
            needed: 1,
            available: 0,
        })?;
        let class = BerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 31 {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        // Extended form: read continuation bytes
        let mut tag_number = 0u32;
        let mut pos = 1;
        loop {
            let byte = *data.get(pos).ok_or(DecodeErrorKind::Truncated {
                needed: pos + 1,
                available: data.len(),
            })?;
            if tag_number > (u32::MAX >> 7) {
                return Err(DecodeErrorKind::InvalidContent(
                    "tag number does not fit in 32 bits".to_string(),
                ));
            }
            tag_number = (tag_number << 7) | (byte & 0x7F) as u32;
            pos += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, tag_number), pos))
    }
}

impl fmt::Display for BerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}] ({})",
            self.class.label(),
            self.number,
            if self.constructed { "C" } else { "P" }
        )
    }
}

/// BER Length encoding
///
/// BER length can be encoded in three forms:
/// - **Short form**: For lengths 0-127 (1 byte)
/// - **Long form**: For lengths > 127 (2-127 bytes)
/// - **Indefinite form**: `0x80`, content runs until an end-of-contents
///   marker (`00 00`); constructed encodings only
///
/// # Encoding Format
///
/// Short form:
/// ```text
/// Byte: 0 L L L L L L L
/// ```
///
/// Long form:
/// ```text
/// First byte:  1 N N N N N N N  (N = number of length bytes)
/// Following bytes: L L L L L L L L  (big-endian length value)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    /// Short form: length 0-127
    Short(u8),
    /// Long form: length > 127, encoded with length-of-length
    Long(usize),
    /// Indefinite form, terminated by end-of-contents
    Indefinite,
}

impl BerLength {
    /// Maximum number of subsequent length octets accepted on decoding
    pub const MAX_LENGTH_OCTETS: usize = 8;

    /// Create a new definite BER length
    ///
    /// Automatically chooses short or long form based on the length value.
    pub fn new(length: usize) -> Self {
        if length < 128 {
            BerLength::Short(length as u8)
        } else {
            BerLength::Long(length)
        }
    }

    /// Get the length value, `None` for the indefinite form
    pub fn value(&self) -> Option<usize> {
        match self {
            BerLength::Short(l) => Some(*l as usize),
            BerLength::Long(l) => Some(*l),
            BerLength::Indefinite => None,
        }
    }

    /// Encode length to bytes
    ///
    /// # Returns
    /// Encoded length bytes (1 byte for short form, 2-9 bytes for long form,
    /// `0x80` for the indefinite form)
    pub fn encode(&self) -> Vec<u8> {
        match self {
            BerLength::Short(length) => vec![*length],
            BerLength::Long(length) => {
                let mut num_bytes = 0;
                let mut temp = *length;
                while temp > 0 {
                    num_bytes += 1;
                    temp >>= 8;
                }
                if num_bytes == 0 {
                    num_bytes = 1;
                }

                let mut result = vec![0x80 | (num_bytes as u8)];
                for i in (0..num_bytes).rev() {
                    result.push(((*length >> (i * 8)) & 0xFF) as u8);
                }
                result
            }
            BerLength::Indefinite => vec![0x80],
        }
    }

    /// Decode length from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerLength, bytes_consumed))` if successful
    ///
    /// # Error Handling
    /// Returns error if:
    /// - Buffer is too short
    /// - The reserved `0xFF` first octet is used
    /// - More than [`Self::MAX_LENGTH_OCTETS`] length octets are announced
    /// - Length value does not fit in `usize`
    pub fn decode(data: &[u8]) -> Result<(Self, usize), DecodeErrorKind> {
        let first_byte = *data.first().ok_or(DecodeErrorKind::Truncated {
            needed: 1,
            available: 0,
        })?;

        if (first_byte & 0x80) == 0 {
            return Ok((BerLength::Short(first_byte & 0x7F), 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes == 0 {
            return Ok((BerLength::Indefinite, 1));
        }
        if num_bytes == 0x7F {
            return Err(DecodeErrorKind::InvalidLength(
                "reserved length octet 0xFF".to_string(),
            ));
        }
        if num_bytes > Self::MAX_LENGTH_OCTETS {
            return Err(DecodeErrorKind::InvalidLength(format!(
                "length encoded on {} bytes (max {})",
                num_bytes,
                Self::MAX_LENGTH_OCTETS
            )));
        }
        if data.len() < 1 + num_bytes {
            return Err(DecodeErrorKind::Truncated {
                needed: 1 + num_bytes,
                available: data.len(),
            });
        }

        let mut length = 0u64;
        for &byte in &data[1..1 + num_bytes] {
            length = (length << 8) | byte as u64;
        }
        let length = usize::try_from(length).map_err(|_| {
            DecodeErrorKind::InvalidLength(format!("length {} overflows usize", length))
        })?;

        Ok((BerLength::Long(length), 1 + num_bytes))
    }
}
