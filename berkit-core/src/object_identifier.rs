use crate::error::{BerError, BerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ASN.1 OBJECT IDENTIFIER value
///
/// Stored as its list of arcs. The first two arcs obey X.690 8.19.4: the
/// first arc is 0, 1 or 2, and the second arc is below 40 unless the first
/// arc is 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectIdentifier {
    arcs: Vec<u64>,
}

impl ObjectIdentifier {
    /// Create an object identifier from its arcs
    ///
    /// # Returns
    ///
    /// Returns `Err(BerError::Encoding)` if the arcs cannot form a BER-encodable OID
    pub fn new(arcs: Vec<u64>) -> BerResult<Self> {
        Self::check_arcs(&arcs)?;
        Ok(Self { arcs })
    }

    /// Parse an object identifier from dotted notation
    ///
    /// Accepts "1.3.6.1.2.1" style strings; at least two arcs are required.
    pub fn from_string(s: &str) -> BerResult<Self> {
        let mut arcs = Vec::new();
        for part in s.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(BerError::encoding(
                    "OBJECT IDENTIFIER",
                    format!("invalid dotted notation: '{}'", s),
                ));
            }
            let arc = part.parse::<u64>().map_err(|_| {
                BerError::encoding("OBJECT IDENTIFIER", format!("arc too large: {}", part))
            })?;
            arcs.push(arc);
        }
        Self::new(arcs)
    }

    fn check_arcs(arcs: &[u64]) -> BerResult<()> {
        if arcs.len() < 2 {
            return Err(BerError::encoding(
                "OBJECT IDENTIFIER",
                "an object identifier needs at least 2 arcs",
            ));
        }
        if arcs[0] > 2 {
            return Err(BerError::encoding(
                "OBJECT IDENTIFIER",
                format!("first arc must be 0, 1 or 2, got {}", arcs[0]),
            ));
        }
        if arcs[0] < 2 && arcs[1] >= 40 {
            return Err(BerError::encoding(
                "OBJECT IDENTIFIER",
                format!("second arc must be below 40 under arc {}, got {}", arcs[0], arcs[1]),
            ));
        }
        if arcs[0] == 2 && arcs[1] > u64::MAX - 80 {
            return Err(BerError::encoding("OBJECT IDENTIFIER", "second arc too large"));
        }
        Ok(())
    }

    /// Get the arcs
    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    /// Number of arcs
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Always false: a valid OID has at least two arcs
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl FromStr for ObjectIdentifier {
    type Err = BerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}
