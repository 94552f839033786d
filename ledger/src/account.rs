//! # Account Identifiers
//!
//! Fixed-width identifier types shared by every component: [`Address`] for
//! signers, owners, and balance holders, and [`Fingerprint`] for the
//! notarization hash that ties a registered asset to its off-ledger
//! provenance record. Both are opaque — the ledger compares them for
//! equality and never interprets their contents.
//!
//! The one piece of address arithmetic that *is* interpreted lives here
//! too: [`Address::sweep_key`], the normalization used to fold the many
//! deposit addresses an exchange hands out into a single canonical
//! recipient (see the sweep handling in [`crate::token`]).

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing an identifier out of its hex form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdentifierError {
    /// The input was not valid hex, or carried a stray prefix.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// The decoded value had the wrong byte length.
    #[error("wrong length: expected {expected} bytes, got {actual}")]
    WrongLength {
        /// Required byte width.
        expected: usize,
        /// Width of the provided value.
        actual: usize,
    },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account identifier.
///
/// The unit of identity for signers, asset owners, and balance holders.
/// Rendered as a `0x`-prefixed hex string in logs, snapshots, and config
/// files.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address. Never a valid signer or balance holder.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Returns `true` if every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Derives the sweep key for this address.
    ///
    /// The 160-bit value is shifted right by 20 bits: the low five hex
    /// digits are dropped and the high end is zero-filled. Exchanges issue
    /// deposit addresses that differ only in those low digits, so every
    /// deposit address in a family collapses to the same key:
    ///
    /// ```
    /// use landmark_ledger::account::Address;
    ///
    /// let a: Address = "0x1111111111111111111111111111111111111111".parse().unwrap();
    /// let b: Address = "0x1111111111111111111111111111111111199999".parse().unwrap();
    /// let key: Address = "0x0000011111111111111111111111111111111111".parse().unwrap();
    /// assert_eq!(a.sweep_key(), key);
    /// assert_eq!(b.sweep_key(), key);
    /// ```
    pub fn sweep_key(&self) -> Address {
        let mut nibbles = [0u8; 40];
        for (i, b) in self.0.iter().enumerate() {
            nibbles[2 * i] = b >> 4;
            nibbles[2 * i + 1] = b & 0x0f;
        }

        let mut shifted = [0u8; 40];
        shifted[5..].copy_from_slice(&nibbles[..35]);

        let mut out = [0u8; 20];
        for i in 0..20 {
            out[i] = (shifted[2 * i] << 4) | shifted[2 * i + 1];
        }
        Address(out)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|e| ParseIdentifierError::InvalidHex(e.to_string()))?;
        let arr: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseIdentifierError::WrongLength {
                expected: 20,
                actual: bytes.len(),
            })?;
        Ok(Address(arr))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// A 32-byte notarization fingerprint.
///
/// External provenance reference for a registered asset — produced by the
/// notarization process off-ledger and stored here untouched.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// The all-zero fingerprint, used where no notarization exists yet.
    pub const ZERO: Fingerprint = Fingerprint([0u8; 32]);
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl FromStr for Fingerprint {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|e| ParseIdentifierError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseIdentifierError::WrongLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Fingerprint(arr))
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(bytes: [u8; 32]) -> Self {
        Fingerprint(bytes)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_roundtrips_through_hex() {
        let addr: Address = "0xa1b2c3d4e5f60718293a4b5c6d7e8f9011223344"
            .parse()
            .unwrap();
        assert_eq!(
            addr.to_string(),
            "0xa1b2c3d4e5f60718293a4b5c6d7e8f9011223344"
        );
    }

    #[test]
    fn address_rejects_wrong_length() {
        let err = "0xa1b2".parse::<Address>().unwrap_err();
        assert_eq!(
            err,
            ParseIdentifierError::WrongLength {
                expected: 20,
                actual: 2
            }
        );
    }

    #[test]
    fn address_rejects_bad_hex() {
        assert!("0xzzzz".parse::<Address>().is_err());
    }

    #[test]
    fn sweep_key_drops_low_five_digits() {
        let a: Address = "0x1111111111111111111111111111111111111111"
            .parse()
            .unwrap();
        let b: Address = "0x1111111111111111111111111111111111199999"
            .parse()
            .unwrap();
        let expected: Address = "0x0000011111111111111111111111111111111111"
            .parse()
            .unwrap();
        assert_eq!(a.sweep_key(), expected);
        assert_eq!(b.sweep_key(), expected);
    }

    #[test]
    fn sweep_key_of_low_value_address_is_zero() {
        let a: Address = "0x0000000000000000000000000000000000011111"
            .parse()
            .unwrap();
        assert!(a.sweep_key().is_zero());
    }

    #[test]
    fn serde_uses_hex_strings() {
        let addr: Address = "0x1111111111111111111111111111111111111111"
            .parse()
            .unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x1111111111111111111111111111111111111111\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn fingerprint_roundtrips() {
        let fp: Fingerprint =
            "0xabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcd"
                .parse()
                .unwrap();
        let json = serde_json::to_string(&fp).unwrap();
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }
}
