//! 20-byte Automated Transaction address.
//!
//! An [`AtAddress`] is fixed at deployment time and never changes for the
//! lifetime of the AT. It is derived from the deployment parameters so every
//! node computes the same address for the same deploy transaction.

use crate::{Error, PublicKey, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Size of an AT address in bytes
pub const ADDRESS_SIZE: usize = 20;

/// Domain prefix mixed into address derivation.
const ADDRESS_DOMAIN: &[u8] = b"AT";

/// A 20-byte AT address.
///
/// # Example
///
/// ```rust
/// use mintcore_types::{AtAddress, PublicKey};
///
/// let creator = PublicKey::new([1u8; 32]);
/// let addr = AtAddress::derive(&creator, 1_000, b"creation bytes");
///
/// let parsed: AtAddress = addr.to_string().parse().unwrap();
/// assert_eq!(addr, parsed);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AtAddress([u8; ADDRESS_SIZE]);

impl AtAddress {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_SIZE]);

    /// Creates a new address from a 20-byte array.
    #[inline]
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice.
    ///
    /// Returns an error if the slice length is not exactly 20 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != ADDRESS_SIZE {
            return Err(Error::InvalidLength {
                expected: ADDRESS_SIZE,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Derives the address of an AT from its deployment parameters.
    ///
    /// Formula: keccak256("AT" ++ creator ++ be_i64(creation_timestamp) ++ creation_bytes)[12..]
    pub fn derive(creator: &PublicKey, creation_timestamp: i64, creation_bytes: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(ADDRESS_DOMAIN);
        hasher.update(creator.as_bytes());
        hasher.update(creation_timestamp.to_be_bytes());
        hasher.update(creation_bytes);
        let hash = hasher.finalize();

        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&hash[12..32]);
        Self(bytes)
    }

    /// Returns the address as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the address as a fixed-size byte array.
    #[inline]
    pub const fn as_fixed_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Checks if this is the zero address.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    /// Creates an address from its hex representation.
    ///
    /// The input can optionally have a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);

        if s.len() != ADDRESS_SIZE * 2 {
            return Err(Error::InvalidAddress(format!(
                "expected 40 hex characters, got {}",
                s.len()
            )));
        }

        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    /// Returns the lowercase hex representation with 0x prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AtAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtAddress({})", self.to_hex())
    }
}

impl fmt::Display for AtAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for AtAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<[u8; ADDRESS_SIZE]> for AtAddress {
    fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<AtAddress> for [u8; ADDRESS_SIZE] {
    fn from(addr: AtAddress) -> Self {
        addr.0
    }
}

impl AsRef<[u8]> for AtAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for AtAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AtAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
