use crate::error::{ProtocolError, ProtocolResult};
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};

/// A hash-kind-agnostic object id as it appears on the wire: 40 hex chars for
/// SHA-1, 64 for SHA-256. `libbit` converts this into its own `Oid` type; this
/// crate only needs to know the byte length and whether it's the all-zero sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawOid {
    bytes: [u8; 32],
    len: u8,
}

impl RawOid {
    pub const SHA1_HEXLEN: usize = 40;
    pub const SHA256_HEXLEN: usize = 64;

    pub fn zero(byte_len: usize) -> Self {
        Self { bytes: [0; 32], len: byte_len as u8 }
    }

    pub fn is_zero(&self) -> bool {
        self.bytes[..self.len as usize].iter().all(|&b| b == 0)
    }

    pub fn byte_len(&self) -> usize {
        self.len as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Parses a hex-encoded oid of either SHA-1 (40 chars) or SHA-256 (64 chars) length.
    pub fn parse_hex(s: &str) -> ProtocolResult<Self> {
        let byte_len = match s.len() {
            Self::SHA1_HEXLEN => 20,
            Self::SHA256_HEXLEN => 32,
            _ => return Err(ProtocolError::InvalidOid(s.to_owned())),
        };
        let decoded: SmallVec<[u8; 32]> =
            hex::decode(s).map_err(|_| ProtocolError::InvalidOid(s.to_owned()))?.into();
        debug_assert_eq!(decoded.len(), byte_len);
        let mut bytes = [0u8; 32];
        bytes[..byte_len].copy_from_slice(&decoded);
        Ok(Self { bytes, len: byte_len as u8 })
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() == 20 || bytes.len() == 32, "oid must be 20 or 32 bytes");
        let mut out = [0u8; 32];
        out[..bytes.len()].copy_from_slice(bytes);
        Self { bytes: out, len: bytes.len() as u8 }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl Display for RawOid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sha1_hex() {
        let s = "a".repeat(40);
        let oid = RawOid::parse_hex(&s).unwrap();
        assert_eq!(oid.byte_len(), 20);
        assert_eq!(oid.to_hex(), s);
    }

    #[test]
    fn parses_sha256_hex() {
        let s = "b".repeat(64);
        let oid = RawOid::parse_hex(&s).unwrap();
        assert_eq!(oid.byte_len(), 32);
        assert_eq!(oid.to_hex(), s);
    }

    #[test]
    fn rejects_wrong_length_or_non_hex() {
        assert!(RawOid::parse_hex("abcd").is_err());
        assert!(RawOid::parse_hex(&"z".repeat(40)).is_err());
    }

    #[test]
    fn zero_oid_is_zero() {
        assert!(RawOid::zero(20).is_zero());
        assert!(!RawOid::parse_hex(&"1".repeat(40)).unwrap().is_zero());
    }
}
