use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tiny_keccak::{Hasher, Keccak};

use crate::error::Error;

/// A 20-byte EVM account address.
///
/// Parsing accepts any letter case, so two addresses that differ only in
/// case compare equal. `Display` renders lower-case hex; `Debug` and
/// [`Address::to_checksum`] render the EIP-55 form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding: a hex letter is upper-cased when
    /// the matching nibble of `keccak256(lowercase_hex)` is 8 or more.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let mut digest = [0u8; 32];
        let mut keccak = Keccak::v256();
        keccak.update(lower.as_bytes());
        keccak.finalize(&mut digest);

        let nibbles = digest.iter().flat_map(|byte| [byte >> 4, byte & 0x0f]);
        let body: String = lower
            .chars()
            .zip(nibbles)
            .map(|(c, nibble)| if nibble >= 8 { c.to_ascii_uppercase() } else { c })
            .collect();
        format!("0x{body}")
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| Error::InvalidAddress(format!("{s}: missing 0x prefix")))?;
        if digits.len() != 40 {
            return Err(Error::InvalidAddress(format!(
                "{s}: expected 40 hex digits, got {}",
                digits.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| Error::InvalidAddress(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        let lower: Address = "0xdac17f958d2ee523a2206206994597c13d831ec7".parse().unwrap();
        let upper: Address = "0xDAC17F958D2EE523A2206206994597C13D831EC7".parse().unwrap();
        let mixed: Address = "0xdAC17F958D2ee523a2206206994597C13D831ec7".parse().unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, mixed);
        assert_eq!(
            upper.to_string(),
            "0xdac17f958d2ee523a2206206994597c13d831ec7"
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("dac17f958d2ee523a2206206994597c13d831ec7"
            .parse::<Address>()
            .is_err());
        assert!("0xabc".parse::<Address>().is_err());
        assert!("0xzz17f958d2ee523a2206206994597c13d831ec7"
            .parse::<Address>()
            .is_err());
    }

    #[test]
    fn test_eip55_checksum() {
        let addr: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(
            addr.to_checksum(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn test_debug_uses_checksum() {
        let addr: Address = "0xFB6916095CA1DF60BB79CE92CE3EA74C37C5D359".parse().unwrap();
        assert_eq!(
            format!("{addr:?}"),
            "Address(0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359)"
        );
        assert_eq!(addr.to_string(), "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359");
    }

    #[test]
    fn test_serde_roundtrip_normalises_case() {
        let addr: Address =
            serde_json::from_str("\"0xDAC17F958D2EE523A2206206994597C13D831EC7\"").unwrap();
        assert_eq!(
            serde_json::to_string(&addr).unwrap(),
            "\"0xdac17f958d2ee523a2206206994597c13d831ec7\""
        );
    }
}
