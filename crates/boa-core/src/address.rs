//! Account addresses.
//!
//! An address is the raw 32-byte Ed25519 public key of the account that
//! owns it. Its text form is Bech32m ([BIP-350]) with the `boa` prefix:
//! a version byte followed by the key is regrouped into 5-bit values and
//! suffixed with a 6-character checksum.
//!
//! [BIP-350]: https://github.com/bitcoin/bips/blob/master/bip-0350.mediawiki

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{ADDRESS_WIDTH, COMMONS_BUDGET_KEY};
use crate::error::AddressError;

/// Human-readable prefix of every address.
pub const ADDRESS_HRP: &str = "boa";

/// Version byte prepended to the key before encoding.
pub const ADDRESS_VERSION: u8 = 0x70;

const BECH32M_CONST: u32 = 0x2bc830a3;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const CHECKSUM_LEN: usize = 6;

/// Address of an account: the owner's raw public key.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
pub struct Address {
    key: [u8; ADDRESS_WIDTH],
}

impl Address {
    /// Wrap raw public key bytes.
    pub const fn from_bytes(key: [u8; ADDRESS_WIDTH]) -> Self {
        Self { key }
    }

    /// The protocol's commons budget, which receives payload fees.
    pub const fn commons_budget() -> Self {
        Self::from_bytes(COMMONS_BUDGET_KEY)
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_WIDTH] {
        &self.key
    }

    /// Encode as a Bech32m string.
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(1 + ADDRESS_WIDTH);
        raw.push(ADDRESS_VERSION);
        raw.extend_from_slice(&self.key);

        let data = to_base32(&raw);
        let checksum = bech32m_create_checksum(ADDRESS_HRP, &data);

        let mut out = String::with_capacity(ADDRESS_HRP.len() + 1 + data.len() + CHECKSUM_LEN);
        out.push_str(ADDRESS_HRP);
        out.push('1');
        for &d in data.iter().chain(checksum.iter()) {
            out.push(CHARSET[d as usize] as char);
        }
        out
    }

    /// Decode a Bech32m address string.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper {
            return Err(AddressError::MixedCase);
        }

        let lower = s.to_ascii_lowercase();
        let sep = lower.rfind('1').ok_or(AddressError::MissingSeparator)?;
        if sep == 0 {
            return Err(AddressError::InvalidHrp);
        }
        if sep + 1 + CHECKSUM_LEN >= lower.len() {
            return Err(AddressError::InvalidLength);
        }

        let hrp = &lower[..sep];
        let mut data = Vec::with_capacity(lower.len() - sep - 1);
        for c in lower[sep + 1..].chars() {
            let pos = CHARSET
                .iter()
                .position(|&ch| ch as char == c)
                .ok_or(AddressError::InvalidCharacter(c))?;
            data.push(pos as u8);
        }

        if !bech32m_verify_checksum(hrp, &data) {
            return Err(AddressError::InvalidChecksum);
        }
        if hrp != ADDRESS_HRP {
            return Err(AddressError::InvalidHrp);
        }

        let raw = from_base32(&data[..data.len() - CHECKSUM_LEN]).ok_or(AddressError::InvalidPadding)?;
        let (&version, key) = raw.split_first().ok_or(AddressError::InvalidLength)?;
        if version != ADDRESS_VERSION {
            return Err(AddressError::InvalidVersion(version));
        }
        let key: [u8; ADDRESS_WIDTH] = key.try_into().map_err(|_| AddressError::InvalidLength)?;
        Ok(Self { key })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

// --- Bech32m internals ---

fn bech32m_polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
    values.iter().fold(1u32, |chk, &v| {
        let top = chk >> 25;
        let mut next = ((chk & 0x1ffffff) << 5) ^ u32::from(v);
        for (i, g) in GEN.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                next ^= g;
            }
        }
        next
    })
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let high = hrp.bytes().map(|c| c >> 5);
    let low = hrp.bytes().map(|c| c & 31);
    high.chain(std::iter::once(0)).chain(low).collect()
}

fn bech32m_create_checksum(hrp: &str, data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0; CHECKSUM_LEN]);
    let polymod = bech32m_polymod(&values) ^ BECH32M_CONST;
    std::array::from_fn(|i| ((polymod >> (5 * (5 - i))) & 31) as u8)
}

fn bech32m_verify_checksum(hrp: &str, data: &[u8]) -> bool {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    bech32m_polymod(&values) == BECH32M_CONST
}

/// Regroup bytes into 5-bit values, zero-padding the final group.
fn to_base32(bytes: &[u8]) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity((bytes.len() * 8).div_ceil(5));
    for &b in bytes {
        acc = (acc << 8) | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(((acc >> bits) & 31) as u8);
        }
    }
    if bits > 0 {
        out.push(((acc << (5 - bits)) & 31) as u8);
    }
    out
}

/// Regroup 5-bit values into bytes. `None` on non-zero or excess padding.
fn from_base32(data: &[u8]) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * 5 / 8);
    for &v in data {
        if v >> 5 != 0 {
            return None;
        }
        acc = (acc << 5) | u32::from(v);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }
    if bits >= 5 || (acc << (8 - bits)) & 0xff != 0 {
        return None;
    }
    Some(out)
}
