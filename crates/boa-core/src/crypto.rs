//! Ed25519 keys and transaction signing.
//!
//! An account's address is its raw public key, so verification needs no
//! separate key field on inputs. Every input of a transaction signs the
//! same digest ([`Transaction::signing_digest`]), which commits to all
//! inputs without signatures, all outputs, the payload and the lock height.

use ed25519_dalek::{Signer as _, Verifier as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::address::Address;
use crate::constants::SIGNATURE_WIDTH;
use crate::error::CryptoError;
use crate::traits::Signer;
use crate::types::{Hash, Transaction};

/// Ed25519 keypair owning one address.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a random keypair from the OS RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    /// Raw secret key bytes.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The address owned by this keypair.
    pub fn address(&self) -> Address {
        Address::from_bytes(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign arbitrary bytes.
    pub fn sign_bytes(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_secret_bytes(self.secret_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl Signer for KeyPair {
    fn address(&self) -> Address {
        KeyPair::address(self)
    }

    fn sign(&self, digest: &Hash) -> Signature {
        self.sign_bytes(digest.as_bytes())
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_WIDTH]);

impl Signature {
    /// Parse from a byte slice of exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_WIDTH] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Verify `signature` over `message` against the key in `address`.
pub fn verify(address: &Address, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
    let key = ed25519_dalek::VerifyingKey::from_bytes(address.as_bytes())
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    key.verify(message, &sig)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Sign one input in place with `signer`.
pub fn sign_transaction_input(
    tx: &mut Transaction,
    input_index: usize,
    signer: &dyn Signer,
) -> Result<(), CryptoError> {
    let len = tx.inputs.len();
    if input_index >= len {
        return Err(CryptoError::InputIndexOutOfBounds { index: input_index, len });
    }
    let digest = tx
        .signing_digest()
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
    tx.inputs[input_index].signature = signer.sign(&digest).0.to_vec();
    Ok(())
}

/// Check that input `input_index` carries a valid signature by `owner`.
pub fn verify_transaction_input(
    tx: &Transaction,
    input_index: usize,
    owner: &Address,
) -> Result<(), CryptoError> {
    let input = tx.inputs.get(input_index).ok_or(CryptoError::InputIndexOutOfBounds {
        index: input_index,
        len: tx.inputs.len(),
    })?;
    let signature = Signature::from_slice(&input.signature)?;
    let digest = tx
        .signing_digest()
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
    verify(owner, digest.as_bytes(), &signature)
}
