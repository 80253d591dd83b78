//! Core wallet types: hashes, unspent outputs, transactions.
//!
//! All monetary values are [`Amount`]s in the smallest unit
//! (1 BOA = 10^7 units).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::amount::Amount;
use crate::constants::{HASH_WIDTH, TX_BASE_SIZE, TX_INPUT_SIZE, TX_OUTPUT_SIZE};
use crate::error::TransactionError;

/// A 64-byte content hash.
///
/// Identifies UTXOs and transactions. Produced with the BLAKE3
/// extendable output function so the width matches the protocol's
/// 512-bit hashes.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash(pub [u8; HASH_WIDTH]);

impl Hash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; HASH_WIDTH]);

    /// Hash arbitrary bytes.
    pub fn digest(data: &[u8]) -> Self {
        let mut out = [0u8; HASH_WIDTH];
        let mut hasher = blake3::Hasher::new();
        hasher.update(data);
        hasher.finalize_xof().fill(&mut out);
        Self(out)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_WIDTH] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_WIDTH]
    }

    /// Parse a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TransactionError> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(body).map_err(|e| TransactionError::InvalidHash(e.to_string()))?;
        let arr: [u8; HASH_WIDTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            TransactionError::InvalidHash(format!("expected {HASH_WIDTH} bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({self})")
    }
}

impl FromStr for Hash {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Kind of an unspent output as reported by the balance source.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum UtxoType {
    /// Ordinary spendable output.
    Payment,
    /// Frozen stake; not spendable by ordinary payments.
    Freeze,
    /// Block reward output, spendable once unlocked.
    Coinbase,
}

impl UtxoType {
    /// Whether outputs of this type can fund an ordinary payment.
    pub fn is_payment(&self) -> bool {
        matches!(self, UtxoType::Payment | UtxoType::Coinbase)
    }
}

impl TryFrom<u8> for UtxoType {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(UtxoType::Payment),
            1 => Ok(UtxoType::Freeze),
            2 => Ok(UtxoType::Coinbase),
            other => Err(format!("unknown utxo type: {other}")),
        }
    }
}

impl From<UtxoType> for u8 {
    fn from(t: UtxoType) -> Self {
        match t {
            UtxoType::Payment => 0,
            UtxoType::Freeze => 1,
            UtxoType::Coinbase => 2,
        }
    }
}

/// An unspent output owned by an account. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentTxOutput {
    /// Content hash identifying the output.
    #[serde(rename = "utxo")]
    pub hash: Hash,
    /// Output kind.
    #[serde(rename = "type")]
    pub utxo_type: UtxoType,
    /// First block height at which the output may be spent.
    pub unlock_height: u64,
    /// Value of the output.
    pub amount: Amount,
}

impl UnspentTxOutput {
    /// Whether this output can fund a payment in the block after `height`.
    pub fn is_spendable_at(&self, height: u64) -> bool {
        self.utxo_type.is_payment() && self.unlock_height <= height.saturating_add(1)
    }
}

/// Kind of a transaction output.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// Ordinary payment output.
    #[default]
    Payment,
    /// Frozen stake output.
    Freeze,
}

/// A transaction input spending a previously unspent output.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxInput {
    /// Hash of the output being spent.
    pub utxo: Hash,
    /// Ed25519 signature (64 bytes). Empty until signed.
    pub signature: Vec<u8>,
    /// Relative lock age required by the spent output.
    pub unlock_age: u32,
}

impl TxInput {
    /// An unsigned input for the given output.
    pub fn new(utxo: Hash) -> Self {
        Self {
            utxo,
            signature: Vec::new(),
            unlock_age: 0,
        }
    }
}

/// A transaction output, creating a new UTXO.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxOutput {
    /// Output kind.
    #[serde(rename = "type")]
    pub output_type: OutputType,
    /// Value of the output.
    pub value: Amount,
    /// Receiving address.
    pub address: Address,
}

impl TxOutput {
    /// A payment output.
    pub fn payment(address: Address, value: Amount) -> Self {
        Self {
            output_type: OutputType::Payment,
            value,
            address,
        }
    }
}

/// A transaction transferring value between addresses.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    /// Inputs consuming previous outputs.
    pub inputs: Vec<TxInput>,
    /// New outputs created by this transaction.
    pub outputs: Vec<TxOutput>,
    /// Arbitrary attached data.
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    /// Block height before which this transaction is invalid.
    pub lock_height: u64,
}

impl Transaction {
    /// Estimated serialized size in bytes for a transaction of this shape.
    ///
    /// The per-record sizes are fixed, so the estimate is monotonically
    /// non-decreasing in every argument. Payload bytes count verbatim.
    pub fn estimated_size(input_count: usize, output_count: usize, payload_len: usize) -> usize {
        TX_BASE_SIZE
            + input_count * TX_INPUT_SIZE
            + output_count * TX_OUTPUT_SIZE
            + payload_len
    }

    /// Hash of the full canonical encoding, signatures included.
    pub fn hash(&self) -> Result<Hash, TransactionError> {
        let encoded = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        Ok(Hash::digest(&encoded))
    }

    /// The digest every input signs.
    ///
    /// Commits to all inputs (without signatures), all outputs, the
    /// payload and the lock height, so inputs can be signed in any order.
    pub fn signing_digest(&self) -> Result<Hash, TransactionError> {
        let mut unsigned = self.clone();
        for input in &mut unsigned.inputs {
            input.signature.clear();
        }
        unsigned.hash()
    }

    /// Sum of all output values.
    pub fn total_output_value(&self) -> Result<Amount, TransactionError> {
        Ok(Amount::sum(self.outputs.iter().map(|o| o.value))?)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_address(seed: u8) -> Address {
        Address::from_bytes([seed; 32])
    }

    fn sample_tx() -> Transaction {
        Transaction {
            inputs: vec![TxInput::new(Hash([0x11; HASH_WIDTH]))],
            outputs: vec![TxOutput::payment(sample_address(0xAA), Amount::new(500_000))],
            payload: vec![],
            lock_height: 0,
        }
    }

    // --- Hash ---

    #[test]
    fn hash_zero_is_zero() {
        assert!(Hash::ZERO.is_zero());
        assert!(!Hash([1; HASH_WIDTH]).is_zero());
    }

    #[test]
    fn hash_display_hex_roundtrip() {
        let h = Hash::digest(b"utxo");
        let s = h.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 2 + 2 * HASH_WIDTH);
        assert_eq!(s.parse::<Hash>().unwrap(), h);
        assert_eq!(Hash::from_hex(&s[2..]).unwrap(), h);
    }

    #[test]
    fn hash_from_hex_wrong_width() {
        let err = Hash::from_hex("0xabcd").unwrap_err();
        assert!(matches!(err, TransactionError::InvalidHash(_)));
    }

    #[test]
    fn digest_deterministic() {
        assert_eq!(Hash::digest(b"abc"), Hash::digest(b"abc"));
        assert_ne!(Hash::digest(b"abc"), Hash::digest(b"abd"));
    }

    // --- UTXO ---

    #[test]
    fn utxo_type_numeric_serde() {
        let json = r#"{"utxo":"0x2e04f355ab7fbc0b495f8267e362b6914b756a60e8c4627142b6a6bd85a20b5986838aaa7fc40f18b7c9601ccdba06cada0d7cb28e098b08605e21324e4bbd1d","type":0,"unlock_height":2,"amount":"24400000000000"}"#;
        let utxo: UnspentTxOutput = serde_json::from_str(json).unwrap();
        assert_eq!(utxo.utxo_type, UtxoType::Payment);
        assert_eq!(utxo.unlock_height, 2);
        assert_eq!(utxo.amount, Amount::new(24_400_000_000_000));
        assert!(serde_json::from_str::<UtxoType>("7").is_err());
    }

    #[test]
    fn utxo_spendability() {
        let mut utxo = UnspentTxOutput {
            hash: Hash::digest(b"a"),
            utxo_type: UtxoType::Payment,
            unlock_height: 11,
            amount: Amount::new(1),
        };
        assert!(utxo.is_spendable_at(10));
        assert!(!utxo.is_spendable_at(9));
        utxo.utxo_type = UtxoType::Freeze;
        assert!(!utxo.is_spendable_at(100));
        utxo.utxo_type = UtxoType::Coinbase;
        assert!(utxo.is_spendable_at(100));
    }

    // --- Transaction ---

    #[test]
    fn estimated_size_model() {
        assert_eq!(Transaction::estimated_size(0, 0, 0), TX_BASE_SIZE);
        assert_eq!(
            Transaction::estimated_size(2, 2, 9),
            TX_BASE_SIZE + 2 * TX_INPUT_SIZE + 2 * TX_OUTPUT_SIZE + 9
        );
    }

    #[test]
    fn estimated_size_monotone_in_inputs() {
        let mut prev = 0;
        for n in 0..50 {
            let size = Transaction::estimated_size(n, 2, 0);
            assert!(size > prev);
            prev = size;
        }
    }

    #[test]
    fn signing_digest_ignores_signatures() {
        let tx = sample_tx();
        let mut signed = tx.clone();
        signed.inputs[0].signature = vec![7u8; 64];
        assert_eq!(tx.signing_digest().unwrap(), signed.signing_digest().unwrap());
        assert_ne!(tx.hash().unwrap(), signed.hash().unwrap());
    }

    #[test]
    fn signing_digest_commits_to_outputs_and_payload() {
        let tx = sample_tx();
        let mut other = tx.clone();
        other.outputs[0].value = Amount::new(500_001);
        assert_ne!(tx.signing_digest().unwrap(), other.signing_digest().unwrap());

        let mut with_payload = tx.clone();
        with_payload.payload = b"vote".to_vec();
        assert_ne!(tx.signing_digest().unwrap(), with_payload.signing_digest().unwrap());
    }

    #[test]
    fn total_output_value_sums() {
        let mut tx = sample_tx();
        tx.outputs.push(TxOutput::payment(sample_address(0xBB), Amount::new(100_000)));
        assert_eq!(tx.total_output_value().unwrap(), Amount::new(600_000));
    }

    #[test]
    fn transaction_json_shape() {
        let mut tx = sample_tx();
        tx.payload = vec![0x61, 0x74];
        let v = serde_json::to_value(&tx).unwrap();
        assert_eq!(v["payload"], "0x6174");
        assert_eq!(v["outputs"][0]["value"], "500000");
        assert_eq!(v["outputs"][0]["type"], "payment");
        let back: Transaction = serde_json::from_value(v).unwrap();
        assert_eq!(back, tx);
    }
}
