//! Error types for the BOA core types.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount underflow: {lhs} - {rhs}")] Underflow { lhs: u64, rhs: u64 },
    #[error("amount overflow")] Overflow,
    #[error("division by zero")] DivisionByZero,
    #[error("negative amount: {0}")] Negative(String),
    #[error("malformed amount: {0}")] Malformed(String),
    #[error("too many decimal places: {0}")] TooPrecise(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid HRP")] InvalidHrp,
    #[error("invalid length")] InvalidLength,
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid character: {0}")] InvalidCharacter(char),
    #[error("invalid version: {0}")] InvalidVersion(u8),
    #[error("invalid padding bits")] InvalidPadding,
    #[error("missing separator")] MissingSeparator,
    #[error("mixed case")] MixedCase,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
    #[error("transaction encoding: {0}")] Encoding(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("serialization: {0}")] Serialization(String),
    #[error("invalid hash: {0}")] InvalidHash(String),
    #[error("payload too large: {size} > {max}")] OversizedPayload { size: usize, max: usize },
    #[error(transparent)] Amount(#[from] AmountError),
}
