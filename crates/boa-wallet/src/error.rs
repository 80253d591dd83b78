//! Wallet error types.

use boa_core::address::Address;
use boa_core::amount::Amount;
use boa_core::error::{AddressError, AmountError, CryptoError, TransactionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by the network collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("transport: {0}")] Transport(String),
    #[error("server returned {status}: {message}")] Status { status: u16, message: String },
    #[error("malformed response: {0}")] Decode(String),
}

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// A caller-supplied value was rejected before any state changed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The selection could not cover receivers plus fees.
    #[error("insufficient funds: {remaining} units short")]
    InsufficientFunds {
        /// Amount still missing after every candidate UTXO was drawn.
        remaining: Amount,
    },

    /// No receiver has been assigned.
    #[error("no receivers")]
    NoReceivers,

    /// No sender has been assigned.
    #[error("no senders")]
    NoSenders,

    /// A sender's account cannot sign.
    #[error("account {0} has no signing capability")]
    MissingSigner(Address),

    /// The network collaborator failed.
    #[error(transparent)]
    Network(#[from] ClientError),

    /// Configuration could not be loaded.
    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// UI-facing outcome code of a wallet operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    Success,
    NotEnoughAmount,
    NotAssignedReceiver,
    NotAssignedSender,
    MissingSecretKey,
    InvalidInput,
    NetworkError,
    ConfigError,
    UnknownError,
}

impl WalletError {
    /// Result code shown to the user for this error.
    pub fn code(&self) -> ResultCode {
        match self {
            WalletError::InvalidInput(_)
            | WalletError::Amount(_)
            | WalletError::Address(_)
            | WalletError::Transaction(TransactionError::OversizedPayload { .. }) => {
                ResultCode::InvalidInput
            }
            WalletError::InsufficientFunds { .. } => ResultCode::NotEnoughAmount,
            WalletError::NoReceivers => ResultCode::NotAssignedReceiver,
            WalletError::NoSenders => ResultCode::NotAssignedSender,
            WalletError::MissingSigner(_) => ResultCode::MissingSecretKey,
            WalletError::Network(_) => ResultCode::NetworkError,
            WalletError::Config(_) => ResultCode::ConfigError,
            WalletError::Crypto(_) | WalletError::Transaction(_) => ResultCode::UnknownError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_insufficient_funds() {
        let e = WalletError::InsufficientFunds {
            remaining: Amount::new(243_700),
        };
        assert_eq!(e.to_string(), "insufficient funds: 243700 units short");
    }

    #[test]
    fn display_network_is_transparent() {
        let e: WalletError = ClientError::Status {
            status: 400,
            message: "bad tx_size".into(),
        }
        .into();
        assert_eq!(e.to_string(), "server returned 400: bad tx_size");
    }

    #[test]
    fn from_amount_error() {
        let e: WalletError = AmountError::Overflow.into();
        assert_eq!(e, WalletError::Amount(AmountError::Overflow));
        assert_eq!(e.code(), ResultCode::InvalidInput);
    }

    #[test]
    fn codes() {
        assert_eq!(WalletError::NoSenders.code(), ResultCode::NotAssignedSender);
        assert_eq!(WalletError::NoReceivers.code(), ResultCode::NotAssignedReceiver);
        assert_eq!(
            WalletError::InsufficientFunds { remaining: Amount::new(1) }.code(),
            ResultCode::NotEnoughAmount
        );
        assert_eq!(
            WalletError::MissingSigner(Address::from_bytes([1; 32])).code(),
            ResultCode::MissingSecretKey
        );
        assert_eq!(
            WalletError::Network(ClientError::Transport("down".into())).code(),
            ResultCode::NetworkError
        );
        assert_eq!(
            WalletError::Crypto(CryptoError::VerificationFailed).code(),
            ResultCode::UnknownError
        );
    }

    #[test]
    fn clone_and_eq() {
        let e1 = WalletError::InvalidInput("zero amount".into());
        assert_eq!(e1.clone(), e1);
    }
}
