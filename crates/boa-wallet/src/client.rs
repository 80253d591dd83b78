//! Network collaborator interface.
//!
//! The wallet never talks to the network itself. Balance, UTXO, fee and
//! block height queries go through [`WalletClient`], which a REST client
//! or an in-memory fixture implements.

use async_trait::async_trait;

use boa_core::address::Address;
use boa_core::amount::Amount;
use boa_core::types::{Hash, UnspentTxOutput};

use crate::account::{Balance, BalanceKind};
use crate::error::ClientError;
use crate::fee::TransactionFees;

/// Read-only access to the wallet's network services.
#[async_trait]
pub trait WalletClient: Send + Sync {
    /// Current balance summary of `address`.
    async fn balance(&self, address: &Address) -> Result<Balance, ClientError>;

    /// UTXOs of `address` of the given kind, in source order.
    ///
    /// The source returns outputs until their sum reaches `amount`. When
    /// `last` is set, listing resumes after that output.
    async fn utxos(
        &self,
        address: &Address,
        amount: Amount,
        kind: BalanceKind,
        last: Option<Hash>,
    ) -> Result<Vec<UnspentTxOutput>, ClientError>;

    /// Fee quote for a transaction of `tx_size` bytes.
    async fn fee_rates(&self, tx_size: usize) -> Result<TransactionFees, ClientError>;

    /// Height of the latest block.
    async fn block_height(&self) -> Result<u64, ClientError>;
}
