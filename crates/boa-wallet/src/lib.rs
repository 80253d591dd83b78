//! # boa-wallet: multi-account transaction construction.
//!
//! Picks UTXOs from several accounts to pay one or more receivers,
//! converging the selection/fee feedback loop, and assembles a signed
//! transaction. Observers are notified once per actual state change.
//!
//! # Modules
//!
//! - [`error`]: `WalletError`, `ClientError`, `ResultCode`
//! - [`client`]: `WalletClient` trait for the network collaborator
//! - [`events`]: `Event` and the per-instance `EventDispatcher`
//! - [`account`]: `Account`, `Balance`, `AccountContainer`
//! - [`fee`]: fee options, rates and the fee/size model
//! - [`coin_selection`]: the ordered selection loop
//! - [`builder`]: `TransactionBuilder` and `SingleReceiverBuilder`
//! - [`watcher`]: routes chain notifications into account refreshes
//! - [`config`]: `WalletConfig`

pub mod account;
pub mod builder;
pub mod client;
pub mod coin_selection;
pub mod config;
pub mod error;
pub mod events;
pub mod fee;
pub mod watcher;

// Re-exports for convenient access
pub use account::{Account, AccountContainer, AccountNotice, Balance, BalanceKind};
pub use builder::{
    BuilderSnapshot, BuilderState, OverviewInput, Receiver, SenderSummary, SingleReceiverBuilder,
    TransactionBuilder, TransactionOverview,
};
pub use client::WalletClient;
pub use coin_selection::{CoinSelection, CoinSelector, SelectionRequest, Sender};
pub use config::WalletConfig;
pub use error::{ClientError, ResultCode, WalletError};
pub use events::{Event, EventDispatcher, SubscriptionId};
pub use fee::{FeeMode, FeeOption, FeeRates, TransactionFees};
pub use watcher::{Notification, WalletWatcher, WatchEvent};
