//! Accounts and the account container.
//!
//! An [`Account`] caches its balance and UTXO set; [`Account::check_balance`]
//! is the only thing that refreshes them. The [`AccountContainer`] keeps
//! accounts in insertion order, unique by address, and publishes
//! `Added`, `Removed`, `ChangeBalance` and `Error` events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use boa_core::address::Address;
use boa_core::amount::Amount;
use boa_core::crypto::KeyPair;
use boa_core::traits::Signer;
use boa_core::types::{Hash, UnspentTxOutput};

use crate::client::WalletClient;
use crate::error::WalletError;
use crate::events::{Event, EventDispatcher};

/// Balance summary of one account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    pub spendable: Amount,
    pub frozen: Amount,
    pub locked: Amount,
}

/// Which part of a balance a UTXO query asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceKind {
    Spendable,
    Frozen,
    Locked,
}

impl BalanceKind {
    /// Numeric form used in UTXO queries.
    pub fn as_u8(&self) -> u8 {
        match self {
            BalanceKind::Spendable => 0,
            BalanceKind::Frozen => 1,
            BalanceKind::Locked => 2,
        }
    }
}

/// A wallet account: an address, an optional signing capability and the
/// cached view of its funds.
#[derive(Clone)]
pub struct Account {
    name: String,
    address: Address,
    signer: Option<Arc<dyn Signer>>,
    balance: Balance,
    height: u64,
    spendable: Vec<UnspentTxOutput>,
    frozen: Vec<UnspentTxOutput>,
}

impl Account {
    /// An account that can be observed but not spent from.
    pub fn watch_only(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
            signer: None,
            balance: Balance::default(),
            height: 0,
            spendable: Vec::new(),
            frozen: Vec::new(),
        }
    }

    /// An account controlled by `signer`.
    pub fn with_signer(name: impl Into<String>, signer: Arc<dyn Signer>) -> Self {
        let mut account = Self::watch_only(name, signer.address());
        account.signer = Some(signer);
        account
    }

    /// An account controlled by a local keypair.
    pub fn from_keypair(name: impl Into<String>, keypair: KeyPair) -> Self {
        Self::with_signer(name, Arc::new(keypair))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn signer(&self) -> Option<&Arc<dyn Signer>> {
        self.signer.as_ref()
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    /// Block height observed at the last refresh.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Spendable UTXOs in source order.
    pub fn utxos(&self) -> &[UnspentTxOutput] {
        &self.spendable
    }

    pub fn frozen_utxos(&self) -> &[UnspentTxOutput] {
        &self.frozen
    }

    /// Refresh balance, height and UTXOs from `client`.
    ///
    /// Nothing is updated unless every query succeeds. Returns whether
    /// the balance changed.
    pub async fn check_balance(&mut self, client: &dyn WalletClient) -> Result<bool, WalletError> {
        let balance = client.balance(&self.address).await?;
        let height = client.block_height().await?;
        let spendable =
            fetch_utxos(client, &self.address, balance.spendable, BalanceKind::Spendable).await?;
        let frozen = fetch_utxos(client, &self.address, balance.frozen, BalanceKind::Frozen).await?;

        let changed = balance != self.balance;
        debug!(
            account = %self.name,
            height,
            spendable = %balance.spendable,
            utxos = spendable.len(),
            changed,
            "balance refreshed"
        );
        self.balance = balance;
        self.height = height;
        self.spendable = spendable;
        self.frozen = frozen;
        Ok(changed)
    }

    /// Spendable UTXOs, in source order, up to and including the first
    /// one that brings the running sum to `target`.
    ///
    /// Frozen and coinbase-locked outputs are skipped. Returns fewer
    /// outputs than needed when the account cannot reach `target`.
    pub fn spendable_utxos(&self, target: Amount) -> Result<Vec<UnspentTxOutput>, WalletError> {
        let mut sum = Amount::ZERO;
        let mut out = Vec::new();
        for utxo in self.spendable.iter().filter(|u| u.is_spendable_at(self.height)) {
            if sum >= target {
                break;
            }
            sum = sum.checked_add(utxo.amount)?;
            out.push(utxo.clone());
        }
        Ok(out)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("can_sign", &self.signer.is_some())
            .field("balance", &self.balance)
            .field("height", &self.height)
            .field("utxos", &self.spendable.len())
            .finish()
    }
}

async fn fetch_utxos(
    client: &dyn WalletClient,
    address: &Address,
    target: Amount,
    kind: BalanceKind,
) -> Result<Vec<UnspentTxOutput>, WalletError> {
    let mut out = Vec::new();
    let mut sum = Amount::ZERO;
    let mut last: Option<Hash> = None;
    while sum < target {
        let batch = client.utxos(address, target.checked_sub(sum)?, kind, last).await?;
        let Some(tail) = batch.last() else {
            break;
        };
        last = Some(tail.hash);
        for utxo in batch {
            sum = sum.checked_add(utxo.amount)?;
            out.push(utxo);
        }
    }
    Ok(out)
}

/// Payload published with account container events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountNotice {
    pub name: String,
    pub address: Address,
    pub balance: Balance,
    pub error: Option<WalletError>,
}

impl AccountNotice {
    fn of(account: &Account, error: Option<WalletError>) -> Self {
        Self {
            name: account.name.clone(),
            address: account.address,
            balance: account.balance,
            error,
        }
    }
}

/// Ordered set of accounts, unique by address.
#[derive(Debug, Default)]
pub struct AccountContainer {
    accounts: Vec<Account>,
    events: EventDispatcher<AccountNotice>,
}

impl AccountContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher for this container's events.
    pub fn events_mut(&mut self) -> &mut EventDispatcher<AccountNotice> {
        &mut self.events
    }

    /// Append `account`. Returns `None` if its address is already present.
    pub fn add(&mut self, account: Account) -> Option<&Account> {
        if self.find(account.address()).is_some() {
            debug!(address = %account.address(), "account already present");
            return None;
        }
        self.events.publish(Event::Added, &AccountNotice::of(&account, None));
        self.accounts.push(account);
        self.accounts.last()
    }

    /// Remove the account with `address`.
    pub fn remove(&mut self, address: &Address) -> Option<Account> {
        let idx = self.accounts.iter().position(|a| a.address() == address)?;
        let account = self.accounts.remove(idx);
        self.events.publish(Event::Removed, &AccountNotice::of(&account, None));
        Some(account)
    }

    pub fn find(&self, address: &Address) -> Option<&Account> {
        self.accounts.iter().find(|a| a.address() == address)
    }

    pub fn find_mut(&mut self, address: &Address) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.address() == address)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name() == name)
    }

    /// Remove every account, publishing `Removed` for each.
    pub fn clear(&mut self) {
        for account in self.accounts.drain(..) {
            self.events.publish(Event::Removed, &AccountNotice::of(&account, None));
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Refresh every account. A failing account publishes `Error` and
    /// the others are still refreshed. Returns how many balances changed.
    pub async fn check_balance(&mut self, client: &dyn WalletClient) -> usize {
        let mut changed = 0;
        for account in &mut self.accounts {
            match account.check_balance(client).await {
                Ok(true) => {
                    changed += 1;
                    self.events.publish(Event::ChangeBalance, &AccountNotice::of(account, None));
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(account = %account.name(), error = %e, "balance refresh failed");
                    self.events.publish(Event::Error, &AccountNotice::of(account, Some(e)));
                }
            }
        }
        changed
    }

    /// Store the funds of an account refreshed outside the container.
    ///
    /// Only the balance, height and UTXO lists are taken from `refreshed`.
    /// Publishes `ChangeBalance` when the balance differs from the stored
    /// one. Returns `false` if no account has that address any more or
    /// nothing changed.
    pub fn update(&mut self, refreshed: &Account) -> bool {
        let Some(account) = self.accounts.iter_mut().find(|a| a.address == refreshed.address) else {
            return false;
        };
        let changed = account.balance != refreshed.balance;
        account.balance = refreshed.balance;
        account.height = refreshed.height;
        account.spendable = refreshed.spendable.clone();
        account.frozen = refreshed.frozen.clone();
        if changed {
            self.events.publish(Event::ChangeBalance, &AccountNotice::of(account, None));
        }
        changed
    }

    /// Publish `Error` for a refresh of `address` that failed elsewhere.
    pub fn report_error(&mut self, address: &Address, error: WalletError) {
        if let Some(account) = self.find(address) {
            let notice = AccountNotice::of(account, Some(error));
            self.events.publish(Event::Error, &notice);
        }
    }

    /// Refresh one account. Returns `Ok(false)` for an unknown address.
    pub async fn check_balance_of(
        &mut self,
        address: &Address,
        client: &dyn WalletClient,
    ) -> Result<bool, WalletError> {
        let Some(account) = self.accounts.iter_mut().find(|a| a.address() == address) else {
            return Ok(false);
        };
        match account.check_balance(client).await {
            Ok(changed) => {
                if changed {
                    self.events.publish(Event::ChangeBalance, &AccountNotice::of(account, None));
                }
                Ok(changed)
            }
            Err(e) => {
                self.events.publish(Event::Error, &AccountNotice::of(account, Some(e.clone())));
                Err(e)
            }
        }
    }
}

impl<'a> IntoIterator for &'a AccountContainer {
    type Item = &'a Account;
    type IntoIter = std::slice::Iter<'a, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.accounts.iter()
    }
}
