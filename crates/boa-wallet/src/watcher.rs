//! Chain notification routing.
//!
//! The [`WalletWatcher`] turns new-block and new-transaction notifications
//! into account refreshes. It never touches builders: a refreshed account
//! reaches a builder only when the caller adds it again as a sender.
//! When push notifications are unavailable the watcher falls back to
//! polling the block height.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use boa_core::address::Address;

use crate::account::{Account, AccountContainer};
use crate::client::WalletClient;
use crate::config::WalletConfig;

/// Incoming notification from the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    NewBlock { height: u64 },
    NewTransaction { address: Address },
    /// Stop [`WalletWatcher::run`].
    Shutdown,
}

/// What the watcher did in response to a notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    /// Every account was refreshed at this height.
    NewBlock(u64),
    /// The account with this address was refreshed.
    NewTransaction(Address),
}

pub struct WalletWatcher {
    accounts: Arc<Mutex<AccountContainer>>,
    client: Arc<dyn WalletClient>,
    height: u64,
    poll_interval: Duration,
}

impl WalletWatcher {
    pub fn new(
        accounts: Arc<Mutex<AccountContainer>>,
        client: Arc<dyn WalletClient>,
        config: &WalletConfig,
    ) -> Self {
        Self {
            accounts,
            client,
            height: 0,
            poll_interval: config.poll_interval(),
        }
    }

    /// Last block height seen.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Refresh every account if `height` is above the last one seen.
    ///
    /// Accounts are refreshed on copies so the container is locked only
    /// to take the copies and to store the results.
    pub async fn on_new_block(&mut self, height: u64) -> Option<WatchEvent> {
        if height <= self.height {
            debug!(height, last = self.height, "stale block notification");
            return None;
        }
        self.height = height;

        let mut pending: Vec<Account> = self.accounts.lock().await.iter().cloned().collect();
        let mut results = Vec::with_capacity(pending.len());
        for account in &mut pending {
            results.push(account.check_balance(self.client.as_ref()).await);
        }

        let mut accounts = self.accounts.lock().await;
        let mut changed = 0;
        for (account, result) in pending.iter().zip(results) {
            match result {
                Ok(_) => changed += usize::from(accounts.update(account)),
                Err(e) => {
                    warn!(account = %account.name(), error = %e, "balance refresh failed");
                    accounts.report_error(account.address(), e);
                }
            }
        }
        debug!(height, changed, "accounts refreshed for new block");
        Some(WatchEvent::NewBlock(height))
    }

    /// Refresh the account with `address`, if the container holds one.
    pub async fn on_new_transaction(&mut self, address: &Address) -> Option<WatchEvent> {
        let mut account = self.accounts.lock().await.find(address)?.clone();
        let result = account.check_balance(self.client.as_ref()).await;

        let mut accounts = self.accounts.lock().await;
        match result {
            Ok(_) => {
                accounts.update(&account);
            }
            Err(e) => {
                warn!(%address, error = %e, "account refresh failed");
                accounts.report_error(address, e);
            }
        }
        Some(WatchEvent::NewTransaction(*address))
    }

    /// Ask the client for the block height and handle it as a new block.
    pub async fn poll(&mut self) -> Option<WatchEvent> {
        match self.client.block_height().await {
            Ok(height) => self.on_new_block(height).await,
            Err(e) => {
                debug!(error = %e, "block height poll failed");
                None
            }
        }
    }

    pub async fn handle(&mut self, notification: Notification) -> Option<WatchEvent> {
        match notification {
            Notification::NewBlock { height } => self.on_new_block(height).await,
            Notification::NewTransaction { address } => self.on_new_transaction(&address).await,
            Notification::Shutdown => None,
        }
    }

    /// Drive the watcher until `Shutdown` arrives or the notification
    /// channel closes. Block height is polled every configured interval.
    pub async fn run(
        mut self,
        mut notifications: mpsc::UnboundedReceiver<Notification>,
        events: mpsc::UnboundedSender<WatchEvent>,
    ) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                notification = notifications.recv() => {
                    match notification {
                        Some(Notification::Shutdown) | None => {
                            info!("shutting down wallet watcher");
                            break;
                        }
                        Some(notification) => self.handle(notification).await,
                    }
                }
                _ = ticker.tick() => self.poll().await,
            };

            let Some(event) = event else {
                continue;
            };
            if events.send(event).is_err() {
                debug!("watch event receiver dropped");
                break;
            }
        }
    }
}
