//! Shared test helpers for the integration tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use rand::Rng;
use serde_json::{Value, json};

use boa_core::address::Address;
use boa_core::amount::Amount;
use boa_core::constants::UNITS_PER_BOA;
use boa_core::crypto::KeyPair;
use boa_core::types::{Hash, Transaction, UnspentTxOutput};
use boa_wallet::{
    Balance, BalanceKind, ClientError, FeeRates, Sender, TransactionFees, WalletClient,
};

/// Height reported by [`TestStoa`] unless changed.
pub const DEFAULT_HEIGHT: u64 = 10;

/// Deterministic key pair from a seed byte.
pub fn key_pair(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes([seed; 32])
}

/// `count` distinct key pairs.
pub fn key_pairs(count: u8) -> Vec<KeyPair> {
    (1..=count).map(key_pair).collect()
}

/// Address every scenario pays to.
pub fn payee() -> Address {
    key_pair(0xEE).address()
}

pub fn boa(whole: u64) -> Amount {
    Amount::new(whole * UNITS_PER_BOA)
}

/// Run a future to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

struct Stored {
    balance: Balance,
    utxos: Vec<UnspentTxOutput>,
}

/// In-memory balance and fee source.
///
/// UTXO listing follows the REST service: filter by kind (payment and
/// coinbase are spendable, freeze is frozen), resume after `last`, and
/// stop once the returned outputs reach the requested amount. Fee quotes
/// are `700 * tx_size` for the medium tier, a tenth higher for high, and
/// never lower than the medium tier.
pub struct TestStoa {
    height: AtomicU64,
    offline: AtomicBool,
    store: RwLock<HashMap<Address, Stored>>,
}

impl Default for TestStoa {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStoa {
    pub fn new() -> Self {
        Self {
            height: AtomicU64::new(DEFAULT_HEIGHT),
            offline: AtomicBool::new(false),
            store: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    /// Make every query fail with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Replace the UTXO set of `address`.
    pub fn insert(&self, address: Address, utxos: Vec<UnspentTxOutput>) {
        let mut balance = Balance::default();
        for u in &utxos {
            if u.utxo_type.is_payment() {
                balance.spendable = balance.spendable.checked_add(u.amount).unwrap();
            } else {
                balance.frozen = balance.frozen.checked_add(u.amount).unwrap();
            }
        }
        self.store.write().unwrap().insert(address, Stored { balance, utxos });
    }

    /// Replace the UTXO set of `address` from a REST-shaped JSON array.
    pub fn insert_json(&self, address: Address, utxos: Value) {
        let utxos: Vec<UnspentTxOutput> = serde_json::from_value(utxos).unwrap();
        self.insert(address, utxos);
    }

    /// Give every owner ten random outputs of 10 to 110 BOA, about a fifth
    /// of them frozen.
    pub fn randomize(&self, rng: &mut impl Rng, owners: &[Address]) {
        for owner in owners {
            let utxos: Vec<Value> = (0..10u64)
                .map(|m| {
                    let mut bytes = [0u8; 64];
                    rng.fill(&mut bytes[..]);
                    let kind = if rng.gen_bool(0.8) { 0 } else { 1 };
                    let cents: u64 = rng.gen_range(0..10_000);
                    json!({
                        "utxo": Hash(bytes).to_string(),
                        "type": kind,
                        "unlock_height": m + 2,
                        "amount": Amount::new((1_000 + cents) * UNITS_PER_BOA / 100).to_string(),
                    })
                })
                .collect();
            self.insert_json(*owner, Value::Array(utxos));
        }
    }

    pub fn spendable_of(&self, address: &Address) -> Amount {
        self.store
            .read()
            .unwrap()
            .get(address)
            .map(|s| s.balance.spendable)
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<(), ClientError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletClient for TestStoa {
    async fn balance(&self, address: &Address) -> Result<Balance, ClientError> {
        self.check_online()?;
        Ok(self
            .store
            .read()
            .unwrap()
            .get(address)
            .map(|s| s.balance)
            .unwrap_or_default())
    }

    async fn utxos(
        &self,
        address: &Address,
        amount: Amount,
        kind: BalanceKind,
        last: Option<Hash>,
    ) -> Result<Vec<UnspentTxOutput>, ClientError> {
        self.check_online()?;
        let store = self.store.read().unwrap();
        let Some(stored) = store.get(address) else {
            return Ok(Vec::new());
        };

        let mut include = last.is_none();
        let mut sum = Amount::ZERO;
        let mut out = Vec::new();
        for u in &stored.utxos {
            let matches = match kind {
                BalanceKind::Spendable => u.utxo_type.is_payment(),
                BalanceKind::Frozen => !u.utxo_type.is_payment(),
                BalanceKind::Locked => false,
            };
            if !matches {
                continue;
            }
            if !include {
                include = Some(u.hash) == last;
                continue;
            }
            if sum >= amount {
                break;
            }
            sum = sum.checked_add(u.amount).unwrap();
            out.push(u.clone());
        }
        Ok(out)
    }

    async fn fee_rates(&self, tx_size: usize) -> Result<TransactionFees, ClientError> {
        self.check_online()?;
        let minimum = Amount::new(700 * tx_size as u64);
        let fees = FeeRates::from_medium(minimum, minimum)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(TransactionFees { tx_size, fees })
    }

    async fn block_height(&self) -> Result<u64, ClientError> {
        self.check_online()?;
        Ok(self.height.load(Ordering::SeqCst))
    }
}

/// Selection figures recomputed independently from a builder's senders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replay {
    pub input_count: usize,
    pub input_sum: Amount,
    pub drawn: Amount,
    pub fee: Amount,
    pub remaining: Amount,
}

/// Walk the selected UTXOs of `senders` in order, recomputing the fee
/// for every input at `rate` with two outputs and no payload.
pub fn replay_selection(senders: &[Sender], send: Amount, rate: Amount) -> Replay {
    let fee_at = |n: usize| Amount::new(rate.units() * Transaction::estimated_size(n.max(1), 2, 0) as u64);
    let mut r = Replay {
        input_count: 0,
        input_sum: Amount::ZERO,
        drawn: Amount::ZERO,
        fee: fee_at(0),
        remaining: send.checked_add(fee_at(0)).unwrap(),
    };
    'outer: for sender in senders {
        for utxo in &sender.selected {
            r.input_count += 1;
            r.fee = fee_at(r.input_count);
            r.input_sum = r.input_sum.checked_add(utxo.amount).unwrap();
            let need = send.checked_add(r.fee).unwrap().checked_sub(r.drawn).unwrap();
            if utxo.amount >= need {
                r.drawn = r.drawn.checked_add(need).unwrap();
                r.remaining = Amount::ZERO;
                break 'outer;
            }
            r.drawn = r.drawn.checked_add(utxo.amount).unwrap();
            r.remaining = need.checked_sub(utxo.amount).unwrap();
        }
    }
    r
}
