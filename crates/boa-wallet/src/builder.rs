//! Incremental transaction construction.
//!
//! A [`TransactionBuilder`] collects senders, receivers, an optional data
//! payload and a fee policy. Every mutation re-runs coin selection on a
//! copy of the draft; the copy replaces the live draft only when the whole
//! recomputation succeeds, so a failed call never leaves partial state.
//! Observers are notified once for each field that actually changed, in
//! the order `ChangeSender`, `ChangeTxFee`, `ChangePayloadFee`,
//! `ChangeReceiver`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use boa_core::address::Address;
use boa_core::amount::Amount;
use boa_core::constants::MAX_PAYLOAD_SIZE;
use boa_core::crypto::sign_transaction_input;
use boa_core::error::TransactionError;
use boa_core::types::{Hash, Transaction, TxInput, TxOutput};

use crate::account::Account;
use crate::client::WalletClient;
use crate::coin_selection::{CoinSelection, CoinSelector, SelectionRequest, Sender};
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::events::{Event, EventDispatcher};
use crate::fee::{FeeMode, FeeOption, estimated_outputs, payload_fee};

/// A payee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    pub address: Address,
    pub amount: Amount,
}

impl Receiver {
    pub fn new(address: Address, amount: Amount) -> Self {
        Self { address, amount }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Receivers {
    Many(Vec<Receiver>),
    Single {
        address: Option<Address>,
        amount: Amount,
    },
}

impl Receivers {
    /// Receivers that will become outputs.
    fn assigned(&self) -> Vec<Receiver> {
        match self {
            Receivers::Many(list) => list.clone(),
            Receivers::Single {
                address: Some(address),
                amount,
            } => vec![Receiver::new(*address, *amount)],
            Receivers::Single { address: None, .. } => Vec::new(),
        }
    }

    fn total(&self) -> Result<Amount, WalletError> {
        match self {
            Receivers::Many(list) => Ok(Amount::sum(list.iter().map(|r| r.amount))?),
            Receivers::Single { amount, .. } => Ok(*amount),
        }
    }

    fn emptied(&self) -> Self {
        match self {
            Receivers::Many(_) => Receivers::Many(Vec::new()),
            Receivers::Single { .. } => Receivers::Single {
                address: None,
                amount: Amount::ZERO,
            },
        }
    }
}

/// Lifecycle of a builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuilderState {
    /// Nothing assigned yet.
    Empty,
    /// Partially assigned or not yet funded.
    Configuring,
    /// A transaction can be built from the current selection.
    Ready,
    /// A transaction was built and nothing changed since.
    Built,
}

/// What a sender contributes under the current selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SenderSummary {
    pub address: Address,
    pub intended: Amount,
    pub drawn: Amount,
    pub utxos: Vec<Hash>,
}

impl From<&Sender> for SenderSummary {
    fn from(sender: &Sender) -> Self {
        Self {
            address: *sender.address(),
            intended: sender.intended,
            drawn: sender.drawn,
            utxos: sender.selected.iter().map(|u| u.hash).collect(),
        }
    }
}

/// Builder state delivered with every event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuilderSnapshot {
    pub senders: Vec<SenderSummary>,
    pub receivers: Vec<Receiver>,
    pub fee_tx: Amount,
    pub fee_payload: Amount,
    pub total_drawn: Amount,
    pub remaining: Amount,
    /// Set only on [`Event::Error`].
    pub error: Option<WalletError>,
}

/// One input of a [`TransactionOverview`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OverviewInput {
    pub address: Address,
    pub utxo: Hash,
    pub amount: Amount,
}

/// Unsigned view of the transaction the builder would produce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionOverview {
    pub inputs: Vec<OverviewInput>,
    pub outputs: Vec<TxOutput>,
    pub fee_tx: Amount,
    pub fee_payload: Amount,
    pub payload: Vec<u8>,
}

/// Fields compared before and after a mutation.
#[derive(PartialEq, Eq)]
struct Observed {
    senders: Vec<SenderSummary>,
    receivers: Receivers,
    fee_tx: Amount,
    fee_payload: Amount,
    payload: Vec<u8>,
    fee_rate: Amount,
    fee_override: Option<Amount>,
}

/// Inputs of the selection plus everything computed from them.
#[derive(Clone, Debug)]
struct Draft {
    senders: Vec<Sender>,
    receivers: Receivers,
    payload: Vec<u8>,
    fee_rate: Amount,
    fee_override: Option<Amount>,
    fee_tx: Amount,
    fee_payload: Amount,
    total_drawn: Amount,
    remaining: Amount,
    input_count: usize,
}

impl Draft {
    fn new(receivers: Receivers, fee_rate: Amount) -> Self {
        Self {
            senders: Vec::new(),
            receivers,
            payload: Vec::new(),
            fee_rate,
            fee_override: None,
            fee_tx: Amount::ZERO,
            fee_payload: Amount::ZERO,
            total_drawn: Amount::ZERO,
            remaining: Amount::ZERO,
            input_count: 0,
        }
    }

    fn outputs(&self) -> usize {
        estimated_outputs(self.receivers.assigned().len(), !self.payload.is_empty())
    }

    fn estimated_size(&self) -> usize {
        Transaction::estimated_size(self.input_count.max(1), self.outputs(), self.payload.len())
    }

    /// Fee at the current rate for `inputs` inputs, ignoring any override.
    fn rate_fee(&self, inputs: usize) -> Result<Amount, WalletError> {
        Ok(FeeMode::Rate(self.fee_rate).fee_for(inputs, self.outputs(), self.payload.len())?)
    }

    fn required(&self) -> Result<Amount, WalletError> {
        Ok(self.receivers.total()?.checked_add(self.fee_payload)?)
    }

    fn select(&mut self) -> Result<CoinSelection, WalletError> {
        let request = SelectionRequest {
            required: self.required()?,
            fee: match self.fee_override {
                Some(fee) => FeeMode::Fixed(fee),
                None => FeeMode::Rate(self.fee_rate),
            },
            outputs: self.outputs(),
            payload_len: self.payload.len(),
        };
        CoinSelector::select(&mut self.senders, &request)
    }

    /// Re-run selection. A fee override that no longer covers the rate
    /// fee of the inputs it selected is dropped.
    fn recompute(&mut self) -> Result<(), WalletError> {
        self.fee_payload = payload_fee(self.payload.len());
        let mut selection = self.select()?;
        if let Some(fee) = self.fee_override {
            let minimum = self.rate_fee(selection.input_count)?;
            if fee < minimum {
                debug!(fee = %fee, minimum = %minimum, inputs = selection.input_count, "fee override dropped");
                self.fee_override = None;
                selection = self.select()?;
            }
        }
        self.fee_tx = selection.fee;
        self.total_drawn = selection.total_drawn;
        self.remaining = selection.remaining;
        self.input_count = selection.input_count;
        Ok(())
    }

    fn observe(&self) -> Observed {
        Observed {
            senders: self.senders.iter().map(SenderSummary::from).collect(),
            receivers: self.receivers.clone(),
            fee_tx: self.fee_tx,
            fee_payload: self.fee_payload,
            payload: self.payload.clone(),
            fee_rate: self.fee_rate,
            fee_override: self.fee_override,
        }
    }
}

/// Multi-sender, multi-receiver transaction builder.
pub struct TransactionBuilder {
    client: Arc<dyn WalletClient>,
    config: WalletConfig,
    fee_option: FeeOption,
    draft: Draft,
    built: bool,
    events: EventDispatcher<BuilderSnapshot>,
}

impl TransactionBuilder {
    /// A builder with no senders or receivers, charging the configured
    /// minimum rate until [`set_fee_option`](Self::set_fee_option) is called.
    pub fn new(client: Arc<dyn WalletClient>, config: WalletConfig) -> Self {
        Self::with_receivers(client, config, Receivers::Many(Vec::new()))
    }

    fn with_receivers(
        client: Arc<dyn WalletClient>,
        config: WalletConfig,
        receivers: Receivers,
    ) -> Self {
        let mut draft = Draft::new(receivers, config.min_fee_rate);
        if let Err(e) = draft.recompute() {
            warn!(error = %e, "initial fee estimate failed");
        }
        Self {
            client,
            fee_option: config.fee_option,
            config,
            draft,
            built: false,
            events: EventDispatcher::new(),
        }
    }

    pub fn events_mut(&mut self) -> &mut EventDispatcher<BuilderSnapshot> {
        &mut self.events
    }

    // --- Mutators ---

    /// Remove every sender, receiver, the payload and any fee override.
    ///
    /// The fee option returns to the configured default; the fetched rate
    /// is kept until the next [`set_fee_option`](Self::set_fee_option).
    pub fn clear(&mut self) {
        self.fee_option = self.config.fee_option;
        let result = self.apply(|d| {
            d.senders.clear();
            d.receivers = d.receivers.emptied();
            d.payload.clear();
            d.fee_override = None;
            Ok(())
        });
        if let Err(e) = result {
            warn!(error = %e, "clear could not re-estimate the fee");
        }
        self.built = false;
    }

    /// Fetch a fee quote for `option` and switch to its per-byte rate.
    ///
    /// Any manual fee override is dropped. If the quote cannot be fetched
    /// the builder is left untouched and [`Event::Error`] is published.
    pub async fn set_fee_option(&mut self, option: FeeOption) -> Result<Amount, WalletError> {
        let size = self.draft.estimated_size();
        let min_rate = self.config.min_fee_rate;
        let client = Arc::clone(&self.client);

        let quoted = client
            .fee_rates(size)
            .await
            .map_err(WalletError::from)
            .and_then(|quote| Ok(quote.rate(option, min_rate)?));
        let rate = match quoted {
            Ok(rate) => rate,
            Err(e) => {
                warn!(?option, error = %e, "fee quote unavailable");
                self.publish_error(&e);
                return Err(e);
            }
        };

        self.apply(|d| {
            d.fee_rate = rate;
            d.fee_override = None;
            Ok(())
        })?;
        self.fee_option = option;
        debug!(?option, size, rate = %rate, "fee option applied");
        Ok(rate)
    }

    /// Register `account` to spend up to `intended`, or update the intended
    /// amount if the account is already a sender.
    pub fn add_sender(&mut self, account: &Account, intended: Amount) -> Result<(), WalletError> {
        self.apply(|d| {
            let sender = Sender::new(account.clone(), intended)?;
            match d.senders.iter_mut().find(|s| s.address() == sender.address()) {
                Some(existing) => *existing = sender,
                None => d.senders.push(sender),
            }
            Ok(())
        })
    }

    /// Returns `false` when `address` was not a sender.
    pub fn remove_sender(&mut self, address: &Address) -> Result<bool, WalletError> {
        if !self.draft.senders.iter().any(|s| s.address() == address) {
            return Ok(false);
        }
        self.apply(|d| {
            d.senders.retain(|s| s.address() != address);
            Ok(())
        })?;
        Ok(true)
    }

    /// Add a payee, or replace the amount of an existing one.
    pub fn add_receiver(&mut self, receiver: Receiver) -> Result<(), WalletError> {
        self.apply(|d| {
            match &mut d.receivers {
                Receivers::Many(list) => {
                    match list.iter_mut().find(|r| r.address == receiver.address) {
                        Some(existing) => *existing = receiver,
                        None => list.push(receiver),
                    }
                }
                Receivers::Single { address, amount } => {
                    *address = Some(receiver.address);
                    *amount = receiver.amount;
                }
            }
            Ok(())
        })
    }

    /// Returns `false` when `address` was not a receiver.
    pub fn remove_receiver(&mut self, address: &Address) -> Result<bool, WalletError> {
        if !self.draft.receivers.assigned().iter().any(|r| r.address == *address) {
            return Ok(false);
        }
        self.apply(|d| {
            d.receivers = match &d.receivers {
                Receivers::Many(list) => {
                    Receivers::Many(list.iter().filter(|r| r.address != *address).copied().collect())
                }
                Receivers::Single { .. } => d.receivers.emptied(),
            };
            Ok(())
        })?;
        Ok(true)
    }

    /// Attach a data payload, replacing any previous one. An empty payload
    /// removes it.
    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) -> Result<(), WalletError> {
        let payload = payload.into();
        self.apply(|d| {
            if payload.len() > MAX_PAYLOAD_SIZE {
                return Err(TransactionError::OversizedPayload {
                    size: payload.len(),
                    max: MAX_PAYLOAD_SIZE,
                }
                .into());
            }
            d.payload = payload;
            Ok(())
        })
    }

    /// Set the transaction fee manually and return the fee now in effect.
    ///
    /// A request below what the current rate charges for the selected
    /// inputs drops the override and falls back to that rate.
    pub fn set_transaction_fee(&mut self, requested: Amount) -> Result<Amount, WalletError> {
        let minimum = self.draft.rate_fee(self.draft.input_count)?;
        let fee_override = (requested >= minimum).then_some(requested);
        self.apply(|d| {
            d.fee_override = fee_override;
            Ok(())
        })?;
        debug!(
            requested = %requested,
            minimum = %minimum,
            applied = %self.draft.fee_tx,
            "transaction fee set"
        );
        Ok(self.draft.fee_tx)
    }

    // --- Output ---

    /// The unsigned transaction the current selection would produce.
    pub fn get_transaction_overview(&self) -> Result<TransactionOverview, WalletError> {
        let d = &self.draft;
        let Some(change_to) = d.senders.last().map(|s| *s.address()) else {
            return Err(WalletError::NoSenders);
        };
        let receivers = d.receivers.assigned();
        if receivers.is_empty() {
            return Err(WalletError::NoReceivers);
        }
        if let Some(r) = receivers.iter().find(|r| r.amount.is_zero()) {
            return Err(WalletError::InvalidInput(format!(
                "receiver {} has a zero amount",
                r.address
            )));
        }
        if !d.remaining.is_zero() {
            return Err(WalletError::InsufficientFunds {
                remaining: d.remaining,
            });
        }

        let inputs: Vec<OverviewInput> = d
            .senders
            .iter()
            .flat_map(|s| {
                s.selected.iter().map(|u| OverviewInput {
                    address: *s.address(),
                    utxo: u.hash,
                    amount: u.amount,
                })
            })
            .collect();

        let mut outputs: Vec<TxOutput> = receivers
            .iter()
            .map(|r| TxOutput::payment(r.address, r.amount))
            .collect();
        if !d.fee_payload.is_zero() {
            outputs.push(TxOutput::payment(self.config.commons_budget, d.fee_payload));
        }

        let change = Amount::sum(inputs.iter().map(|i| i.amount))?
            .checked_sub(d.required()?)?
            .checked_sub(d.fee_tx)?;
        if !change.is_zero() && change >= self.config.dust_threshold {
            outputs.push(TxOutput::payment(change_to, change));
        }

        Ok(TransactionOverview {
            inputs,
            outputs,
            fee_tx: d.fee_tx,
            fee_payload: d.fee_payload,
            payload: d.payload.clone(),
        })
    }

    /// Freeze the current selection into a signed transaction.
    ///
    /// Every input is signed by the account that owns it over the
    /// transaction's signing digest.
    pub fn build_transaction(&mut self) -> Result<Transaction, WalletError> {
        let overview = self.get_transaction_overview()?;

        let mut signers = Vec::with_capacity(overview.inputs.len());
        for input in &overview.inputs {
            let signer = self
                .draft
                .senders
                .iter()
                .find(|s| *s.address() == input.address)
                .and_then(|s| s.account.signer())
                .ok_or(WalletError::MissingSigner(input.address))?;
            signers.push(Arc::clone(signer));
        }

        let mut tx = Transaction {
            inputs: overview.inputs.iter().map(|i| TxInput::new(i.utxo)).collect(),
            outputs: overview.outputs,
            payload: overview.payload,
            lock_height: 0,
        };
        for (idx, signer) in signers.iter().enumerate() {
            sign_transaction_input(&mut tx, idx, signer.as_ref())?;
        }

        self.built = true;
        info!(
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            fee = %overview.fee_tx,
            payload_fee = %overview.fee_payload,
            "transaction built"
        );
        Ok(tx)
    }

    // --- Accessors ---

    pub fn state(&self) -> BuilderState {
        if self.built {
            return BuilderState::Built;
        }
        let d = &self.draft;
        if d.senders.is_empty() && d.receivers.assigned().is_empty() && d.payload.is_empty() {
            return BuilderState::Empty;
        }
        match self.get_transaction_overview() {
            Ok(_) => BuilderState::Ready,
            Err(_) => BuilderState::Configuring,
        }
    }

    pub fn snapshot(&self) -> BuilderSnapshot {
        self.snapshot_with(None)
    }

    pub fn senders(&self) -> &[Sender] {
        &self.draft.senders
    }

    pub fn receivers(&self) -> Vec<Receiver> {
        self.draft.receivers.assigned()
    }

    pub fn payload(&self) -> &[u8] {
        &self.draft.payload
    }

    pub fn fee_option(&self) -> FeeOption {
        self.fee_option
    }

    /// Per-byte rate in effect when no override is set.
    pub fn fee_rate(&self) -> Amount {
        self.draft.fee_rate
    }

    pub fn fee_override(&self) -> Option<Amount> {
        self.draft.fee_override
    }

    pub fn fee_tx(&self) -> Amount {
        self.draft.fee_tx
    }

    pub fn fee_payload(&self) -> Amount {
        self.draft.fee_payload
    }

    pub fn total_drawn(&self) -> Amount {
        self.draft.total_drawn
    }

    /// Amount still missing; zero once receivers and fees are covered.
    pub fn remaining(&self) -> Amount {
        self.draft.remaining
    }

    pub fn input_count(&self) -> usize {
        self.draft.input_count
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    // --- Internals ---

    /// Run `edit` and a full recomputation on a copy of the draft, then
    /// swap it in and publish what changed.
    fn apply<F>(&mut self, edit: F) -> Result<(), WalletError>
    where
        F: FnOnce(&mut Draft) -> Result<(), WalletError>,
    {
        let mut next = self.draft.clone();
        if let Err(e) = edit(&mut next).and_then(|()| next.recompute()) {
            debug!(error = %e, "builder edit rejected");
            self.publish_error(&e);
            return Err(e);
        }

        let before = self.draft.observe();
        self.draft = next;
        let after = self.draft.observe();
        if before != after {
            self.built = false;
            self.notify(&before, &after);
        }
        Ok(())
    }

    fn notify(&mut self, before: &Observed, after: &Observed) {
        let mut changed = Vec::with_capacity(4);
        if before.senders != after.senders {
            changed.push(Event::ChangeSender);
        }
        if before.fee_tx != after.fee_tx {
            changed.push(Event::ChangeTxFee);
        }
        if before.fee_payload != after.fee_payload {
            changed.push(Event::ChangePayloadFee);
        }
        if before.receivers != after.receivers {
            changed.push(Event::ChangeReceiver);
        }
        if changed.is_empty() {
            return;
        }

        for event in &changed {
            debug!(%event, fee = %after.fee_tx, "builder changed");
        }
        if !changed.iter().any(|e| self.events.has_subscribers(*e)) {
            return;
        }
        let snapshot = self.snapshot();
        for event in changed {
            self.events.publish(event, &snapshot);
        }
    }

    fn publish_error(&mut self, error: &WalletError) {
        let snapshot = self.snapshot_with(Some(error.clone()));
        self.events.publish(Event::Error, &snapshot);
    }

    fn snapshot_with(&self, error: Option<WalletError>) -> BuilderSnapshot {
        let d = &self.draft;
        BuilderSnapshot {
            senders: d.senders.iter().map(SenderSummary::from).collect(),
            receivers: d.receivers.assigned(),
            fee_tx: d.fee_tx,
            fee_payload: d.fee_payload,
            total_drawn: d.total_drawn,
            remaining: d.remaining,
            error,
        }
    }
}

impl fmt::Debug for TransactionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionBuilder")
            .field("senders", &self.draft.senders.len())
            .field("receivers", &self.draft.receivers)
            .field("fee_option", &self.fee_option)
            .field("fee_tx", &self.draft.fee_tx)
            .field("fee_payload", &self.draft.fee_payload)
            .field("remaining", &self.draft.remaining)
            .field("built", &self.built)
            .finish()
    }
}

/// Builder paying exactly one receiver, edited through scalar setters.
///
/// Setting the address or amount to its current value is a no-op: no
/// recomputation runs and no event fires.
#[derive(Debug)]
pub struct SingleReceiverBuilder {
    inner: TransactionBuilder,
}

impl SingleReceiverBuilder {
    pub fn new(client: Arc<dyn WalletClient>, config: WalletConfig) -> Self {
        let receivers = Receivers::Single {
            address: None,
            amount: Amount::ZERO,
        };
        Self {
            inner: TransactionBuilder::with_receivers(client, config, receivers),
        }
    }

    /// Read access to the shared builder state.
    pub fn builder(&self) -> &TransactionBuilder {
        &self.inner
    }

    pub fn events_mut(&mut self) -> &mut EventDispatcher<BuilderSnapshot> {
        self.inner.events_mut()
    }

    pub fn receiver_address(&self) -> Option<Address> {
        match self.inner.draft.receivers {
            Receivers::Single { address, .. } => address,
            Receivers::Many(_) => None,
        }
    }

    pub fn receiver_amount(&self) -> Amount {
        match self.inner.draft.receivers {
            Receivers::Single { amount, .. } => amount,
            Receivers::Many(_) => Amount::ZERO,
        }
    }

    pub fn set_receiver_address(&mut self, address: Address) -> Result<(), WalletError> {
        if self.receiver_address() == Some(address) {
            return Ok(());
        }
        self.inner.apply(|d| {
            if let Receivers::Single { address: slot, .. } = &mut d.receivers {
                *slot = Some(address);
            }
            Ok(())
        })
    }

    pub fn set_receiver_amount(&mut self, amount: Amount) -> Result<(), WalletError> {
        if self.receiver_amount() == amount {
            return Ok(());
        }
        self.inner.apply(|d| {
            if let Receivers::Single { amount: slot, .. } = &mut d.receivers {
                *slot = amount;
            }
            Ok(())
        })
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub async fn set_fee_option(&mut self, option: FeeOption) -> Result<Amount, WalletError> {
        self.inner.set_fee_option(option).await
    }

    pub fn add_sender(&mut self, account: &Account, intended: Amount) -> Result<(), WalletError> {
        self.inner.add_sender(account, intended)
    }

    pub fn remove_sender(&mut self, address: &Address) -> Result<bool, WalletError> {
        self.inner.remove_sender(address)
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) -> Result<(), WalletError> {
        self.inner.set_payload(payload)
    }

    pub fn set_transaction_fee(&mut self, requested: Amount) -> Result<Amount, WalletError> {
        self.inner.set_transaction_fee(requested)
    }

    pub fn get_transaction_overview(&self) -> Result<TransactionOverview, WalletError> {
        self.inner.get_transaction_overview()
    }

    pub fn build_transaction(&mut self) -> Result<Transaction, WalletError> {
        self.inner.build_transaction()
    }

    pub fn state(&self) -> BuilderState {
        self.inner.state()
    }
}
