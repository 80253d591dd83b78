//! Ordered coin selection with fee feedback.
//!
//! Senders are visited in registration order and each sender's candidate
//! UTXOs in source order. Every added input makes the transaction larger,
//! so the fee is recomputed before checking whether the next UTXO covers
//! what is still needed. The loop stops at the first UTXO that does.

use tracing::debug;

use boa_core::address::Address;
use boa_core::amount::Amount;
use boa_core::types::UnspentTxOutput;

use crate::account::Account;
use crate::error::WalletError;
use crate::fee::FeeMode;

/// An account registered to fund the transaction.
#[derive(Debug, Clone)]
pub struct Sender {
    /// Snapshot of the account taken when the sender was added.
    pub account: Account,
    /// Amount the user intends to spend from this account.
    pub intended: Amount,
    /// The account's spendable UTXOs covering `intended`, in source order.
    pub candidates: Vec<UnspentTxOutput>,
    /// UTXOs chosen by the last selection, in order.
    pub selected: Vec<UnspentTxOutput>,
    /// Portion of the selected UTXOs counted toward the payment.
    pub drawn: Amount,
}

impl Sender {
    pub fn new(account: Account, intended: Amount) -> Result<Self, WalletError> {
        let candidates = account.spendable_utxos(intended)?;
        Ok(Self {
            account,
            intended,
            candidates,
            selected: Vec::new(),
            drawn: Amount::ZERO,
        })
    }

    pub fn address(&self) -> &Address {
        self.account.address()
    }

    /// Full value of the selected UTXOs.
    pub fn selected_total(&self) -> Result<Amount, WalletError> {
        Ok(Amount::sum(self.selected.iter().map(|u| u.amount))?)
    }
}

/// What the selection has to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Sum of receiver amounts plus the payload fee.
    pub required: Amount,
    /// Fee computation in effect.
    pub fee: FeeMode,
    /// Output count used for size estimation.
    pub outputs: usize,
    /// Payload length used for size estimation.
    pub payload_len: usize,
}

/// Outcome of one selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinSelection {
    /// Number of inputs selected.
    pub input_count: usize,
    /// Transaction fee for the selected shape.
    pub fee: Amount,
    /// Sum of every sender's `drawn`.
    pub total_drawn: Amount,
    /// Amount still missing; zero once the payment is covered.
    pub remaining: Amount,
}

/// Greedy in-order selector.
pub struct CoinSelector;

impl CoinSelector {
    /// Select inputs from `senders` to cover `request`.
    ///
    /// Every sender's previous selection is discarded first. Running out
    /// of candidates is not an error: the shortfall is reported in
    /// [`CoinSelection::remaining`].
    pub fn select(
        senders: &mut [Sender],
        request: &SelectionRequest,
    ) -> Result<CoinSelection, WalletError> {
        for sender in senders.iter_mut() {
            sender.selected.clear();
            sender.drawn = Amount::ZERO;
        }

        let fee_for = |inputs: usize| request.fee.fee_for(inputs, request.outputs, request.payload_len);

        let mut input_count = 0;
        let mut fee = fee_for(0)?;
        let mut drawn = Amount::ZERO;
        let mut remaining = request.required.checked_add(fee)?;

        'senders: for sender in senders.iter_mut() {
            for utxo in &sender.candidates {
                input_count += 1;
                fee = fee_for(input_count)?;
                let need = request.required.checked_add(fee)?.checked_sub(drawn)?;
                sender.selected.push(utxo.clone());

                if utxo.amount >= need {
                    sender.drawn = sender.drawn.checked_add(need)?;
                    drawn = drawn.checked_add(need)?;
                    remaining = Amount::ZERO;
                    break 'senders;
                }

                sender.drawn = sender.drawn.checked_add(utxo.amount)?;
                drawn = drawn.checked_add(utxo.amount)?;
                remaining = need.checked_sub(utxo.amount)?;
            }
        }

        debug!(
            inputs = input_count,
            fee = %fee,
            drawn = %drawn,
            remaining = %remaining,
            "coin selection complete"
        );

        Ok(CoinSelection {
            input_count,
            fee,
            total_drawn: drawn,
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boa_core::constants::FEE_RATE;
    use boa_core::crypto::KeyPair;
    use boa_core::types::{Hash, Transaction};

    fn rate() -> FeeMode {
        FeeMode::Rate(Amount::new(FEE_RATE))
    }

    fn expected_fee(inputs: usize) -> Amount {
        Amount::new(FEE_RATE * Transaction::estimated_size(inputs.max(1), 2, 0) as u64)
    }

    fn utxo(tag: &str, amount: u64) -> UnspentTxOutput {
        UnspentTxOutput {
            hash: Hash::digest(tag.as_bytes()),
            utxo_type: boa_core::types::UtxoType::Payment,
            unlock_height: 0,
            amount: Amount::new(amount),
        }
    }

    fn sender(seed: u8, amounts: &[u64]) -> Sender {
        let account = Account::from_keypair(format!("s{seed}"), KeyPair::from_secret_bytes([seed; 32]));
        Sender {
            intended: Amount::new(amounts.iter().sum()),
            candidates: amounts
                .iter()
                .enumerate()
                .map(|(i, a)| utxo(&format!("{seed}-{i}"), *a))
                .collect(),
            account,
            selected: Vec::new(),
            drawn: Amount::ZERO,
        }
    }

    fn request(required: u64) -> SelectionRequest {
        SelectionRequest {
            required: Amount::new(required),
            fee: rate(),
            outputs: 2,
            payload_len: 0,
        }
    }

    #[test]
    fn small_utxos_run_out_with_deficit() {
        let mut senders = vec![sender(1, &[100_000, 200_000, 300_000])];
        let sel = CoinSelector::select(&mut senders, &request(500_000)).unwrap();

        assert_eq!(sel.input_count, 3);
        assert_eq!(sel.fee, expected_fee(3));
        assert_eq!(sel.total_drawn, Amount::new(600_000));
        assert_eq!(sel.remaining, Amount::new(243_700));
        assert!(!sel.remaining.is_zero());
        assert_eq!(senders[0].selected.len(), 3);
    }

    #[test]
    fn fee_recomputed_after_each_input() {
        let mut senders = vec![sender(1, &[1_000_000, 2_000_000, 3_000_000])];
        let sel = CoinSelector::select(&mut senders, &request(5_000_000)).unwrap();

        assert_eq!(sel.input_count, 3);
        assert_eq!(sel.fee, Amount::new(343_700));
        assert_eq!(sel.total_drawn, Amount::new(5_343_700));
        assert!(sel.remaining.is_zero());
        assert_eq!(senders[0].drawn, sel.total_drawn);
        assert_eq!(senders[0].selected_total().unwrap(), Amount::new(6_000_000));
    }

    #[test]
    fn first_covering_utxo_stops_iteration() {
        let mut senders = vec![sender(1, &[10_000_000, 1]), sender(2, &[5_000_000])];
        let sel = CoinSelector::select(&mut senders, &request(1_000_000)).unwrap();

        assert_eq!(sel.input_count, 1);
        assert_eq!(sel.fee, expected_fee(1));
        assert_eq!(sel.total_drawn, Amount::new(1_000_000).checked_add(expected_fee(1)).unwrap());
        assert_eq!(senders[0].selected.len(), 1);
        assert!(senders[1].selected.is_empty());
        assert_eq!(senders[1].drawn, Amount::ZERO);
    }

    #[test]
    fn spills_over_to_next_sender() {
        let mut senders = vec![sender(1, &[400_000]), sender(2, &[2_000_000])];
        let sel = CoinSelector::select(&mut senders, &request(1_000_000)).unwrap();

        assert_eq!(sel.input_count, 2);
        assert!(sel.remaining.is_zero());
        assert_eq!(senders[0].drawn, Amount::new(400_000));
        let expected_second = Amount::new(1_000_000)
            .checked_add(expected_fee(2))
            .unwrap()
            .checked_sub(Amount::new(400_000))
            .unwrap();
        assert_eq!(senders[1].drawn, expected_second);
        let sum = senders[0].drawn.checked_add(senders[1].drawn).unwrap();
        assert_eq!(sel.total_drawn, sum);
    }

    #[test]
    fn no_senders_reports_full_deficit() {
        let sel = CoinSelector::select(&mut [], &request(1_000)).unwrap();
        assert_eq!(sel.input_count, 0);
        assert_eq!(sel.fee, expected_fee(1));
        assert_eq!(sel.total_drawn, Amount::ZERO);
        assert_eq!(sel.remaining, Amount::new(1_000).checked_add(expected_fee(1)).unwrap());
    }

    #[test]
    fn fixed_fee_is_used_verbatim() {
        let mut senders = vec![sender(1, &[300_000, 300_000])];
        let req = SelectionRequest {
            fee: FeeMode::Fixed(Amount::new(50_000)),
            ..request(500_000)
        };
        let sel = CoinSelector::select(&mut senders, &req).unwrap();
        assert_eq!(sel.fee, Amount::new(50_000));
        assert_eq!(sel.total_drawn, Amount::new(550_000));
        assert!(sel.remaining.is_zero());
    }

    #[test]
    fn reselection_is_deterministic() {
        let mut senders = vec![sender(1, &[400_000, 900_000]), sender(2, &[2_000_000])];
        let first = CoinSelector::select(&mut senders, &request(1_500_000)).unwrap();
        let picked: Vec<_> = senders.iter().map(|s| s.selected.clone()).collect();
        let second = CoinSelector::select(&mut senders, &request(1_500_000)).unwrap();
        assert_eq!(first, second);
        assert_eq!(picked, senders.iter().map(|s| s.selected.clone()).collect::<Vec<_>>());
    }

    #[test]
    fn previous_selection_is_discarded() {
        let mut senders = vec![sender(1, &[400_000]), sender(2, &[2_000_000])];
        CoinSelector::select(&mut senders, &request(1_000_000)).unwrap();
        assert!(!senders[1].selected.is_empty());

        CoinSelector::select(&mut senders, &request(10)).unwrap();
        assert_eq!(senders[0].selected.len(), 1);
        assert!(senders[1].selected.is_empty());
        assert_eq!(senders[1].drawn, Amount::ZERO);
    }
}
