//! Fee policy and the fee side of the size model.
//!
//! The transaction fee is `rate * estimated_size` while a rate is active,
//! or a fixed total once the user overrides it. A non-empty payload
//! additionally pays a payload fee to the commons budget, tracked
//! separately from the transaction fee.

use serde::{Deserialize, Serialize};

use boa_core::amount::Amount;
use boa_core::constants::{PAYLOAD_FEE_FACTOR, PAYLOAD_MIN_FEE};
use boa_core::error::AmountError;
use boa_core::types::Transaction;

/// Fee tier requested from the fee source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeOption {
    High,
    #[default]
    Medium,
    Low,
}

/// A three-tier fee quote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub high: Amount,
    pub medium: Amount,
    pub low: Amount,
}

impl FeeRates {
    /// Derive the tiers from a medium quote: high and low sit a tenth
    /// above and below it, and no tier falls under `minimum`.
    pub fn from_medium(medium: Amount, minimum: Amount) -> Result<Self, AmountError> {
        let medium = medium.max(minimum);
        let width = medium.checked_div(10)?;
        Ok(Self {
            high: medium.checked_add(width)?.max(minimum),
            medium,
            low: medium.checked_sub(width)?.max(minimum),
        })
    }

    /// The quote for one tier.
    pub fn select(&self, option: FeeOption) -> Amount {
        match option {
            FeeOption::High => self.high,
            FeeOption::Medium => self.medium,
            FeeOption::Low => self.low,
        }
    }
}

/// Total fees quoted for a transaction of `tx_size` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFees {
    pub tx_size: usize,
    #[serde(flatten)]
    pub fees: FeeRates,
}

impl TransactionFees {
    /// Per-byte rate for `option`, never below `min_rate`.
    pub fn rate(&self, option: FeeOption, min_rate: Amount) -> Result<Amount, AmountError> {
        if self.tx_size == 0 {
            return Ok(min_rate);
        }
        Ok(self
            .fees
            .select(option)
            .checked_div(self.tx_size as u64)?
            .max(min_rate))
    }
}

/// How the transaction fee is computed during selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeMode {
    /// Units per estimated byte.
    Rate(Amount),
    /// A user-chosen total, independent of the input count.
    Fixed(Amount),
}

impl FeeMode {
    /// Fee for a transaction with the given shape. At least one input is
    /// always assumed.
    pub fn fee_for(
        &self,
        inputs: usize,
        outputs: usize,
        payload_len: usize,
    ) -> Result<Amount, AmountError> {
        match *self {
            FeeMode::Fixed(fee) => Ok(fee),
            FeeMode::Rate(rate) => tx_fee(
                Transaction::estimated_size(inputs.max(1), outputs, payload_len),
                rate,
            ),
        }
    }
}

/// `rate * size`.
pub fn tx_fee(size: usize, rate: Amount) -> Result<Amount, AmountError> {
    rate.checked_mul(size as u64)
}

/// Fee owed to the commons budget for a payload of `len` bytes.
pub fn payload_fee(len: usize) -> Amount {
    if len == 0 {
        return Amount::ZERO;
    }
    let proportional = PAYLOAD_FEE_FACTOR.saturating_mul(len as u64);
    Amount::new(proportional.max(PAYLOAD_MIN_FEE))
}

/// Output count used for fee estimation: receivers (at least one), the
/// change output, and the commons-budget output when a payload exists.
pub fn estimated_outputs(receivers: usize, has_payload: bool) -> usize {
    receivers.max(1) + 1 + usize::from(has_payload)
}
