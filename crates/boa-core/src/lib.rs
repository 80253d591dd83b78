//! # boa-core
//! Foundation types for the BOA wallet: exact amounts, addresses,
//! signing keys, unspent outputs and the transaction model.

pub mod address;
pub mod amount;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod traits;
pub mod types;
