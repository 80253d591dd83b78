//! Integration test suite for the BOA wallet.
//!
//! Drives the transaction builder, account container and watcher against
//! an in-memory balance source that answers the way the wallet REST
//! service does. Scenarios live under `tests/`.

pub mod helpers;
