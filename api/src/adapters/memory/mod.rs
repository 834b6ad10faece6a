//! In-memory adapters
//!
//! Implementations of repository traits backed by process memory.

pub mod ledger_store;

pub use ledger_store::InMemoryLedgerStore;
