//! Adapters layer
//!
//! Storage backends implementing the ledger ports.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedgerStore;
pub use postgres::{ensure_schema, PostgresLedgerStore};
