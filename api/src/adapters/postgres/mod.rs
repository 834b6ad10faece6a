//! PostgreSQL adapters
//!
//! Implementation of the ledger ports using SeaORM and PostgreSQL.

pub mod ledger_store;
pub mod schema;


pub use ledger_store::PostgresLedgerStore;
pub use schema::ensure_schema;
