//! PalPay client
//!
//! Typed access to the PalPay REST API, plus a local cache that is fed by
//! the entities mutations return.

pub mod cache;
pub mod client;
pub mod error;
pub mod models;

pub use cache::LedgerCache;
pub use client::{PalPayClient, DEFAULT_API_URL};
pub use error::ClientError;
pub use models::SettlementStrategy;
