//! Application layer
//!
//! Use cases over the ledger ports. Services are generic over the storage
//! backend and shared between handlers through `Arc`.

pub mod balance_service;
pub mod ledger_service;

pub use balance_service::{
    ActivitySettlements, BalanceService, BalanceView, NetBalanceView, UserSummary,
};
pub use ledger_service::LedgerService;
