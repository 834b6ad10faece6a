//! SeaORM entities
//!
//! Table models for the PostgreSQL adapter. Domain code never sees these;
//! the adapter converts them into `crate::domain::entities` types.

pub mod activities;
pub mod activity_participants;
pub mod audit_logs;
pub mod expense_participants;
pub mod expenses;
pub mod payments;
pub mod users;
