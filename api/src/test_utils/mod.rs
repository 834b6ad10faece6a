//! Test utilities
//!
//! Fixtures and failure-injecting mocks for unit and HTTP-level tests.
//!
//! The in-memory store doubles as the "happy path" mock; `FailingLedgerStore`
//! covers storage outages. Both plug into the generic `AppState`, so
//! axum-test can drive the real router against either.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
