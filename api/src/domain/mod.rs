//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: Domain models representing core business concepts
//! - `ports`: Trait definitions for external dependencies
//! - `balance_engine`: Net balance and settlement computation

pub mod balance_engine;
pub mod entities;
pub mod ports;
