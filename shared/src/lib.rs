//! Shared types, models and stock accounting for Erawan WMS
//!
//! This crate holds everything that needs no I/O: the domain models, the
//! batch ledger that moves stock in and out of storerooms, and input
//! validation. The engine and the WebAssembly build both sit on top of it.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
