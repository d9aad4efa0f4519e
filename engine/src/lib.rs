//! Erawan WMS engine
//!
//! Persistence, legacy migration and the [`Inventory`] service object that
//! runs every warehouse operation on top of the pure models in
//! `erawan_shared`.

pub mod config;
pub mod error;
pub mod inventory;
pub mod migration;
pub mod repository;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::{Config, OrphanPolicy};
pub use error::{AppError, AppResult, ErrorDetail};
pub use inventory::Inventory;
pub use services::*;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreKey};
