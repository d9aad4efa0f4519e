//! Domain models for the warehouse

mod backup;
mod outbound;
mod product;
mod purchase;
mod registry;

pub use backup::*;
pub use outbound::*;
pub use product::*;
pub use purchase::*;
pub use registry::*;
