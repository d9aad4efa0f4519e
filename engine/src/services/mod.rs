//! Warehouse operations, grouped by concern
//!
//! Each module adds an `impl` block to [`crate::Inventory`] together with the
//! input and result types its operations use.

pub mod backup;
pub mod catalog;
pub mod outbound;
pub mod purchasing;
pub mod reporting;
pub mod stock;

pub use backup::ImportSummary;
pub use catalog::{CreateProductInput, ProductMatch, ProductRemoval, UpdateProductInput};
pub use outbound::{suggested_price, CheckoutInput, OutboundReversal, StageOutboundInput};
pub use purchasing::{PurchaseDeletion, PurchaseOutcome, RecordPurchaseInput};
pub use reporting::{
    DailySummary, InventoryRow, StoreroomDetail, StoreroomDetailRow, StoreroomSummary, TrendPoint,
    TrendRange,
};
pub use stock::{AdjustStockInput, StockAdjustment};
