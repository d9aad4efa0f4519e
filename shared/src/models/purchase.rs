//! Purchase (inbound) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{flexible_time, ProductId, StoreroomId};

/// A purchase history row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: String,
    /// Batch created by this purchase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub storeroom_id: StoreroomId,
    /// Quantity as entered, in the chosen unit
    pub quantity: i64,
    /// Display name of the chosen unit
    #[serde(default)]
    pub unit_str: String,
    /// Price per chosen unit
    pub price: Decimal,
    pub total: Decimal,
    #[serde(with = "flexible_time")]
    pub time: DateTime<Utc>,
}

/// Unit a purchase quantity is entered in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseUnit {
    #[default]
    Piece,
    Box,
}

/// A purchase converted to base units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseQuantity {
    pub quantity: i64,
    pub unit_cost: Decimal,
    /// Whether box conversion applied
    pub boxed: bool,
}

/// Convert an entered quantity and price into base pieces and per-piece cost.
///
/// Only box purchases of products with a box size above 1 are converted.
/// Returns `None` when the piece count does not fit in an `i64`.
pub fn to_base_units(quantity: i64, price: Decimal, unit: PurchaseUnit, box_size: u32) -> Option<BaseQuantity> {
    match unit {
        PurchaseUnit::Box if box_size > 1 => Some(BaseQuantity {
            quantity: quantity.checked_mul(i64::from(box_size))?,
            unit_cost: price / Decimal::from(box_size),
            boxed: true,
        }),
        _ => Some(BaseQuantity {
            quantity,
            unit_cost: price,
            boxed: false,
        }),
    }
}
