//! Product catalog and stock batch models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{flexible_time, ProductId, StoreroomId};

/// A catalog product together with its stock ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Search code, the zero-padded id
    pub code: String,
    pub name: String,
    pub category: String,
    /// Reference unit cost, updated to the last purchase price
    pub cost_price: Decimal,
    /// Base units per box, at least 1
    pub box_size: u32,
    pub unit_name: String,
    pub box_unit_name: String,
    /// Derived per-storeroom quantities, rebuilt from `batches`
    #[serde(default)]
    pub storerooms: BTreeMap<StoreroomId, i64>,
    /// Authoritative stock ledger
    #[serde(default)]
    pub batches: Vec<Batch>,
    /// Derived total, the sum of `storerooms`
    #[serde(default)]
    pub stock: i64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "flexible_time::option"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Build an empty product; derived totals start at zero for every storeroom
    pub fn new(id: ProductId, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            code: id.code(),
            name: name.into(),
            category: category.into(),
            cost_price: Decimal::ZERO,
            box_size: 1,
            unit_name: String::new(),
            box_unit_name: String::new(),
            storerooms: StoreroomId::all().map(|s| (s, 0)).collect(),
            batches: Vec::new(),
            stock: 0,
            created_at: None,
        }
    }

    /// On-hand quantity in a storeroom as of the last recompute
    pub fn on_hand(&self, storeroom: StoreroomId) -> i64 {
        self.storerooms.get(&storeroom).copied().unwrap_or(0)
    }

    /// Reference cost of one box
    pub fn box_cost(&self) -> Decimal {
        self.cost_price * Decimal::from(self.box_size.max(1))
    }

    pub fn batch(&self, batch_id: &str) -> Option<&Batch> {
        self.batches
            .iter()
            .find(|b| b.batch_id.as_deref() == Some(batch_id))
    }

    /// Case-insensitive match against name or search code
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.code.to_lowercase().contains(&needle)
    }
}

/// A quantity of stock at one unit cost, located in one storeroom
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Present for batches created by a purchase, used to reverse it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub storeroom: StoreroomId,
    /// Signed; zero-out entries and downward corrections from a product edit are negative
    pub quantity: i64,
    pub unit_cost: Decimal,
    #[serde(with = "flexible_time")]
    pub timestamp: DateTime<Utc>,
    pub kind: BatchKind,
    #[serde(default)]
    pub remark: String,
}

impl Batch {
    pub fn new(
        kind: BatchKind,
        storeroom: StoreroomId,
        quantity: i64,
        unit_cost: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            batch_id: None,
            storeroom,
            quantity,
            unit_cost,
            timestamp,
            kind,
            remark: kind.label().to_string(),
        }
    }

    pub fn with_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    /// Quantity times unit cost
    pub fn value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_cost
    }
}

/// Why a batch exists
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    /// Stock entered when the product was created
    Opening,
    /// Stock received through a purchase
    Receipt,
    /// Positive manual correction from the stock maintenance screen
    ManualIncrease,
    /// Correction entered while editing a product
    Adjustment,
    /// Stock restored by reversing an outbound record
    Reversal,
    /// Negative entry that cancels a storeroom's on-hand stock
    ZeroOut,
}

impl BatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            BatchKind::Opening => "initial stock",
            BatchKind::Receipt => "purchase",
            BatchKind::ManualIncrease => "manual increase",
            BatchKind::Adjustment => "manual adjustment",
            BatchKind::Reversal => "reversal",
            BatchKind::ZeroOut => "zero-out",
        }
    }
}

impl std::fmt::Display for BatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Stock expressed as whole boxes plus loose pieces
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockBreakdown {
    pub boxes: i64,
    pub pieces: i64,
}

/// Split a piece count into boxes and remaining pieces; box size 1 yields pieces only
pub fn split_stock(quantity: i64, box_size: u32) -> StockBreakdown {
    if box_size <= 1 {
        return StockBreakdown {
            boxes: 0,
            pieces: quantity,
        };
    }
    let size = i64::from(box_size);
    StockBreakdown {
        boxes: quantity.div_euclid(size),
        pieces: quantity.rem_euclid(size),
    }
}
