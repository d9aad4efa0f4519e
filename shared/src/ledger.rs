//! Batch stock accounting
//!
//! Every unit of stock lives in a [`Batch`] tied to a storeroom and a unit cost.
//! Inbound stock appends a batch; outbound stock consumes batches oldest first.
//! The per-storeroom quantities and total stock on a [`Product`] are derived and
//! are rebuilt by [`recompute_totals`] after every change to the batch list.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Batch, BatchKind, Product};
use crate::types::StoreroomId;

/// Result of consuming stock from one storeroom
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumeOutcome {
    pub requested: i64,
    pub consumed: i64,
    /// Pieces that could not be covered by batches
    pub shortfall: i64,
    /// Cost of goods taken from the consumed batches
    pub cost: Decimal,
}

impl ConsumeOutcome {
    /// Whether the full request was covered
    pub fn is_complete(&self) -> bool {
        self.shortfall == 0
    }
}

/// Result of zeroing a storeroom
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ZeroOutOutcome {
    /// A correction batch cancelling `cleared` pieces was appended
    Applied { cleared: i64 },
    /// The storeroom already held nothing
    AlreadyZero,
}

/// Rebuild `storerooms` and `stock` from the batch list.
///
/// All storerooms are present afterwards, empty ones at 0.
pub fn recompute_totals(product: &mut Product) {
    let mut totals: std::collections::BTreeMap<StoreroomId, i64> =
        StoreroomId::all().map(|s| (s, 0)).collect();
    for batch in &product.batches {
        *totals.entry(batch.storeroom).or_insert(0) += batch.quantity;
    }
    product.stock = totals.values().sum();
    product.storerooms = totals;
}

/// Append a batch as its own ledger line and recompute totals
pub fn add_batch(product: &mut Product, batch: Batch) {
    product.batches.push(batch);
    recompute_totals(product);
}

/// Remove `quantity` pieces from a storeroom, oldest batches first.
///
/// A batch larger than what is still needed is decremented in place; any other
/// batch is removed whole. Correction entries are netted when reached. If the
/// storeroom runs dry the outcome carries a shortfall and nothing is rolled
/// back, so callers check availability first.
pub fn consume(product: &mut Product, storeroom: StoreroomId, quantity: i64) -> ConsumeOutcome {
    let mut order: Vec<usize> = product
        .batches
        .iter()
        .enumerate()
        .filter(|(_, b)| b.storeroom == storeroom)
        .map(|(i, _)| i)
        .collect();
    // stable: equal timestamps keep insertion order
    order.sort_by_key(|&i| product.batches[i].timestamp);

    let mut remaining = quantity;
    let mut cost = Decimal::ZERO;
    let mut exhausted = Vec::new();

    for idx in order {
        if remaining <= 0 {
            break;
        }
        let batch = &mut product.batches[idx];
        if batch.quantity > remaining {
            cost += batch.unit_cost * Decimal::from(remaining);
            batch.quantity -= remaining;
            remaining = 0;
        } else {
            cost += batch.value();
            remaining -= batch.quantity;
            exhausted.push(idx);
        }
    }

    exhausted.sort_unstable();
    for idx in exhausted.into_iter().rev() {
        product.batches.remove(idx);
    }
    recompute_totals(product);

    let shortfall = remaining.max(0);
    ConsumeOutcome {
        requested: quantity,
        consumed: (quantity - shortfall).max(0),
        shortfall,
        cost,
    }
}

/// Cancel a storeroom's on-hand stock with a negative correction batch
pub fn zero_out(product: &mut Product, storeroom: StoreroomId, at: DateTime<Utc>) -> ZeroOutOutcome {
    let on_hand = product.on_hand(storeroom);
    if on_hand == 0 {
        return ZeroOutOutcome::AlreadyZero;
    }
    let correction = Batch::new(BatchKind::ZeroOut, storeroom, -on_hand, product.cost_price, at);
    add_batch(product, correction);
    ZeroOutOutcome::Applied { cleared: on_hand }
}

/// Take a batch out of the ledger by its id, whole
pub fn remove_batch(product: &mut Product, batch_id: &str) -> Option<Batch> {
    let idx = product
        .batches
        .iter()
        .position(|b| b.batch_id.as_deref() == Some(batch_id))?;
    let batch = product.batches.remove(idx);
    recompute_totals(product);
    Some(batch)
}

/// Quantity and cost value of a product's batches in one storeroom
pub fn storeroom_valuation(product: &Product, storeroom: StoreroomId) -> (i64, Decimal) {
    product
        .batches
        .iter()
        .filter(|b| b.storeroom == storeroom)
        .fold((0, Decimal::ZERO), |(qty, value), b| {
            (qty + b.quantity, value + b.value())
        })
}

/// Whether derived totals agree with the batch list
pub fn totals_consistent(product: &Product) -> bool {
    let mut check = product.clone();
    recompute_totals(&mut check);
    check.storerooms == product.storerooms && check.stock == product.stock
}
