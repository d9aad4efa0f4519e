//! Manual stock maintenance

use chrono::Utc;
use erawan_shared::ledger::{add_batch, consume, zero_out, ZeroOutOutcome};
use erawan_shared::{validate_adjustment, Batch, BatchKind, ProductId, StoreroomId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::inventory::Inventory;
use crate::store::{KeyValueStore, StoreKey};

/// Input for a manual stock change in one storeroom
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockInput {
    pub product_id: ProductId,
    #[serde(default)]
    pub storeroom_id: StoreroomId,
    /// Positive adds a batch at the current cost, negative consumes oldest first
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub storeroom_id: StoreroomId,
    pub quantity: i64,
    /// Storeroom quantity after the change
    pub on_hand: i64,
    /// Batch cost taken out by a decrease
    pub consumed_cost: Decimal,
}

impl<S: KeyValueStore> Inventory<S> {
    pub fn adjust_stock(&mut self, input: AdjustStockInput) -> AppResult<StockAdjustment> {
        validate_adjustment(input.quantity).map_err(|m| AppError::invalid("quantity", m))?;
        let storeroom = input.storeroom_id;
        let product = self.product_mut(input.product_id)?;

        let consumed_cost = if input.quantity > 0 {
            let batch = Batch::new(
                BatchKind::ManualIncrease,
                storeroom,
                input.quantity,
                product.cost_price,
                Utc::now(),
            );
            add_batch(product, batch);
            Decimal::ZERO
        } else {
            let requested = -input.quantity;
            let available = product.on_hand(storeroom);
            if available < requested {
                return Err(AppError::InsufficientStock {
                    product: product.name.clone(),
                    storeroom,
                    requested,
                    available,
                });
            }
            consume(product, storeroom, requested).cost
        };

        let on_hand = product.on_hand(storeroom);
        info!(
            product_id = %input.product_id,
            storeroom = %storeroom,
            quantity = input.quantity,
            on_hand,
            "Stock adjusted"
        );

        self.persist(&[StoreKey::Products])?;
        Ok(StockAdjustment {
            product_id: input.product_id,
            storeroom_id: storeroom,
            quantity: input.quantity,
            on_hand,
            consumed_cost,
        })
    }

    /// Book a correction that brings a storeroom to zero
    pub fn zero_out_stock(&mut self, product_id: ProductId, storeroom: StoreroomId) -> AppResult<ZeroOutOutcome> {
        let product = self.product_mut(product_id)?;
        let outcome = zero_out(product, storeroom, Utc::now());

        match outcome {
            ZeroOutOutcome::Applied { cleared } => {
                info!(product_id = %product_id, storeroom = %storeroom, cleared, "Storeroom zeroed");
                self.persist(&[StoreKey::Products])?;
            }
            ZeroOutOutcome::AlreadyZero => {
                info!(product_id = %product_id, storeroom = %storeroom, "Storeroom already empty");
            }
        }
        Ok(outcome)
    }
}
