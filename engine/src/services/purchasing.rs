//! Inbound stock: recording and deleting purchases

use chrono::{DateTime, Utc};
use erawan_shared::ledger::{add_batch, remove_batch};
use erawan_shared::{
    to_base_units, validate_price, validate_quantity, Batch, BatchKind, Product, ProductId,
    PurchaseRecord, PurchaseUnit, StoreroomId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::inventory::{resolve_time, Inventory};
use crate::store::{KeyValueStore, StoreKey};

pub(crate) const QUANTITY_TOO_LARGE: &str = "Quantity is too large";

/// Input for recording a purchase
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPurchaseInput {
    /// Known product; takes precedence over `product_name`
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Used to find or create the product when no id is given
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub storeroom_id: StoreroomId,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i64,
    #[serde(default)]
    pub unit: PurchaseUnit,
    /// Price per chosen unit
    pub price: Decimal,
    #[serde(default, with = "erawan_shared::flexible_time::option")]
    pub time: Option<DateTime<Utc>>,
}

/// Result of a recorded purchase
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOutcome {
    pub record: PurchaseRecord,
    /// Pieces added to the storeroom
    pub pieces_added: i64,
    pub unit_cost: Decimal,
    /// Whether the product was created by this purchase
    pub product_created: bool,
}

/// Result of deleting a purchase row
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDeletion {
    pub purchase_id: String,
    /// False when the batch was already consumed or the product is gone
    pub batch_reverted: bool,
}

impl<S: KeyValueStore> Inventory<S> {
    /// Receive stock as a new batch and log the purchase
    pub fn record_purchase(&mut self, input: RecordPurchaseInput) -> AppResult<PurchaseOutcome> {
        input.validate()?;
        validate_quantity(input.quantity).map_err(|m| AppError::invalid("quantity", m))?;
        validate_price(input.price).map_err(|m| AppError::invalid("price", m))?;
        let total = input
            .price
            .checked_mul(Decimal::from(input.quantity))
            .ok_or_else(|| AppError::invalid("quantity", QUANTITY_TOO_LARGE))?;

        let (product_id, product_created) = self.resolve_purchase_product(&input)?;
        let time = resolve_time(input.time);
        let batch_id = format!("B_{}", Uuid::new_v4().simple());

        let product = self.product_mut(product_id)?;
        // products created here have a box size of 1 and never fail to convert
        let base = to_base_units(input.quantity, input.price, input.unit, product.box_size)
            .ok_or_else(|| AppError::invalid("quantity", QUANTITY_TOO_LARGE))?;
        let unit_str = if base.boxed {
            product.box_unit_name.clone()
        } else {
            product.unit_name.clone()
        };

        let batch = Batch::new(
            BatchKind::Receipt,
            input.storeroom_id,
            base.quantity,
            base.unit_cost,
            time,
        )
        .with_batch_id(batch_id.clone());
        add_batch(product, batch);
        // last purchase price, not a weighted average
        product.cost_price = base.unit_cost;

        let record = PurchaseRecord {
            id: Uuid::new_v4().to_string(),
            batch_id: Some(batch_id),
            product_id,
            product_name: product.name.clone(),
            storeroom_id: input.storeroom_id,
            quantity: input.quantity,
            unit_str,
            price: input.price,
            total,
            time,
        };
        self.state_mut().purchases.push(record.clone());

        info!(
            product_id = %product_id,
            storeroom = %input.storeroom_id,
            pieces = base.quantity,
            unit_cost = %base.unit_cost,
            "Purchase recorded"
        );

        let mut keys = vec![StoreKey::Products, StoreKey::Purchases];
        if product_created {
            keys.push(StoreKey::ProductIdCounter);
        }
        self.persist(&keys)?;

        Ok(PurchaseOutcome {
            record,
            pieces_added: base.quantity,
            unit_cost: base.unit_cost,
            product_created,
        })
    }

    /// Find the product a purchase refers to, creating it if allowed
    fn resolve_purchase_product(&mut self, input: &RecordPurchaseInput) -> AppResult<(ProductId, bool)> {
        if let Some(id) = input.product_id {
            if self.state().product(id).is_some() {
                return Ok((id, false));
            }
            if input.product_name.is_none() {
                return Err(AppError::NotFound(format!("Product {}", id)));
            }
        }

        let name = input
            .product_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::invalid("productName", "Product name is required"))?;

        if let Some(existing) = self.state().product_by_name(name) {
            return Ok((existing.id, false));
        }
        if !self.settings.auto_create_products {
            return Err(AppError::NotFound(format!("Product {}", name)));
        }

        let id = self.state_mut().allocate_product_id();
        let mut product = Product::new(id, name, self.catalog.fallback_category.clone());
        product.unit_name = self.catalog.default_unit_name.clone();
        product.box_unit_name = self.catalog.default_box_unit_name.clone();
        product.created_at = Some(Utc::now());
        self.state_mut().products.push(product);
        info!(product_id = %id, name, "Product created from purchase");
        Ok((id, true))
    }

    /// Delete a purchase row and take its batch back out if it is still whole
    pub fn delete_purchase(&mut self, purchase_id: &str) -> AppResult<PurchaseDeletion> {
        let state = self.state_mut();
        let idx = state
            .purchases
            .iter()
            .position(|r| r.id == purchase_id)
            .ok_or_else(|| AppError::NotFound(format!("Purchase {}", purchase_id)))?;
        let record = state.purchases.remove(idx);

        let reverted = match (&record.batch_id, state.product_mut(record.product_id)) {
            (Some(batch_id), Some(product)) => remove_batch(product, batch_id).is_some(),
            _ => false,
        };

        if reverted {
            info!(purchase_id, product_id = %record.product_id, "Purchase deleted, batch removed");
        } else {
            warn!(
                purchase_id,
                product_id = %record.product_id,
                "Purchase deleted without stock reversal; batch already consumed or missing"
            );
        }

        self.persist(&[StoreKey::Products, StoreKey::Purchases])?;
        Ok(PurchaseDeletion {
            purchase_id: purchase_id.to_string(),
            batch_reverted: reverted,
        })
    }
}
