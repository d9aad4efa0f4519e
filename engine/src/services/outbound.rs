//! Outbound stock: the checkout cart, checkout and reversal

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use erawan_shared::ledger::{add_batch, consume};
use erawan_shared::{
    validate_available, validate_price, Batch, BatchKind, CartLine, OutboundRecord, Product,
    ProductId, Receipt, SaleUnit, StoreroomId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::inventory::{resolve_time, Inventory};
use crate::services::purchasing::QUANTITY_TOO_LARGE;
use crate::store::{KeyValueStore, StoreKey};

/// Input for staging an outbound line
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StageOutboundInput {
    pub product_id: ProductId,
    #[serde(default)]
    pub storeroom_id: StoreroomId,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i64,
    #[serde(default)]
    pub unit: SaleUnit,
    /// Price per chosen unit; defaults to the reference cost of that unit
    #[serde(default)]
    pub selling_price: Option<Decimal>,
}

/// Input for confirming the cart
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    #[serde(default)]
    pub remark: String,
    #[serde(default, with = "erawan_shared::flexible_time::option")]
    pub time: Option<DateTime<Utc>>,
}

/// Result of reversing an outbound row
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundReversal {
    pub outbound_id: String,
    pub storeroom_id: StoreroomId,
    /// Pieces put back; zero when the product no longer exists
    pub restored: i64,
    /// Current reference cost the restored pieces were booked at
    pub unit_cost: Decimal,
    pub product_found: bool,
}

/// Suggested price per chosen unit, from the product's reference cost
pub fn suggested_price(product: &Product, unit: SaleUnit) -> Decimal {
    match unit {
        SaleUnit::Box => product.box_cost(),
        SaleUnit::Piece | SaleUnit::Custom { .. } => product.cost_price,
    }
}

fn display_unit(product: &Product, unit: SaleUnit) -> String {
    match unit {
        SaleUnit::Piece => product.unit_name.clone(),
        SaleUnit::Box => product.box_unit_name.clone(),
        SaleUnit::Custom { multiplier } => format!("custom(x{})", multiplier.max(1)),
    }
}

impl<S: KeyValueStore> Inventory<S> {
    /// Stage a line for the next checkout after checking it fits the storeroom
    pub fn stage_outbound(&mut self, input: StageOutboundInput) -> AppResult<CartLine> {
        input.validate()?;
        let product = self.product(input.product_id)?;
        let selling_price = input
            .selling_price
            .unwrap_or_else(|| suggested_price(product, input.unit));
        validate_price(selling_price).map_err(|m| AppError::invalid("sellingPrice", m))?;

        let multiplier = input.unit.multiplier(product.box_size);
        let too_large = || AppError::invalid("quantity", QUANTITY_TOO_LARGE);
        let deduction = input
            .quantity
            .checked_mul(i64::from(multiplier))
            .ok_or_else(too_large)?;
        let total_sales = selling_price
            .checked_mul(Decimal::from(input.quantity))
            .ok_or_else(too_large)?;
        let estimated_value = Decimal::from(deduction)
            .checked_mul(product.cost_price)
            .ok_or_else(too_large)?;
        let on_hand = product.on_hand(input.storeroom_id);
        let reserved = self.cart.reserved(product.id, input.storeroom_id);

        if validate_available(on_hand, reserved, deduction).is_err() {
            warn!(
                product_id = %product.id,
                storeroom = %input.storeroom_id,
                requested = deduction,
                on_hand,
                reserved,
                "Outbound line rejected"
            );
            return Err(AppError::InsufficientStock {
                product: product.name.clone(),
                storeroom: input.storeroom_id,
                requested: deduction,
                available: on_hand - reserved,
            });
        }

        let line = CartLine {
            id: Uuid::new_v4().to_string(),
            product_id: product.id,
            storeroom_id: input.storeroom_id,
            product_name: product.name.clone(),
            input_qty: input.quantity,
            deduction_qty: deduction,
            unit_name: display_unit(product, input.unit),
            selling_price,
            total_sales,
            estimated_value,
        };
        debug!(line_id = %line.id, deduction, "Outbound line staged");
        self.cart.push(line.clone());
        Ok(line)
    }

    pub fn unstage_outbound(&mut self, line_id: &str) -> AppResult<CartLine> {
        self.cart
            .remove(line_id)
            .ok_or_else(|| AppError::NotFound(format!("Cart line {}", line_id)))
    }

    /// Drop every staged line, returning how many there were
    pub fn clear_cart(&mut self) -> usize {
        self.cart.take().len()
    }

    /// Consume stock for every staged line and log one outbound row per line
    pub fn checkout(&mut self, input: CheckoutInput) -> AppResult<Receipt> {
        if self.cart.is_empty() {
            return Err(AppError::ValidationError("Outbound cart is empty".to_string()));
        }
        self.verify_cart()?;

        let time = resolve_time(input.time);
        let group_id = Uuid::new_v4().simple().to_string();
        let lines = self.cart.take();
        let mut consumed_cost = Decimal::ZERO;
        let mut rows = Vec::with_capacity(lines.len());

        for line in &lines {
            let product = self.product_mut(line.product_id)?;
            let outcome = consume(product, line.storeroom_id, line.deduction_qty);
            if !outcome.is_complete() {
                warn!(
                    product_id = %line.product_id,
                    storeroom = %line.storeroom_id,
                    shortfall = outcome.shortfall,
                    "Checkout line only partially covered by batches"
                );
            }
            consumed_cost += outcome.cost;

            rows.push(OutboundRecord {
                id: Uuid::new_v4().to_string(),
                group_id: Some(group_id.clone()),
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                storeroom_id: line.storeroom_id,
                quantity: line.input_qty,
                unit_name: line.unit_name.clone(),
                deducted_qty: line.deduction_qty,
                selling_price: Some(line.selling_price),
                total_sales: Some(line.total_sales),
                // estimate taken when the line was staged
                total_value: line.estimated_value,
                time,
                remark: input.remark.clone(),
            });
        }
        self.state_mut().outbound.extend(rows);

        let total_sales: Decimal = lines.iter().map(|l| l.total_sales).sum();
        info!(
            group_id = %group_id,
            lines = lines.len(),
            total_sales = %total_sales,
            consumed_cost = %consumed_cost,
            "Checkout confirmed"
        );

        self.persist(&[StoreKey::Products, StoreKey::Outbound])?;
        Ok(Receipt {
            group_id,
            time,
            remark: input.remark,
            lines,
            total_sales,
            consumed_cost,
        })
    }

    /// Check every staged line against current stock before anything is consumed
    fn verify_cart(&self) -> AppResult<()> {
        let mut demand: BTreeMap<(ProductId, StoreroomId), i64> = BTreeMap::new();
        for line in self.cart.lines() {
            *demand.entry((line.product_id, line.storeroom_id)).or_insert(0) += line.deduction_qty;
        }
        for ((product_id, storeroom), requested) in demand {
            let product = self.product(product_id)?;
            let available = product.on_hand(storeroom);
            if available < requested {
                return Err(AppError::InsufficientStock {
                    product: product.name.clone(),
                    storeroom,
                    requested,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Put an outbound row's pieces back as a new batch at today's cost and drop the row
    pub fn reverse_outbound(&mut self, outbound_id: &str) -> AppResult<OutboundReversal> {
        let state = self.state_mut();
        let idx = state
            .outbound
            .iter()
            .position(|r| r.id == outbound_id)
            .ok_or_else(|| AppError::NotFound(format!("Outbound record {}", outbound_id)))?;
        let record = state.outbound.remove(idx);
        let storeroom = record.storeroom_id;

        let reversal = match state.product_mut(record.product_id) {
            Some(product) => {
                let unit_cost = product.cost_price;
                let batch = Batch::new(
                    BatchKind::Reversal,
                    storeroom,
                    record.deducted_qty,
                    unit_cost,
                    Utc::now(),
                );
                add_batch(product, batch);
                info!(
                    outbound_id,
                    product_id = %record.product_id,
                    restored = record.deducted_qty,
                    "Outbound reversed"
                );
                OutboundReversal {
                    outbound_id: outbound_id.to_string(),
                    storeroom_id: storeroom,
                    restored: record.deducted_qty,
                    unit_cost,
                    product_found: true,
                }
            }
            None => {
                warn!(
                    outbound_id,
                    product_id = %record.product_id,
                    "Outbound row removed; product no longer exists, nothing restored"
                );
                OutboundReversal {
                    outbound_id: outbound_id.to_string(),
                    storeroom_id: storeroom,
                    restored: 0,
                    unit_cost: Decimal::ZERO,
                    product_found: false,
                }
            }
        };

        self.persist(&[StoreKey::Products, StoreKey::Outbound])?;
        Ok(reversal)
    }
}
