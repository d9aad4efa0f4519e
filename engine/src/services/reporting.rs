//! Read-only views: storeroom dashboard, inventory overview, daily figures and trends

use std::collections::BTreeMap;

use chrono::NaiveDate;
use erawan_shared::ledger::storeroom_valuation;
use erawan_shared::{
    day_of, split_stock, DateRange, OutboundRecord, ProductId, PurchaseRecord, StockBreakdown,
    StoreroomId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::inventory::Inventory;
use crate::store::KeyValueStore;

/// Stock held in one storeroom across all products
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreroomSummary {
    pub storeroom_id: StoreroomId,
    pub name: String,
    /// Net batch quantity
    pub quantity: i64,
    /// Net batch quantity times batch cost
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreroomDetailRow {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub breakdown: StockBreakdown,
    pub cost_price: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreroomDetail {
    pub storeroom_id: StoreroomId,
    pub name: String,
    pub rows: Vec<StoreroomDetailRow>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub product_id: ProductId,
    pub code: String,
    pub name: String,
    pub category: String,
    pub stock: i64,
    pub breakdown: StockBreakdown,
    /// Storerooms holding positive stock
    pub locations: BTreeMap<StoreroomId, i64>,
    pub cost_price: Decimal,
    pub low_stock: bool,
}

/// Money figures for one day
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub outbound_sales: Decimal,
    pub purchase_total: Decimal,
    /// Total stock at reference cost, as of now
    pub stock_value: Decimal,
}

/// Trend window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendRange {
    #[default]
    Week,
    Month,
}

impl TrendRange {
    /// Days before today included in the series
    pub fn days(&self) -> u32 {
        match self {
            TrendRange::Week => 7,
            TrendRange::Month => 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub purchases: Decimal,
    pub sales: Decimal,
}

impl<S: KeyValueStore> Inventory<S> {
    /// Quantity and value per storeroom, all five included
    pub fn storeroom_dashboard(&self) -> Vec<StoreroomSummary> {
        StoreroomId::all()
            .map(|storeroom| {
                let (quantity, value) = self
                    .products()
                    .iter()
                    .map(|p| storeroom_valuation(p, storeroom))
                    .fold((0, Decimal::ZERO), |(q, v), (pq, pv)| (q + pq, v + pv));
                StoreroomSummary {
                    storeroom_id: storeroom,
                    name: self.storeroom_name(storeroom).to_string(),
                    quantity,
                    value,
                }
            })
            .collect()
    }

    /// Products with positive stock in a storeroom, by name
    pub fn storeroom_detail(&self, storeroom: StoreroomId) -> StoreroomDetail {
        let mut rows: Vec<StoreroomDetailRow> = self
            .products()
            .iter()
            .filter(|p| p.on_hand(storeroom) > 0)
            .map(|p| {
                let quantity = p.on_hand(storeroom);
                StoreroomDetailRow {
                    product_id: p.id,
                    name: p.name.clone(),
                    category: p.category.clone(),
                    quantity,
                    breakdown: split_stock(quantity, p.box_size),
                    cost_price: p.cost_price,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        StoreroomDetail {
            storeroom_id: storeroom,
            name: self.storeroom_name(storeroom).to_string(),
            rows,
        }
    }

    /// Every product with its stock and a low-stock flag
    pub fn inventory_overview(&self) -> Vec<InventoryRow> {
        let threshold = self.settings.low_stock_threshold;
        self.products()
            .iter()
            .map(|p| InventoryRow {
                product_id: p.id,
                code: p.code.clone(),
                name: p.name.clone(),
                category: p.category.clone(),
                stock: p.stock,
                breakdown: split_stock(p.stock, p.box_size),
                locations: p
                    .storerooms
                    .iter()
                    .filter(|(_, q)| **q > 0)
                    .map(|(s, q)| (*s, *q))
                    .collect(),
                cost_price: p.cost_price,
                low_stock: p.stock < threshold,
            })
            .collect()
    }

    /// Sales and purchases on `date` plus the current stock value
    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        DailySummary {
            date,
            outbound_sales: self.sales_on(date),
            purchase_total: self.purchases_on(date),
            stock_value: self
                .products()
                .iter()
                .map(|p| Decimal::from(p.stock) * p.cost_price)
                .sum(),
        }
    }

    /// One point per day from `days` before `today` through `today`
    pub fn trend(&self, range: TrendRange, today: NaiveDate) -> Vec<TrendPoint> {
        DateRange::trailing(today, range.days())
            .days()
            .map(|date| TrendPoint {
                date,
                purchases: self.purchases_on(date),
                sales: self.sales_on(date),
            })
            .collect()
    }

    /// Purchases, newest first
    pub fn recent_purchases(&self) -> Vec<&PurchaseRecord> {
        let mut rows: Vec<&PurchaseRecord> = self.purchases().iter().collect();
        rows.sort_by(|a, b| b.time.cmp(&a.time));
        rows.truncate(self.settings.history_limit);
        rows
    }

    /// Outbound rows, newest first
    pub fn recent_outbound(&self) -> Vec<&OutboundRecord> {
        let mut rows: Vec<&OutboundRecord> = self.outbound().iter().collect();
        rows.sort_by(|a, b| b.time.cmp(&a.time));
        rows.truncate(self.settings.history_limit);
        rows
    }

    /// Box and piece split of a product's stock in one storeroom, or overall
    pub fn stock_breakdown(&self, product_id: ProductId, storeroom: Option<StoreroomId>) -> AppResult<StockBreakdown> {
        let product = self.product(product_id)?;
        let quantity = storeroom.map_or(product.stock, |s| product.on_hand(s));
        Ok(split_stock(quantity, product.box_size))
    }

    fn sales_on(&self, date: NaiveDate) -> Decimal {
        self.outbound()
            .iter()
            .filter(|r| day_of(&r.time) == date)
            .map(OutboundRecord::sales_amount)
            .sum()
    }

    fn purchases_on(&self, date: NaiveDate) -> Decimal {
        self.purchases()
            .iter()
            .filter(|r| day_of(&r.time) == date)
            .map(|r| r.total)
            .sum()
    }
}
