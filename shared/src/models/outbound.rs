//! Outbound (sales) models and the pending checkout cart

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{flexible_time, ProductId, StoreroomId};

/// An outbound history row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundRecord {
    pub id: String,
    /// Checkout this row was confirmed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub storeroom_id: StoreroomId,
    /// Quantity as entered, in the chosen unit
    pub quantity: i64,
    #[serde(default)]
    pub unit_name: String,
    /// Base pieces removed from stock
    pub deducted_qty: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sales: Option<Decimal>,
    /// Estimated cost of goods at staging time
    #[serde(default)]
    pub total_value: Decimal,
    #[serde(with = "flexible_time")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub remark: String,
}

impl OutboundRecord {
    /// Sales amount, falling back to the cost value for rows written before sales were tracked
    pub fn sales_amount(&self) -> Decimal {
        self.total_sales.unwrap_or(self.total_value)
    }

    /// Price per entered unit, derived from the cost value when no selling price was kept
    pub fn unit_price(&self) -> Decimal {
        match self.selling_price {
            Some(price) => price,
            None => self.total_value / Decimal::from(self.quantity.max(1)),
        }
    }
}

/// Unit an outbound quantity is entered in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SaleUnit {
    #[default]
    Piece,
    Box,
    /// Arbitrary pack of `multiplier` pieces
    Custom { multiplier: u32 },
}

impl SaleUnit {
    /// Base pieces per entered unit
    pub fn multiplier(&self, box_size: u32) -> u32 {
        match self {
            SaleUnit::Piece => 1,
            SaleUnit::Box => box_size.max(1),
            SaleUnit::Custom { multiplier } => (*multiplier).max(1),
        }
    }
}

/// A line staged for the next checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub product_id: ProductId,
    pub storeroom_id: StoreroomId,
    pub product_name: String,
    pub input_qty: i64,
    pub deduction_qty: i64,
    pub unit_name: String,
    /// Price per entered unit
    pub selling_price: Decimal,
    pub total_sales: Decimal,
    /// Deduction times the reference cost at staging time
    pub estimated_value: Decimal,
}

/// Pending outbound lines
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutboundCart {
    lines: Vec<CartLine>,
}

impl OutboundCart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Pieces of a product already staged against a storeroom
    pub fn reserved(&self, product_id: ProductId, storeroom: StoreroomId) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id && l.storeroom_id == storeroom)
            .map(|l| l.deduction_qty)
            .sum()
    }

    pub fn push(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    pub fn remove(&mut self, line_id: &str) -> Option<CartLine> {
        let idx = self.lines.iter().position(|l| l.id == line_id)?;
        Some(self.lines.remove(idx))
    }

    pub fn total_sales(&self) -> Decimal {
        self.lines.iter().map(|l| l.total_sales).sum()
    }

    /// Empty the cart, returning what was staged
    pub fn take(&mut self) -> Vec<CartLine> {
        std::mem::take(&mut self.lines)
    }
}

/// Summary handed back after a checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub group_id: String,
    #[serde(with = "flexible_time")]
    pub time: DateTime<Utc>,
    pub remark: String,
    pub lines: Vec<CartLine>,
    pub total_sales: Decimal,
    /// Cost of goods actually consumed from batches
    pub consumed_cost: Decimal,
}

impl Receipt {
    /// Short receipt number, the last six characters of the group id
    pub fn number(&self) -> &str {
        let start = self
            .group_id
            .char_indices()
            .rev()
            .nth(5)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.group_id[start..]
    }
}
