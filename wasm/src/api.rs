//! JSON in, JSON out
//!
//! Every browser-facing call goes through one of these functions. They work on
//! any store so they can be exercised natively against a `MemoryStore`.

use chrono::NaiveDate;
use erawan_engine::{
    suggested_price, AdjustStockInput, AppError, AppResult, CheckoutInput, CreateProductInput,
    Inventory, KeyValueStore, RecordPurchaseInput, StageOutboundInput, TrendRange,
    UpdateProductInput,
};
use erawan_shared::{backup_file_name, ProductId, SaleUnit, StoreroomId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

fn parse<T: DeserializeOwned>(text: &str) -> AppResult<T> {
    serde_json::from_str(text).map_err(|e| AppError::ValidationError(format!("Invalid request: {}", e)))
}

fn respond<T: Serialize>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn storeroom(id: u8) -> AppResult<StoreroomId> {
    StoreroomId::new(id).map_err(|e| AppError::invalid("storeroomId", &e.to_string()))
}

fn date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::invalid("date", "Expected a YYYY-MM-DD date"))
}

// ============================================================================
// Catalog
// ============================================================================

pub fn list_products<S: KeyValueStore>(inv: &Inventory<S>, category: Option<&str>) -> AppResult<String> {
    respond(&inv.list_products(category))
}

pub fn create_product<S: KeyValueStore>(inv: &mut Inventory<S>, input: &str) -> AppResult<String> {
    let input: CreateProductInput = parse(input)?;
    respond(&inv.create_product(input)?)
}

pub fn update_product<S: KeyValueStore>(inv: &mut Inventory<S>, id: u32, input: &str) -> AppResult<String> {
    let input: UpdateProductInput = parse(input)?;
    respond(&inv.update_product(ProductId(id), input)?)
}

pub fn delete_product<S: KeyValueStore>(inv: &mut Inventory<S>, id: u32) -> AppResult<String> {
    respond(&inv.delete_product(ProductId(id))?)
}

pub fn search_products<S: KeyValueStore>(
    inv: &Inventory<S>,
    query: &str,
    storeroom_id: Option<u8>,
) -> AppResult<String> {
    let storeroom_id = storeroom_id.map(storeroom).transpose()?;
    respond(&inv.search_products(query, storeroom_id))
}

pub fn categories<S: KeyValueStore>(inv: &Inventory<S>) -> AppResult<String> {
    respond(&inv.categories())
}

pub fn add_category<S: KeyValueStore>(inv: &mut Inventory<S>, name: &str) -> AppResult<String> {
    inv.add_category(name)?;
    categories(inv)
}

pub fn delete_category<S: KeyValueStore>(inv: &mut Inventory<S>, name: &str) -> AppResult<String> {
    inv.delete_category(name)?;
    categories(inv)
}

pub fn storeroom_names<S: KeyValueStore>(inv: &Inventory<S>) -> AppResult<String> {
    respond(inv.storeroom_names())
}

pub fn rename_storeroom<S: KeyValueStore>(inv: &mut Inventory<S>, id: u8, name: &str) -> AppResult<String> {
    inv.rename_storeroom(storeroom(id)?, name)?;
    storeroom_names(inv)
}

/// Default selling price for a product in the given sale unit
pub fn suggested_selling_price<S: KeyValueStore>(inv: &Inventory<S>, id: u32, unit: &str) -> AppResult<String> {
    let unit: SaleUnit = parse(unit)?;
    let product = inv.product(ProductId(id))?;
    respond(&suggested_price(product, unit))
}

// ============================================================================
// Stock movements
// ============================================================================

pub fn record_purchase<S: KeyValueStore>(inv: &mut Inventory<S>, input: &str) -> AppResult<String> {
    let input: RecordPurchaseInput = parse(input)?;
    respond(&inv.record_purchase(input)?)
}

pub fn delete_purchase<S: KeyValueStore>(inv: &mut Inventory<S>, purchase_id: &str) -> AppResult<String> {
    respond(&inv.delete_purchase(purchase_id)?)
}

pub fn stage_outbound<S: KeyValueStore>(inv: &mut Inventory<S>, input: &str) -> AppResult<String> {
    let input: StageOutboundInput = parse(input)?;
    respond(&inv.stage_outbound(input)?)
}

pub fn unstage_outbound<S: KeyValueStore>(inv: &mut Inventory<S>, line_id: &str) -> AppResult<String> {
    respond(&inv.unstage_outbound(line_id)?)
}

/// Staged lines together with their running sales total
pub fn cart<S: KeyValueStore>(inv: &Inventory<S>) -> AppResult<String> {
    let cart = inv.cart();
    respond(&json!({
        "lines": cart.lines(),
        "totalSales": cart.total_sales(),
    }))
}

pub fn clear_cart<S: KeyValueStore>(inv: &mut Inventory<S>) -> AppResult<String> {
    respond(&json!({ "cleared": inv.clear_cart() }))
}

pub fn checkout<S: KeyValueStore>(inv: &mut Inventory<S>, input: &str) -> AppResult<String> {
    let input: CheckoutInput = if input.trim().is_empty() {
        CheckoutInput::default()
    } else {
        parse(input)?
    };
    let receipt = inv.checkout(input)?;
    let mut value = serde_json::to_value(&receipt)?;
    if let Value::Object(map) = &mut value {
        map.insert("number".into(), Value::from(receipt.number()));
    }
    respond(&value)
}

pub fn reverse_outbound<S: KeyValueStore>(inv: &mut Inventory<S>, outbound_id: &str) -> AppResult<String> {
    respond(&inv.reverse_outbound(outbound_id)?)
}

pub fn adjust_stock<S: KeyValueStore>(inv: &mut Inventory<S>, input: &str) -> AppResult<String> {
    let input: AdjustStockInput = parse(input)?;
    respond(&inv.adjust_stock(input)?)
}

pub fn zero_out_stock<S: KeyValueStore>(inv: &mut Inventory<S>, id: u32, storeroom_id: u8) -> AppResult<String> {
    respond(&inv.zero_out_stock(ProductId(id), storeroom(storeroom_id)?)?)
}

// ============================================================================
// Reports
// ============================================================================

pub fn storeroom_dashboard<S: KeyValueStore>(inv: &Inventory<S>) -> AppResult<String> {
    respond(&inv.storeroom_dashboard())
}

pub fn storeroom_detail<S: KeyValueStore>(inv: &Inventory<S>, storeroom_id: u8) -> AppResult<String> {
    respond(&inv.storeroom_detail(storeroom(storeroom_id)?))
}

pub fn inventory_overview<S: KeyValueStore>(inv: &Inventory<S>) -> AppResult<String> {
    respond(&inv.inventory_overview())
}

pub fn daily_summary<S: KeyValueStore>(inv: &Inventory<S>, day: &str) -> AppResult<String> {
    respond(&inv.daily_summary(date(day)?))
}

/// `range` is `week` or `month`
pub fn trend<S: KeyValueStore>(inv: &Inventory<S>, range: &str, today: &str) -> AppResult<String> {
    let range: TrendRange = serde_json::from_value(Value::from(range.trim()))
        .map_err(|_| AppError::invalid("range", "Expected week or month"))?;
    respond(&inv.trend(range, date(today)?))
}

pub fn recent_purchases<S: KeyValueStore>(inv: &Inventory<S>) -> AppResult<String> {
    respond(&inv.recent_purchases())
}

pub fn recent_outbound<S: KeyValueStore>(inv: &Inventory<S>) -> AppResult<String> {
    respond(&inv.recent_outbound())
}

pub fn stock_breakdown<S: KeyValueStore>(inv: &Inventory<S>, id: u32, storeroom_id: Option<u8>) -> AppResult<String> {
    let storeroom_id = storeroom_id.map(storeroom).transpose()?;
    respond(&inv.stock_breakdown(ProductId(id), storeroom_id)?)
}

// ============================================================================
// Backup
// ============================================================================

/// Backup document plus the file name to offer for download
pub fn export_backup<S: KeyValueStore>(inv: &Inventory<S>, today: &str) -> AppResult<String> {
    respond(&json!({
        "fileName": backup_file_name(date(today)?),
        "document": inv.export(),
    }))
}

pub fn import_backup<S: KeyValueStore>(inv: &mut Inventory<S>, text: &str) -> AppResult<String> {
    respond(&inv.import_json(text)?)
}

/// Error payload for the browser: `{ code, message, field? }`
pub fn error_json(error: &AppError) -> String {
    serde_json::to_string(&error.detail()).unwrap_or_else(|_| error.to_string())
}
