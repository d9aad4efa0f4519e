//! WebAssembly module for Erawan WMS
//!
//! Runs the whole warehouse in the browser on top of `localStorage`:
//! - [`WmsHandle`] exposes every warehouse operation as JSON in, JSON out
//! - Errors reach JavaScript as `Error` objects whose message is `{ code, message, field? }`
//! - A few pure helpers for form previews need no handle at all

mod api;
mod storage;

use std::str::FromStr;

use erawan_engine::{AppError, Inventory};
use erawan_shared::{split_stock, to_base_units, PurchaseUnit};
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

pub use storage::LocalStorage;

fn to_js(error: AppError) -> JsValue {
    js_sys::Error::new(&api::error_json(&error)).into()
}

/// The warehouse held in this browser's `localStorage`
#[wasm_bindgen]
pub struct WmsHandle {
    inventory: Inventory<LocalStorage>,
}

#[wasm_bindgen]
impl WmsHandle {
    /// Load (and migrate, if needed) the stored warehouse
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WmsHandle, JsValue> {
        let store = LocalStorage::open().map_err(to_js)?;
        let inventory = Inventory::with_defaults(store).map_err(to_js)?;
        Ok(WmsHandle { inventory })
    }

    /// Re-read everything from storage, dropping the cart
    pub fn reload(&mut self) -> Result<(), JsValue> {
        self.inventory.reload().map_err(to_js)
    }

    // Catalog

    #[wasm_bindgen(js_name = listProducts)]
    pub fn list_products(&self, category: Option<String>) -> Result<String, JsValue> {
        api::list_products(&self.inventory, category.as_deref()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = createProduct)]
    pub fn create_product(&mut self, input: &str) -> Result<String, JsValue> {
        api::create_product(&mut self.inventory, input).map_err(to_js)
    }

    #[wasm_bindgen(js_name = updateProduct)]
    pub fn update_product(&mut self, id: u32, input: &str) -> Result<String, JsValue> {
        api::update_product(&mut self.inventory, id, input).map_err(to_js)
    }

    #[wasm_bindgen(js_name = deleteProduct)]
    pub fn delete_product(&mut self, id: u32) -> Result<String, JsValue> {
        api::delete_product(&mut self.inventory, id).map_err(to_js)
    }

    #[wasm_bindgen(js_name = searchProducts)]
    pub fn search_products(&self, query: &str, storeroom_id: Option<u8>) -> Result<String, JsValue> {
        api::search_products(&self.inventory, query, storeroom_id).map_err(to_js)
    }

    pub fn categories(&self) -> Result<String, JsValue> {
        api::categories(&self.inventory).map_err(to_js)
    }

    #[wasm_bindgen(js_name = addCategory)]
    pub fn add_category(&mut self, name: &str) -> Result<String, JsValue> {
        api::add_category(&mut self.inventory, name).map_err(to_js)
    }

    #[wasm_bindgen(js_name = deleteCategory)]
    pub fn delete_category(&mut self, name: &str) -> Result<String, JsValue> {
        api::delete_category(&mut self.inventory, name).map_err(to_js)
    }

    #[wasm_bindgen(js_name = storeroomNames)]
    pub fn storeroom_names(&self) -> Result<String, JsValue> {
        api::storeroom_names(&self.inventory).map_err(to_js)
    }

    #[wasm_bindgen(js_name = renameStoreroom)]
    pub fn rename_storeroom(&mut self, id: u8, name: &str) -> Result<String, JsValue> {
        api::rename_storeroom(&mut self.inventory, id, name).map_err(to_js)
    }

    #[wasm_bindgen(js_name = suggestedPrice)]
    pub fn suggested_price(&self, id: u32, unit: &str) -> Result<String, JsValue> {
        api::suggested_selling_price(&self.inventory, id, unit).map_err(to_js)
    }

    // Stock movements

    #[wasm_bindgen(js_name = recordPurchase)]
    pub fn record_purchase(&mut self, input: &str) -> Result<String, JsValue> {
        api::record_purchase(&mut self.inventory, input).map_err(to_js)
    }

    #[wasm_bindgen(js_name = deletePurchase)]
    pub fn delete_purchase(&mut self, purchase_id: &str) -> Result<String, JsValue> {
        api::delete_purchase(&mut self.inventory, purchase_id).map_err(to_js)
    }

    #[wasm_bindgen(js_name = stageOutbound)]
    pub fn stage_outbound(&mut self, input: &str) -> Result<String, JsValue> {
        api::stage_outbound(&mut self.inventory, input).map_err(to_js)
    }

    #[wasm_bindgen(js_name = unstageOutbound)]
    pub fn unstage_outbound(&mut self, line_id: &str) -> Result<String, JsValue> {
        api::unstage_outbound(&mut self.inventory, line_id).map_err(to_js)
    }

    pub fn cart(&self) -> Result<String, JsValue> {
        api::cart(&self.inventory).map_err(to_js)
    }

    #[wasm_bindgen(js_name = clearCart)]
    pub fn clear_cart(&mut self) -> Result<String, JsValue> {
        api::clear_cart(&mut self.inventory).map_err(to_js)
    }

    pub fn checkout(&mut self, input: &str) -> Result<String, JsValue> {
        api::checkout(&mut self.inventory, input).map_err(to_js)
    }

    #[wasm_bindgen(js_name = reverseOutbound)]
    pub fn reverse_outbound(&mut self, outbound_id: &str) -> Result<String, JsValue> {
        api::reverse_outbound(&mut self.inventory, outbound_id).map_err(to_js)
    }

    #[wasm_bindgen(js_name = adjustStock)]
    pub fn adjust_stock(&mut self, input: &str) -> Result<String, JsValue> {
        api::adjust_stock(&mut self.inventory, input).map_err(to_js)
    }

    #[wasm_bindgen(js_name = zeroOutStock)]
    pub fn zero_out_stock(&mut self, id: u32, storeroom_id: u8) -> Result<String, JsValue> {
        api::zero_out_stock(&mut self.inventory, id, storeroom_id).map_err(to_js)
    }

    // Reports

    #[wasm_bindgen(js_name = storeroomDashboard)]
    pub fn storeroom_dashboard(&self) -> Result<String, JsValue> {
        api::storeroom_dashboard(&self.inventory).map_err(to_js)
    }

    #[wasm_bindgen(js_name = storeroomDetail)]
    pub fn storeroom_detail(&self, storeroom_id: u8) -> Result<String, JsValue> {
        api::storeroom_detail(&self.inventory, storeroom_id).map_err(to_js)
    }

    #[wasm_bindgen(js_name = inventoryOverview)]
    pub fn inventory_overview(&self) -> Result<String, JsValue> {
        api::inventory_overview(&self.inventory).map_err(to_js)
    }

    #[wasm_bindgen(js_name = dailySummary)]
    pub fn daily_summary(&self, date: &str) -> Result<String, JsValue> {
        api::daily_summary(&self.inventory, date).map_err(to_js)
    }

    pub fn trend(&self, range: &str, today: &str) -> Result<String, JsValue> {
        api::trend(&self.inventory, range, today).map_err(to_js)
    }

    #[wasm_bindgen(js_name = recentPurchases)]
    pub fn recent_purchases(&self) -> Result<String, JsValue> {
        api::recent_purchases(&self.inventory).map_err(to_js)
    }

    #[wasm_bindgen(js_name = recentOutbound)]
    pub fn recent_outbound(&self) -> Result<String, JsValue> {
        api::recent_outbound(&self.inventory).map_err(to_js)
    }

    #[wasm_bindgen(js_name = stockBreakdown)]
    pub fn stock_breakdown(&self, id: u32, storeroom_id: Option<u8>) -> Result<String, JsValue> {
        api::stock_breakdown(&self.inventory, id, storeroom_id).map_err(to_js)
    }

    // Backup

    #[wasm_bindgen(js_name = exportBackup)]
    pub fn export_backup(&self, today: &str) -> Result<String, JsValue> {
        api::export_backup(&self.inventory, today).map_err(to_js)
    }

    #[wasm_bindgen(js_name = importBackup)]
    pub fn import_backup(&mut self, text: &str) -> Result<String, JsValue> {
        api::import_backup(&mut self.inventory, text).map_err(to_js)
    }
}

/// Whole boxes and loose pieces for a quantity, as `[boxes, pieces]`
#[wasm_bindgen(js_name = splitStock)]
pub fn split_stock_pair(quantity: i64, box_size: u32) -> Vec<i64> {
    let split = split_stock(quantity, box_size);
    vec![split.boxes, split.pieces]
}

/// Preview of a purchase in base pieces: `{ quantity, unitCost, boxed }`.
/// `unit` is `piece` or `box`; returns `None` for an unparseable price or a piece
/// count too large to represent.
#[wasm_bindgen(js_name = previewPurchase)]
pub fn preview_purchase(quantity: i64, price: &str, unit: &str, box_size: u32) -> Option<String> {
    let price = Decimal::from_str(price.trim()).ok()?;
    let unit = if unit.eq_ignore_ascii_case("box") {
        PurchaseUnit::Box
    } else {
        PurchaseUnit::Piece
    };
    let base = to_base_units(quantity, price, unit, box_size)?;
    Some(
        serde_json::json!({
            "quantity": base.quantity,
            "unitCost": base.unit_cost,
            "boxed": base.boxed,
        })
        .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_stock_pair() {
        assert_eq!(split_stock_pair(25, 12), vec![2, 1]);
        assert_eq!(split_stock_pair(7, 1), vec![0, 7]);
    }

    #[test]
    fn test_preview_purchase() {
        let preview: serde_json::Value =
            serde_json::from_str(&preview_purchase(2, "24", "box", 12).unwrap()).unwrap();
        assert_eq!(preview["quantity"], 24);
        assert_eq!(preview["unitCost"], "2");
        assert_eq!(preview["boxed"], true);

        assert!(preview_purchase(1, "abc", "piece", 1).is_none());
        assert!(preview_purchase(i64::MAX / 6, "24", "box", 12).is_none());
    }
}
