//! One-shot normalization of stored collections
//!
//! Older data used different field names (`storeId`, `qty`, `cost`, `date`),
//! numeric record ids, remark strings instead of batch kinds, and products
//! that only carried a per-storeroom quantity map without batches. Everything
//! here runs on raw JSON before deserialization so the typed models stay
//! strict.

use chrono::{DateTime, Utc};
use erawan_shared::{flexible_time, BatchKind, StoreroomId};
use serde_json::{Map, Value};

use crate::config::CatalogConfig;

/// What a migration pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records that needed at least one change
    pub records_touched: usize,
    /// Batches built from a legacy quantity map
    pub batches_synthesized: usize,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.records_touched == 0
    }

    fn absorb(&mut self, other: MigrationReport) {
        self.records_touched += other.records_touched;
        self.batches_synthesized += other.batches_synthesized;
    }
}

const BATCH_RENAMES: &[(&str, &str)] = &[
    ("storeId", "storeroom"),
    ("qty", "quantity"),
    ("cost", "unitCost"),
    ("date", "timestamp"),
];

/// Batch kind implied by a remark written before kinds were stored
pub fn kind_from_remark(remark: &str) -> BatchKind {
    match remark.trim() {
        "初始库存" | "initial stock" => BatchKind::Opening,
        "进货" | "purchase" => BatchKind::Receipt,
        "手动增加" | "manual increase" => BatchKind::ManualIncrease,
        "撤销恢复" | "reversal" => BatchKind::Reversal,
        r if r.starts_with("库存清零") || r == "zero-out" => BatchKind::ZeroOut,
        _ => BatchKind::Adjustment,
    }
}

/// Normalize the `products` array in place
pub fn migrate_products(value: &mut Value, catalog: &CatalogConfig) -> MigrationReport {
    let mut report = MigrationReport::default();
    let Some(products) = value.as_array_mut() else {
        return report;
    };
    for product in products.iter_mut().filter_map(Value::as_object_mut) {
        report.absorb(migrate_product(product, catalog));
    }
    report
}

fn migrate_product(product: &mut Map<String, Value>, catalog: &CatalogConfig) -> MigrationReport {
    let mut changed = false;
    let mut synthesized = 0;

    if !product.contains_key("code") {
        if let Some(id) = product.get("id").and_then(Value::as_u64) {
            product.insert("code".into(), Value::from(format!("{:05}", id)));
            changed = true;
        }
    }
    changed |= fill_string(product, "category", &catalog.fallback_category);
    changed |= fill_string(product, "unitName", &catalog.default_unit_name);
    changed |= fill_string(product, "boxUnitName", &catalog.default_box_unit_name);
    changed |= fill_zero(product, "costPrice");
    if !product
        .get("boxSize")
        .and_then(Value::as_u64)
        .is_some_and(|size| size >= 1)
    {
        product.insert("boxSize".into(), Value::from(1));
        changed = true;
    }

    let created_at = product
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(flexible_time::parse);
    let cost = product.get("costPrice").cloned().unwrap_or(Value::from(0));

    // an empty list saved next to legacy quantities is treated like a missing one
    let existing = product.get("batches").and_then(Value::as_array).map(Vec::len);
    if existing.map_or(true, |len| len == 0) {
        let batches = opening_batches(product, &cost, created_at);
        if existing.is_none() || !batches.is_empty() {
            synthesized = batches.len();
            product.insert("batches".into(), Value::Array(batches));
            changed = true;
        }
    }

    if let Some(batches) = product.get_mut("batches").and_then(Value::as_array_mut) {
        for batch in batches.iter_mut().filter_map(Value::as_object_mut) {
            changed |= migrate_batch(batch, &cost, created_at);
        }
    }

    // derived; rebuilt from batches after load
    changed |= product.remove("storerooms").is_some();
    changed |= product.remove("stock").is_some();

    MigrationReport {
        records_touched: usize::from(changed),
        batches_synthesized: synthesized,
    }
}

/// Opening batches standing in for a product's legacy quantity map
fn opening_batches(
    product: &Map<String, Value>,
    cost: &Value,
    created_at: Option<DateTime<Utc>>,
) -> Vec<Value> {
    let timestamp = flexible_time::format(&created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH));
    let mut quantities: Vec<(u8, i64)> = match product.get("storerooms").and_then(Value::as_object) {
        Some(map) => map
            .iter()
            .filter_map(|(k, v)| Some((k.parse::<u8>().ok()?, as_i64(v)?)))
            .filter(|(id, _)| StoreroomId::new(*id).is_ok())
            .collect(),
        // oldest shape: one stock figure, all of it in the main storeroom
        None => product
            .get("stock")
            .and_then(as_i64)
            .map(|stock| vec![(StoreroomId::MAIN.get(), stock)])
            .unwrap_or_default(),
    };
    quantities.sort_unstable();

    quantities
        .into_iter()
        .filter(|(_, qty)| *qty != 0)
        .map(|(storeroom, qty)| {
            serde_json::json!({
                "storeroom": storeroom,
                "quantity": qty,
                "unitCost": cost,
                "timestamp": timestamp,
                "kind": BatchKind::Opening,
                "remark": BatchKind::Opening.label(),
            })
        })
        .collect()
}

fn migrate_batch(
    batch: &mut Map<String, Value>,
    cost: &Value,
    created_at: Option<DateTime<Utc>>,
) -> bool {
    let mut changed = rename_keys(batch, BATCH_RENAMES);

    changed |= fix_storeroom(batch, "storeroom");

    if !batch.get("quantity").is_some_and(Value::is_i64) {
        let qty = batch.get("quantity").and_then(as_i64).unwrap_or(0);
        batch.insert("quantity".into(), Value::from(qty));
        changed = true;
    }
    if batch.get("unitCost").map_or(true, Value::is_null) {
        batch.insert("unitCost".into(), cost.clone());
        changed = true;
    }
    let timestamp_ok = batch
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(flexible_time::parse)
        .is_some();
    if !timestamp_ok {
        let fallback = created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        batch.insert("timestamp".into(), Value::from(flexible_time::format(&fallback)));
        changed = true;
    }
    if !batch.contains_key("kind") {
        let remark = batch.get("remark").and_then(Value::as_str).unwrap_or("");
        let kind = kind_from_remark(remark);
        batch.insert("kind".into(), serde_json::json!(kind));
        changed = true;
    }
    changed |= stringify_id(batch, "batchId");
    changed
}

/// Normalize the `purchases` array in place
pub fn migrate_purchases(value: &mut Value) -> MigrationReport {
    let mut report = MigrationReport::default();
    let Some(rows) = value.as_array_mut() else {
        return report;
    };
    for row in rows.iter_mut().filter_map(Value::as_object_mut) {
        let mut changed = stringify_id(row, "id");
        changed |= stringify_id(row, "batchId");
        changed |= rename_keys(row, &[("storeId", "storeroomId")]);
        changed |= fix_storeroom(row, "storeroomId");
        changed |= fill_zero(row, "price");
        if row.get("total").map_or(true, Value::is_null) {
            let total = decimal_of(row.get("quantity")) * decimal_of(row.get("price"));
            row.insert("total".into(), Value::from(total.to_string()));
            changed = true;
        }
        report.records_touched += usize::from(changed);
    }
    report
}

/// Normalize the `outbound` array in place
pub fn migrate_outbound(value: &mut Value) -> MigrationReport {
    let mut report = MigrationReport::default();
    let Some(rows) = value.as_array_mut() else {
        return report;
    };
    for row in rows.iter_mut().filter_map(Value::as_object_mut) {
        let mut changed = stringify_id(row, "id");
        changed |= stringify_id(row, "groupId");
        changed |= rename_keys(row, &[("storeId", "storeroomId")]);
        changed |= fix_storeroom(row, "storeroomId");
        if !row.contains_key("deductedQty") {
            let qty = row.get("quantity").cloned().unwrap_or(Value::from(0));
            row.insert("deductedQty".into(), qty);
            changed = true;
        }
        // NaN prices were written as null
        for key in ["sellingPrice", "totalSales"] {
            if row.get(key).is_some_and(Value::is_null) {
                row.remove(key);
                changed = true;
            }
        }
        changed |= fill_zero(row, "totalValue");
        report.records_touched += usize::from(changed);
    }
    report
}

/// Keep only names for storerooms that exist, with string values
pub fn migrate_storeroom_names(value: &mut Value) -> MigrationReport {
    let Some(names) = value.as_object_mut() else {
        return MigrationReport::default();
    };
    let before = names.len();
    names.retain(|key, name| {
        key.parse::<u8>().is_ok_and(|id| StoreroomId::new(id).is_ok()) && name.is_string()
    });
    MigrationReport {
        records_touched: before - names.len(),
        batches_synthesized: 0,
    }
}

fn rename_keys(map: &mut Map<String, Value>, renames: &[(&str, &str)]) -> bool {
    let mut changed = false;
    for (old, new) in renames {
        if let Some(value) = map.remove(*old) {
            map.entry(new.to_string()).or_insert(value);
            changed = true;
        }
    }
    changed
}

/// Record ids used to be millisecond timestamps, sometimes with a random fraction
fn stringify_id(map: &mut Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(Value::Number(n)) => {
            let text = n.to_string();
            map.insert(key.to_string(), Value::from(text));
            true
        }
        Some(Value::Null) => {
            map.remove(key);
            true
        }
        _ => false,
    }
}

fn fix_storeroom(map: &mut Map<String, Value>, key: &str) -> bool {
    let in_range = |id: i64| u8::try_from(id).ok().filter(|id| StoreroomId::new(*id).is_ok());
    let current = map.get(key);
    if current.is_some_and(Value::is_u64) && current.and_then(as_i64).and_then(in_range).is_some() {
        return false;
    }
    // "2" or 2.0 from hand-edited data; anything else lands in the main storeroom
    let id = current
        .and_then(as_i64)
        .and_then(in_range)
        .unwrap_or(StoreroomId::MAIN.get());
    map.insert(key.to_string(), Value::from(id));
    true
}

fn fill_string(map: &mut Map<String, Value>, key: &str, default: &str) -> bool {
    let missing = map
        .get(key)
        .and_then(Value::as_str)
        .map_or(true, |s| s.trim().is_empty());
    if missing {
        map.insert(key.to_string(), Value::from(default));
    }
    missing
}

fn fill_zero(map: &mut Map<String, Value>, key: &str) -> bool {
    if map.get(key).map_or(true, Value::is_null) {
        map.insert(key.to_string(), Value::from(0));
        return true;
    }
    false
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decimal_of(value: Option<&Value>) -> rust_decimal::Decimal {
    value
        .and_then(|v| match v {
            Value::Number(n) => n.to_string().parse().ok(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_remark() {
        assert_eq!(kind_from_remark("初始库存"), BatchKind::Opening);
        assert_eq!(kind_from_remark("进货"), BatchKind::Receipt);
        assert_eq!(kind_from_remark("库存清零(重置)"), BatchKind::ZeroOut);
        assert_eq!(kind_from_remark("撤销恢复"), BatchKind::Reversal);
        assert_eq!(kind_from_remark("something else"), BatchKind::Adjustment);
    }

    #[test]
    fn test_legacy_batch_fields_renamed() {
        let mut products = json!([{
            "id": 2, "name": "Rice", "category": "食品", "costPrice": 3,
            "batches": [{"storeId": 2, "qty": 5, "cost": 3, "date": "2024-01-01T08:00", "remark": "进货", "batchId": "B_1"}],
            "storerooms": {"1": 0, "2": 5}, "stock": 5
        }]);
        let report = migrate_products(&mut products, &CatalogConfig::default());

        assert_eq!(report.records_touched, 1);
        let p = &products[0];
        assert_eq!(p["code"], "00002");
        assert_eq!(p["boxSize"], 1);
        assert_eq!(p["unitName"], "个");
        assert!(p.get("storerooms").is_none());
        let b = &p["batches"][0];
        assert_eq!(b["storeroom"], 2);
        assert_eq!(b["quantity"], 5);
        assert_eq!(b["unitCost"], 3);
        assert_eq!(b["kind"], "receipt");
        assert!(b.get("storeId").is_none());
    }

    #[test]
    fn test_quantity_map_becomes_opening_batches() {
        let mut products = json!([{
            "id": 1, "name": "Soap", "costPrice": 2,
            "storerooms": {"1": 4, "3": 6, "2": 0}, "createdAt": "2023-12-01T00:00:00.000Z"
        }]);
        let report = migrate_products(&mut products, &CatalogConfig::default());

        assert_eq!(report.batches_synthesized, 2);
        let batches = products[0]["batches"].as_array().unwrap();
        assert_eq!(batches[0]["storeroom"], 1);
        assert_eq!(batches[1]["storeroom"], 3);
        assert_eq!(batches[1]["quantity"], 6);
        assert_eq!(batches[0]["kind"], "opening");
        assert_eq!(batches[0]["timestamp"], "2023-12-01T00:00:00.000Z");
    }

    #[test]
    fn test_already_current_products_untouched() {
        let mut products = json!([{
            "id": 1, "code": "00001", "name": "Soap", "category": "日用品", "costPrice": "2",
            "boxSize": 6, "unitName": "块", "boxUnitName": "箱",
            "batches": [{"storeroom": 1, "quantity": 3, "unitCost": "2",
                         "timestamp": "2024-01-01T00:00:00.000Z", "kind": "opening", "remark": ""}]
        }]);
        let before = products.clone();
        let report = migrate_products(&mut products, &CatalogConfig::default());
        assert!(report.is_noop());
        assert_eq!(products, before);
    }

    #[test]
    fn test_history_ids_stringified() {
        let mut purchases = json!([{"id": 1700000000000u64, "productId": 1, "productName": "Tea",
                                    "quantity": 2, "price": 3, "time": "2024-01-01T10:00"}]);
        migrate_purchases(&mut purchases);
        assert_eq!(purchases[0]["id"], "1700000000000");
        assert_eq!(purchases[0]["storeroomId"], 1);
        assert_eq!(purchases[0]["total"], "6");

        let mut outbound = json!([{"id": 1.5, "groupId": 17, "productId": 1, "productName": "Tea",
                                   "storeroomId": 9, "quantity": 4, "sellingPrice": null,
                                   "totalValue": 8, "time": "2024-01-01T10:00"}]);
        migrate_outbound(&mut outbound);
        let row = &outbound[0];
        assert_eq!(row["id"], "1.5");
        assert_eq!(row["groupId"], "17");
        assert_eq!(row["storeroomId"], 1);
        assert_eq!(row["deductedQty"], 4);
        assert!(row.get("sellingPrice").is_none());
    }

    #[test]
    fn test_unknown_storeroom_names_dropped() {
        let mut names = json!({"1": "Front", "6": "Ghost", "x": "Bad", "2": 7});
        let report = migrate_storeroom_names(&mut names);
        assert_eq!(report.records_touched, 3);
        assert_eq!(names, json!({"1": "Front"}));
    }
}
