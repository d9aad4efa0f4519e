//! Legacy data tests
//!
//! Opens stores written by older releases and checks that:
//! - Products without batches, or with an empty list, get opening batches from their quantity map
//! - Old batch, purchase and outbound field names are normalized
//! - The product id counter never hands out an id already in use

use chrono::NaiveDate;
use erawan_engine::{
    AdjustStockInput, CreateProductInput, Inventory, MemoryStore, StageOutboundInput, StoreKey,
};
use erawan_shared::ledger::totals_consistent;
use erawan_shared::{BatchKind, ProductId, SaleUnit, StoreroomId};
use rust_decimal::Decimal;
use serde_json::json;

fn room(id: u8) -> StoreroomId {
    StoreroomId::new(id).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn legacy_store() -> MemoryStore {
    let products = json!([
        {
            "id": 1,
            "name": "Milk",
            "category": "饮料",
            "costPrice": 2.5,
            "boxSize": 12,
            "storerooms": { "1": 10, "2": 2 },
            "stock": 12,
            "createdAt": "2024-01-05T08:00:00.000Z"
        },
        {
            "id": 2,
            "name": "Bread",
            "costPrice": "4",
            "boxSize": 0,
            "batches": [
                { "storeId": 1, "qty": 5, "cost": 3, "date": "2024-02-01 09:00",
                  "remark": "进货", "batchId": 1706778000000i64 },
                { "storeId": "1", "qty": -5, "cost": 3, "date": "2024-02-03 09:00",
                  "remark": "库存清零 (盘点)" },
                { "storeId": 3, "qty": 8, "cost": 4, "date": "2024-02-04 09:00",
                  "remark": "手动调整" }
            ]
        }
    ]);
    let purchases = json!([
        {
            "id": 1706778000000i64,
            "batchId": 1706778000000i64,
            "productId": 2,
            "productName": "Bread",
            "storeId": 1,
            "quantity": 5,
            "unitStr": "个",
            "price": 3,
            "time": "2024-02-01 09:00"
        }
    ]);
    let outbound = json!([
        {
            "id": 1706950000000i64,
            "productId": 1,
            "productName": "Milk",
            "storeId": 2,
            "quantity": 1,
            "unitName": "个",
            "totalValue": 2.5,
            "sellingPrice": null,
            "time": "2024-02-03T10:00:00.000Z"
        }
    ]);
    let names = json!({ "1": "Front", "2": 5, "7": "Nowhere" });

    MemoryStore::with_entries([
        (StoreKey::Products, products.to_string()),
        (StoreKey::Purchases, purchases.to_string()),
        (StoreKey::Outbound, outbound.to_string()),
        (StoreKey::StoreroomNames, names.to_string()),
    ])
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_quantity_map_becomes_opening_batches() {
        let inv = Inventory::with_defaults(legacy_store()).unwrap();
        let milk = inv.product(ProductId(1)).unwrap();

        assert_eq!(milk.code, "00001");
        assert_eq!(milk.unit_name, "个");
        assert_eq!(milk.box_unit_name, "箱");
        assert_eq!(milk.batches.len(), 2);
        assert!(milk.batches.iter().all(|b| b.kind == BatchKind::Opening));
        assert!(milk.batches.iter().all(|b| b.unit_cost == Decimal::new(25, 1)));
        assert_eq!(milk.batches[0].timestamp.date_naive(), date(2024, 1, 5));
        assert_eq!(milk.on_hand(room(1)), 10);
        assert_eq!(milk.on_hand(room(2)), 2);
        assert_eq!(milk.stock, 12);
        assert!(totals_consistent(milk));
    }

    #[test]
    fn test_old_batch_fields_normalized() {
        let inv = Inventory::with_defaults(legacy_store()).unwrap();
        let bread = inv.product(ProductId(2)).unwrap();

        assert_eq!(bread.category, "其他");
        assert_eq!(bread.box_size, 1);
        assert_eq!(bread.cost_price, Decimal::from(4));

        let kinds: Vec<BatchKind> = bread.batches.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            [BatchKind::Receipt, BatchKind::ZeroOut, BatchKind::Adjustment]
        );
        assert_eq!(bread.batches[0].batch_id.as_deref(), Some("1706778000000"));
        assert_eq!(bread.batches[1].storeroom, room(1));
        assert_eq!(bread.batches[1].quantity, -5);
        assert_eq!(bread.batches[2].storeroom, room(3));
        assert_eq!(bread.on_hand(room(1)), 0);
        assert_eq!(bread.on_hand(room(3)), 8);
        assert_eq!(bread.stock, 8);
    }

    #[test]
    fn test_history_rows_normalized() {
        let inv = Inventory::with_defaults(legacy_store()).unwrap();

        let purchase = &inv.purchases()[0];
        assert_eq!(purchase.id, "1706778000000");
        assert_eq!(purchase.batch_id.as_deref(), Some("1706778000000"));
        assert_eq!(purchase.storeroom_id, room(1));
        assert_eq!(purchase.total, Decimal::from(15));

        let row = &inv.outbound()[0];
        assert_eq!(row.id, "1706950000000");
        assert_eq!(row.storeroom_id, room(2));
        assert_eq!(row.deducted_qty, 1);
        assert_eq!(row.selling_price, None);
        assert_eq!(row.sales_amount(), Decimal::new(25, 1));
    }

    /// Sales recorded before selling prices existed count at their cost value
    #[test]
    fn test_daily_summary_over_legacy_rows() {
        let inv = Inventory::with_defaults(legacy_store()).unwrap();

        let sale_day = inv.daily_summary(date(2024, 2, 3));
        assert_eq!(sale_day.outbound_sales, Decimal::new(25, 1));
        assert_eq!(sale_day.purchase_total, Decimal::ZERO);
        // 12 @ 2.5 + 8 @ 4
        assert_eq!(sale_day.stock_value, Decimal::from(62));

        let purchase_day = inv.daily_summary(date(2024, 2, 1));
        assert_eq!(purchase_day.purchase_total, Decimal::from(15));
        assert_eq!(purchase_day.outbound_sales, Decimal::ZERO);
    }

    #[test]
    fn test_storeroom_names_cleaned() {
        let inv = Inventory::with_defaults(legacy_store()).unwrap();
        assert_eq!(inv.storeroom_names().len(), 5);
        assert_eq!(inv.storeroom_name(room(1)), "Front");
        assert_eq!(inv.storeroom_name(room(2)), "Store 2");
    }

    /// A missing counter must not reuse existing ids
    #[test]
    fn test_counter_advances_past_existing_ids() {
        let mut inv = Inventory::with_defaults(legacy_store()).unwrap();
        assert_eq!(inv.next_product_id(), ProductId(3));

        let created = inv
            .create_product(CreateProductInput {
                name: "Butter".to_string(),
                category: None,
                cost_price: Decimal::from(9),
                box_size: 1,
                unit_name: None,
                box_unit_name: None,
                initial_stock: 0,
            })
            .unwrap();

        assert_eq!(created.id, ProductId(3));
        assert_eq!(created.code, "00003");
        assert_eq!(inv.store().raw(StoreKey::ProductIdCounter), Some("4"));
    }

    /// A write stores the normalized shape and reopening changes nothing further
    #[test]
    fn test_migrated_data_written_back() {
        let mut inv = Inventory::with_defaults(legacy_store()).unwrap();
        inv.adjust_stock(AdjustStockInput {
            product_id: ProductId(1),
            storeroom_id: room(1),
            quantity: -4,
        })
        .unwrap();

        let raw = inv.store().raw(StoreKey::Products).unwrap();
        assert!(raw.contains("\"kind\""));
        assert!(!raw.contains("storeId"));
        assert!(!raw.contains("\"qty\""));

        let exported = serde_json::to_value(inv.export()).unwrap();
        let reopened = Inventory::with_defaults(inv.into_store()).unwrap();
        assert_eq!(serde_json::to_value(reopened.export()).unwrap(), exported);
        assert_eq!(reopened.product(ProductId(1)).unwrap().on_hand(room(1)), 6);
    }

    /// Stock synthesized from a quantity map can be sold like any other
    #[test]
    fn test_sell_from_synthesized_batches() {
        let mut inv = Inventory::with_defaults(legacy_store()).unwrap();
        inv.stage_outbound(StageOutboundInput {
            product_id: ProductId(1),
            storeroom_id: room(2),
            quantity: 2,
            unit: SaleUnit::Piece,
            selling_price: Some(Decimal::from(4)),
        })
        .unwrap();

        let receipt = inv.checkout(Default::default()).unwrap();

        assert_eq!(receipt.consumed_cost, Decimal::from(5));
        let milk = inv.product(ProductId(1)).unwrap();
        assert_eq!(milk.on_hand(room(2)), 0);
        assert_eq!(milk.batches.len(), 1);
    }

    /// Products that only ever had a single stock figure
    #[test]
    fn test_bare_stock_figure() {
        let products = json!([{ "id": 4, "name": "Candles", "costPrice": 1, "stock": 30 }]);
        let store = MemoryStore::with_entries([
            (StoreKey::Products, products.to_string()),
            (StoreKey::ProductIdCounter, "\"9\"".to_string()),
        ]);

        let inv = Inventory::with_defaults(store).unwrap();
        let candles = inv.product(ProductId(4)).unwrap();

        assert_eq!(candles.on_hand(StoreroomId::MAIN), 30);
        assert_eq!(candles.batches.len(), 1);
        assert_eq!(candles.batches[0].timestamp.timestamp(), 0);
        assert_eq!(inv.next_product_id(), ProductId(9));
    }

    /// Records saved with an empty batch list still carry their quantities
    #[test]
    fn test_empty_batch_list_keeps_legacy_stock() {
        let products = json!([
            {
                "id": 1,
                "name": "Rice",
                "costPrice": 3,
                "storerooms": { "1": 50, "2": 0, "3": 4 },
                "batches": [],
                "stock": 54
            },
            {
                "id": 2,
                "name": "Flour",
                "costPrice": 2,
                "storerooms": { "1": 0, "2": 0 },
                "batches": [],
                "stock": 0
            }
        ]);
        let store = MemoryStore::with_entries([(StoreKey::Products, products.to_string())]);

        let inv = Inventory::with_defaults(store).unwrap();
        let rice = inv.product(ProductId(1)).unwrap();
        assert_eq!(rice.stock, 54);
        assert_eq!(rice.on_hand(StoreroomId::MAIN), 50);
        assert_eq!(rice.on_hand(room(3)), 4);
        assert_eq!(rice.batches.len(), 2);
        assert!(rice.batches.iter().all(|b| b.kind == BatchKind::Opening));
        assert!(totals_consistent(rice));

        let flour = inv.product(ProductId(2)).unwrap();
        assert_eq!(flour.stock, 0);
        assert!(flour.batches.is_empty());
    }
}
