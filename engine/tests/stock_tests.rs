//! Stock maintenance tests
//!
//! Tests for manual adjustments and zero-out corrections:
//! - Increases book a batch at the reference cost
//! - Decreases consume oldest batches first
//! - Zero-out appends a cancelling batch and is idempotent

use erawan_engine::{
    AdjustStockInput, AppError, CheckoutInput, CreateProductInput, Inventory, MemoryStore,
    StageOutboundInput,
};
use erawan_shared::ledger::{totals_consistent, ZeroOutOutcome};
use erawan_shared::{BatchKind, ProductId, SaleUnit, StoreroomId};
use rust_decimal::Decimal;

fn room(id: u8) -> StoreroomId {
    StoreroomId::new(id).unwrap()
}

fn inventory_with(name: &str, cost: i64, initial: i64) -> (Inventory<MemoryStore>, ProductId) {
    let mut inv = Inventory::with_defaults(MemoryStore::new()).unwrap();
    let id = inv
        .create_product(CreateProductInput {
            name: name.to_string(),
            category: None,
            cost_price: Decimal::from(cost),
            box_size: 10,
            unit_name: None,
            box_unit_name: None,
            initial_stock: initial,
        })
        .unwrap()
        .id;
    (inv, id)
}

fn adjust(inv: &mut Inventory<MemoryStore>, id: ProductId, storeroom: u8, quantity: i64) -> Result<i64, AppError> {
    inv.adjust_stock(AdjustStockInput {
        product_id: id,
        storeroom_id: room(storeroom),
        quantity,
    })
    .map(|a| a.on_hand)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_increase_books_batch_at_reference_cost() {
        let (mut inv, id) = inventory_with("Rice", 4, 0);

        let on_hand = adjust(&mut inv, id, 3, 12).unwrap();

        assert_eq!(on_hand, 12);
        let product = inv.product(id).unwrap();
        assert_eq!(product.on_hand(room(3)), 12);
        assert_eq!(product.on_hand(room(1)), 0);
        assert_eq!(product.stock, 12);
        let batch = &product.batches[0];
        assert_eq!(batch.kind, BatchKind::ManualIncrease);
        assert_eq!(batch.unit_cost, Decimal::from(4));
    }

    #[test]
    fn test_decrease_consumes_oldest_first() {
        let (mut inv, id) = inventory_with("Rice", 4, 10);
        inv.update_product(
            id,
            erawan_engine::UpdateProductInput {
                name: "Rice".to_string(),
                category: "食品".to_string(),
                cost_price: Decimal::from(6),
                box_size: 10,
                unit_name: None,
                box_unit_name: None,
                stock_adjustment: 0,
            },
        )
        .unwrap();
        adjust(&mut inv, id, 1, 5).unwrap();

        let adjustment = inv
            .adjust_stock(AdjustStockInput {
                product_id: id,
                storeroom_id: room(1),
                quantity: -12,
            })
            .unwrap();

        // 10 opening @4 then 2 @6
        assert_eq!(adjustment.consumed_cost, Decimal::from(52));
        assert_eq!(adjustment.on_hand, 3);
        let product = inv.product(id).unwrap();
        assert_eq!(product.batches.len(), 1);
        assert_eq!(product.batches[0].unit_cost, Decimal::from(6));
        assert!(totals_consistent(product));
    }

    #[test]
    fn test_decrease_beyond_stock_rejected() {
        let (mut inv, id) = inventory_with("Rice", 4, 3);

        let err = adjust(&mut inv, id, 1, -4).unwrap_err();

        assert!(matches!(
            err,
            AppError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            }
        ));
        assert_eq!(inv.product(id).unwrap().stock, 3);
    }

    #[test]
    fn test_zero_adjustment_rejected() {
        let (mut inv, id) = inventory_with("Rice", 4, 3);
        let err = adjust(&mut inv, id, 1, 0).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_unknown_product_rejected() {
        let (mut inv, _) = inventory_with("Rice", 4, 3);
        let err = adjust(&mut inv, ProductId(99), 1, 1).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    /// Stock moved into a side storeroom and cleared again
    #[test]
    fn test_zero_out_side_storeroom() {
        let (mut inv, id) = inventory_with("Soap", 3, 0);
        adjust(&mut inv, id, 2, 7).unwrap();

        let outcome = inv.zero_out_stock(id, room(2)).unwrap();

        assert_eq!(outcome, ZeroOutOutcome::Applied { cleared: 7 });
        let product = inv.product(id).unwrap();
        assert_eq!(product.on_hand(room(2)), 0);
        assert_eq!(product.stock, 0);
        assert_eq!(product.batches.len(), 2);
        let correction = product.batches.last().unwrap();
        assert_eq!(correction.kind, BatchKind::ZeroOut);
        assert_eq!(correction.quantity, -7);
        assert_eq!(correction.unit_cost, Decimal::from(3));

        let again = inv.zero_out_stock(id, room(2)).unwrap();
        assert_eq!(again, ZeroOutOutcome::AlreadyZero);
        assert_eq!(inv.product(id).unwrap().batches.len(), 2);
    }

    /// A zeroed storeroom can be stocked and sold from again
    #[test]
    fn test_restock_after_zero_out() {
        let (mut inv, id) = inventory_with("Soap", 3, 5);
        inv.zero_out_stock(id, room(1)).unwrap();
        adjust(&mut inv, id, 1, 4).unwrap();
        assert_eq!(inv.product(id).unwrap().on_hand(room(1)), 4);

        inv.stage_outbound(StageOutboundInput {
            product_id: id,
            storeroom_id: room(1),
            quantity: 4,
            unit: SaleUnit::Piece,
            selling_price: None,
        })
        .unwrap();
        inv.checkout(CheckoutInput::default()).unwrap();

        let product = inv.product(id).unwrap();
        assert_eq!(product.on_hand(room(1)), 0);
        assert!(totals_consistent(product));
    }

    #[test]
    fn test_zero_out_empty_storeroom_is_noop() {
        let (mut inv, id) = inventory_with("Soap", 3, 5);
        let outcome = inv.zero_out_stock(id, room(4)).unwrap();
        assert_eq!(outcome, ZeroOutOutcome::AlreadyZero);
        assert_eq!(inv.product(id).unwrap().batches.len(), 1);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Accepted adjustments move on-hand by exactly their amount; rejected ones change nothing
        #[test]
        fn prop_adjustments_track_on_hand(steps in prop::collection::vec((1u8..=5, -20i64..20), 1..25)) {
            let (mut inv, id) = inventory_with("Flour", 2, 0);
            let mut expected = [0i64; 5];

            for (storeroom, qty) in steps {
                let slot = usize::from(storeroom - 1);
                match adjust(&mut inv, id, storeroom, qty) {
                    Ok(on_hand) => {
                        expected[slot] += qty;
                        prop_assert_eq!(on_hand, expected[slot]);
                    }
                    Err(_) => prop_assert!(qty == 0 || expected[slot] < -qty),
                }
            }

            let product = inv.product(id).unwrap();
            for storeroom in StoreroomId::all() {
                prop_assert_eq!(product.on_hand(storeroom), expected[usize::from(storeroom.get() - 1)]);
                prop_assert!(product.on_hand(storeroom) >= 0);
            }
            prop_assert!(totals_consistent(product));
        }
    }
}
