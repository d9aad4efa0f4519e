//! Validation utilities for Erawan WMS

use rust_decimal::Decimal;

use crate::models::Product;

/// Longest product name accepted
pub const MAX_NAME_LEN: usize = 120;

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a product name (already trimmed)
pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("Product name is required");
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("Product name is too long");
    }
    Ok(())
}

/// Validate that no other product already uses `name`
pub fn validate_unique_name(products: &[Product], name: &str, except: Option<crate::ProductId>) -> Result<(), &'static str> {
    if products
        .iter()
        .any(|p| p.name == name && Some(p.id) != except)
    {
        return Err("Product name already exists");
    }
    Ok(())
}

pub fn validate_box_size(box_size: u32) -> Result<(), &'static str> {
    if box_size == 0 {
        return Err("Box size must be at least 1");
    }
    Ok(())
}

/// Validate a price or cost entered by the user
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate a category or storeroom label (already trimmed)
pub fn validate_label(label: &str) -> Result<(), &'static str> {
    if label.is_empty() {
        return Err("Name cannot be empty");
    }
    Ok(())
}

// ============================================================================
// Stock Movement Validations
// ============================================================================

/// Validate a transaction quantity (purchase, outbound)
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a manual stock change; negative values decrease stock
pub fn validate_adjustment(delta: i64) -> Result<(), &'static str> {
    if delta == 0 {
        return Err("Adjustment cannot be zero");
    }
    Ok(())
}

/// Check that `requested` pieces fit into what is on hand minus what is already reserved
pub fn validate_available(on_hand: i64, reserved: i64, requested: i64) -> Result<(), &'static str> {
    if on_hand - reserved < requested {
        return Err("Insufficient stock");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProductId;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Milk tea").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_unique_name() {
        let products = vec![Product::new(ProductId(1), "Milk", "食品")];
        assert!(validate_unique_name(&products, "Milk", None).is_err());
        assert!(validate_unique_name(&products, "Milk", Some(ProductId(1))).is_ok());
        assert!(validate_unique_name(&products, "Bread", None).is_ok());
    }

    #[test]
    fn test_validate_box_size() {
        assert!(validate_box_size(1).is_ok());
        assert!(validate_box_size(24).is_ok());
        assert!(validate_box_size(0).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(1999, 2)).is_ok());
        assert!(validate_price(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_adjustment() {
        assert!(validate_adjustment(-2).is_ok());
        assert!(validate_adjustment(5).is_ok());
        assert!(validate_adjustment(0).is_err());
    }

    #[test]
    fn test_validate_available() {
        assert!(validate_available(10, 0, 10).is_ok());
        assert!(validate_available(10, 4, 6).is_ok());
        assert!(validate_available(10, 4, 7).is_err());
        assert!(validate_available(0, 0, 1).is_err());
    }

    #[test]
    fn test_validate_label() {
        assert!(validate_label("Back room").is_ok());
        assert!(validate_label("").is_err());
    }
}
