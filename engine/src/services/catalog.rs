//! Product catalog, category and storeroom-name maintenance

use chrono::Utc;
use erawan_shared::ledger::add_batch;
use erawan_shared::{
    split_stock, validate_box_size, validate_label, validate_price, validate_product_name,
    validate_unique_name, Batch, BatchKind, Product, ProductId, StockBreakdown, StoreroomId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::config::OrphanPolicy;
use crate::error::{AppError, AppResult};
use crate::inventory::Inventory;
use crate::store::{KeyValueStore, StoreKey};

fn default_box_size() -> u32 {
    1
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cost_price: Decimal,
    #[serde(default = "default_box_size")]
    #[validate(range(min = 1, message = "Box size must be at least 1"))]
    pub box_size: u32,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub box_unit_name: Option<String>,
    /// Pieces placed in the main storeroom as opening stock
    #[serde(default)]
    #[validate(range(min = 0, message = "Initial stock cannot be negative"))]
    pub initial_stock: i64,
}

/// Input for editing a product. Every field is replaced.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub category: String,
    pub cost_price: Decimal,
    #[validate(range(min = 1, message = "Box size must be at least 1"))]
    pub box_size: u32,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub box_unit_name: Option<String>,
    /// Signed correction booked to the main storeroom at the new cost
    #[serde(default)]
    pub stock_adjustment: i64,
}

/// What deleting a product did to its history
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRemoval {
    pub product_id: ProductId,
    pub name: String,
    /// History rows deleted along with the product
    pub history_removed: usize,
    /// History rows left pointing at the deleted id
    pub history_orphaned: usize,
    pub cart_lines_dropped: usize,
}

/// A search hit, optionally annotated with one storeroom's stock
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductMatch {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub category: String,
    pub cost_price: Decimal,
    pub box_size: u32,
    pub unit_name: String,
    pub box_unit_name: String,
    /// Quantity shown next to the hit: the storeroom's when one was given, else total stock
    pub quantity: i64,
    pub breakdown: StockBreakdown,
    pub out_of_stock: bool,
}

impl<S: KeyValueStore> Inventory<S> {
    /// Add a product to the catalog
    pub fn create_product(&mut self, input: CreateProductInput) -> AppResult<Product> {
        input.validate()?;
        let name = input.name.trim().to_string();
        validate_product_name(&name).map_err(|m| AppError::invalid("name", m))?;
        validate_box_size(input.box_size).map_err(|m| AppError::invalid("boxSize", m))?;
        validate_price(input.cost_price).map_err(|m| AppError::invalid("costPrice", m))?;
        validate_unique_name(self.products(), &name, None)
            .map_err(|_| AppError::DuplicateEntry("name".to_string()))?;

        let category = non_empty(input.category).unwrap_or_else(|| self.catalog.fallback_category.clone());
        let unit_name = non_empty(input.unit_name).unwrap_or_else(|| self.catalog.default_unit_name.clone());
        let box_unit_name =
            non_empty(input.box_unit_name).unwrap_or_else(|| self.catalog.default_box_unit_name.clone());

        let now = Utc::now();
        let id = self.state_mut().allocate_product_id();
        let mut product = Product::new(id, name, category);
        product.cost_price = input.cost_price;
        product.box_size = input.box_size;
        product.unit_name = unit_name;
        product.box_unit_name = box_unit_name;
        product.created_at = Some(now);

        if input.initial_stock > 0 {
            let opening = Batch::new(
                BatchKind::Opening,
                StoreroomId::MAIN,
                input.initial_stock,
                product.cost_price,
                now,
            );
            add_batch(&mut product, opening);
        }

        info!(
            product_id = %product.id,
            name = %product.name,
            initial_stock = input.initial_stock,
            "Product created"
        );

        self.state_mut().products.push(product.clone());
        self.persist(&[StoreKey::Products, StoreKey::ProductIdCounter])?;
        Ok(product)
    }

    /// Edit a product; a non-zero adjustment books a correction batch
    pub fn update_product(&mut self, id: ProductId, input: UpdateProductInput) -> AppResult<Product> {
        input.validate()?;
        self.product(id)?;
        let name = input.name.trim().to_string();
        validate_product_name(&name).map_err(|m| AppError::invalid("name", m))?;
        validate_box_size(input.box_size).map_err(|m| AppError::invalid("boxSize", m))?;
        validate_price(input.cost_price).map_err(|m| AppError::invalid("costPrice", m))?;
        validate_unique_name(self.products(), &name, Some(id))
            .map_err(|_| AppError::DuplicateEntry("name".to_string()))?;

        let category = non_empty(Some(input.category)).unwrap_or_else(|| self.catalog.fallback_category.clone());
        let unit_name = non_empty(input.unit_name).unwrap_or_else(|| self.catalog.default_unit_name.clone());
        let box_unit_name =
            non_empty(input.box_unit_name).unwrap_or_else(|| self.catalog.default_box_unit_name.clone());

        let product = self.product_mut(id)?;
        product.name = name;
        product.category = category;
        product.cost_price = input.cost_price;
        product.box_size = input.box_size;
        product.unit_name = unit_name;
        product.box_unit_name = box_unit_name;

        if input.stock_adjustment != 0 {
            let correction = Batch::new(
                BatchKind::Adjustment,
                StoreroomId::MAIN,
                input.stock_adjustment,
                input.cost_price,
                Utc::now(),
            );
            add_batch(product, correction);
        }
        let updated = product.clone();

        info!(
            product_id = %id,
            adjustment = input.stock_adjustment,
            "Product updated"
        );

        self.persist(&[StoreKey::Products])?;
        Ok(updated)
    }

    /// Remove a product, handling its history per the configured orphan policy
    pub fn delete_product(&mut self, id: ProductId) -> AppResult<ProductRemoval> {
        let policy = self.settings.orphan_policy;
        let state = self.state_mut();
        let idx = state
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Product {}", id)))?;
        let product = state.products.remove(idx);

        let related = state.purchases.iter().filter(|r| r.product_id == id).count()
            + state.outbound.iter().filter(|r| r.product_id == id).count();

        let (history_removed, history_orphaned) = match policy {
            OrphanPolicy::Cascade => {
                state.purchases.retain(|r| r.product_id != id);
                state.outbound.retain(|r| r.product_id != id);
                (related, 0)
            }
            OrphanPolicy::Retain => (0, related),
        };

        let staged: Vec<String> = self
            .cart
            .lines()
            .iter()
            .filter(|l| l.product_id == id)
            .map(|l| l.id.clone())
            .collect();
        for line_id in &staged {
            self.cart.remove(line_id);
        }

        if history_orphaned > 0 {
            warn!(product_id = %id, rows = history_orphaned, "History rows now reference a deleted product");
        }
        info!(product_id = %id, name = %product.name, ?policy, "Product deleted");

        match policy {
            OrphanPolicy::Cascade => {
                self.persist(&[StoreKey::Products, StoreKey::Purchases, StoreKey::Outbound])?
            }
            OrphanPolicy::Retain => self.persist(&[StoreKey::Products])?,
        }

        Ok(ProductRemoval {
            product_id: id,
            name: product.name,
            history_removed,
            history_orphaned,
            cart_lines_dropped: staged.len(),
        })
    }

    /// Products in one category, or all of them
    pub fn list_products(&self, category: Option<&str>) -> Vec<&Product> {
        self.products()
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .collect()
    }

    /// Case-insensitive search on name or code, sorted by name and capped
    pub fn search_products(&self, query: &str, storeroom: Option<StoreroomId>) -> Vec<ProductMatch> {
        let query = query.trim();
        let mut hits: Vec<&Product> = self.products().iter().filter(|p| p.matches(query)).collect();
        hits.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });

        hits.into_iter()
            .take(self.settings.search_limit)
            .map(|p| {
                let quantity = storeroom.map_or(p.stock, |s| p.on_hand(s));
                ProductMatch {
                    id: p.id,
                    code: p.code.clone(),
                    name: p.name.clone(),
                    category: p.category.clone(),
                    cost_price: p.cost_price,
                    box_size: p.box_size,
                    unit_name: p.unit_name.clone(),
                    box_unit_name: p.box_unit_name.clone(),
                    quantity,
                    breakdown: split_stock(quantity, p.box_size),
                    out_of_stock: storeroom.is_some() && quantity <= 0,
                }
            })
            .collect()
    }

    pub fn add_category(&mut self, name: &str) -> AppResult<()> {
        let name = name.trim();
        validate_label(name).map_err(|m| AppError::invalid("category", m))?;
        if self.categories().iter().any(|c| c == name) {
            return Err(AppError::DuplicateEntry("category".to_string()));
        }
        self.state_mut().categories.push(name.to_string());
        info!(category = name, "Category added");
        self.persist(&[StoreKey::Categories])
    }

    /// Products keep their category string
    pub fn delete_category(&mut self, name: &str) -> AppResult<()> {
        let categories = &mut self.state_mut().categories;
        let idx = categories
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AppError::NotFound(format!("Category {}", name)))?;
        categories.remove(idx);
        info!(category = name, "Category deleted");
        self.persist(&[StoreKey::Categories])
    }

    pub fn rename_storeroom(&mut self, id: StoreroomId, name: &str) -> AppResult<()> {
        let name = name.trim();
        validate_label(name).map_err(|m| AppError::invalid("storeroomName", m))?;
        self.state_mut().storeroom_names.insert(id, name.to_string());
        info!(storeroom = %id, name, "Storeroom renamed");
        self.persist(&[StoreKey::StoreroomNames])
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
