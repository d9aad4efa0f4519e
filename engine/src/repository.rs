//! Data access layer
//!
//! Reads every collection once, normalizes legacy records, rebuilds derived
//! stock totals and keeps the result in memory. Mutations go through
//! [`StoreState`] and are written back key by key.

use erawan_shared::ledger::recompute_totals;
use erawan_shared::{
    complete_storeroom_names, OutboundRecord, Product, ProductId, PurchaseRecord, StoreroomNames,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::CatalogConfig;
use crate::error::{AppError, AppResult};
use crate::migration;
use crate::store::{KeyValueStore, StoreKey};

/// Everything the warehouse persists
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub products: Vec<Product>,
    pub purchases: Vec<PurchaseRecord>,
    pub outbound: Vec<OutboundRecord>,
    pub categories: Vec<String>,
    pub storeroom_names: StoreroomNames,
    /// Id the next created product receives
    pub next_product_id: u32,
}

impl StoreState {
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    pub fn product_by_name(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Take the next product id and advance the counter
    pub fn allocate_product_id(&mut self) -> ProductId {
        let id = ProductId(self.next_product_id);
        self.next_product_id += 1;
        id
    }
}

/// Cached view of a [`KeyValueStore`]
pub struct Repository<S> {
    store: S,
    state: StoreState,
}

impl<S: KeyValueStore> Repository<S> {
    /// Load and normalize everything held by `store`
    pub fn load(store: S, catalog: &CatalogConfig) -> AppResult<Self> {
        let state = read_state(&store, catalog)?;
        Ok(Self { store, state })
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StoreState {
        &mut self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Drop the cache and read the store again
    pub fn reload(&mut self, catalog: &CatalogConfig) -> AppResult<()> {
        self.state = read_state(&self.store, catalog)?;
        Ok(())
    }

    /// Write one collection through to the store
    pub fn save(&mut self, key: StoreKey) -> AppResult<()> {
        let text = match key {
            StoreKey::Products => serde_json::to_string(&self.state.products)?,
            StoreKey::Purchases => serde_json::to_string(&self.state.purchases)?,
            StoreKey::Outbound => serde_json::to_string(&self.state.outbound)?,
            StoreKey::Categories => serde_json::to_string(&self.state.categories)?,
            StoreKey::StoreroomNames => serde_json::to_string(&self.state.storeroom_names)?,
            StoreKey::ProductIdCounter => self.state.next_product_id.to_string(),
        };
        self.store.set(key, &text).map_err(|e| {
            error!(key = %key, error = %e, "Failed to persist collection");
            e
        })
    }

    pub fn save_keys(&mut self, keys: &[StoreKey]) -> AppResult<()> {
        for key in keys {
            self.save(*key)?;
        }
        Ok(())
    }
}

fn read_state<S: KeyValueStore>(store: &S, catalog: &CatalogConfig) -> AppResult<StoreState> {
    let mut products: Vec<Product> = read_collection(store, StoreKey::Products, |v| {
        migration::migrate_products(v, catalog)
    })?
    .unwrap_or_default();
    for product in &mut products {
        recompute_totals(product);
    }

    let purchases: Vec<PurchaseRecord> =
        read_collection(store, StoreKey::Purchases, migration::migrate_purchases)?
            .unwrap_or_default();
    let outbound: Vec<OutboundRecord> =
        read_collection(store, StoreKey::Outbound, migration::migrate_outbound)?
            .unwrap_or_default();
    let categories: Vec<String> =
        read_collection(store, StoreKey::Categories, |_| migration::MigrationReport::default())?
            .unwrap_or_else(|| catalog.default_categories.clone());
    let mut storeroom_names: StoreroomNames =
        read_collection(store, StoreKey::StoreroomNames, migration::migrate_storeroom_names)?
            .unwrap_or_default();
    complete_storeroom_names(&mut storeroom_names);

    let next_product_id = read_counter(store)?;
    let highest = products.iter().map(|p| p.id.0).max().unwrap_or(0);
    let next_product_id = if next_product_id <= highest {
        warn!(counter = next_product_id, highest, "Product id counter behind catalog, advancing");
        highest + 1
    } else {
        next_product_id
    };

    info!(
        products = products.len(),
        purchases = purchases.len(),
        outbound = outbound.len(),
        next_product_id,
        "Warehouse state loaded"
    );

    Ok(StoreState {
        products,
        purchases,
        outbound,
        categories,
        storeroom_names,
        next_product_id,
    })
}

/// Parse a stored collection after running `migrate` over its raw JSON.
///
/// Missing keys and JSON `null` both read as `None`.
fn read_collection<S, T, F>(store: &S, key: StoreKey, migrate: F) -> AppResult<Option<T>>
where
    S: KeyValueStore,
    T: DeserializeOwned,
    F: FnOnce(&mut Value) -> migration::MigrationReport,
{
    let Some(text) = store.get(key)? else {
        debug!(key = %key, "Collection not present, using defaults");
        return Ok(None);
    };
    let mut value: Value = serde_json::from_str(&text).map_err(|e| {
        error!(key = %key, error = %e, "Stored collection is not valid JSON");
        e
    })?;
    if value.is_null() {
        return Ok(None);
    }
    let report = migrate(&mut value);
    if !report.is_noop() {
        info!(
            key = %key,
            records = report.records_touched,
            synthesized_batches = report.batches_synthesized,
            "Normalized legacy records"
        );
    }
    serde_json::from_value(value).map(Some).map_err(AppError::from)
}

/// The counter is stored as bare text; anything unparsable restarts at 1
fn read_counter<S: KeyValueStore>(store: &S) -> AppResult<u32> {
    let raw = store.get(StoreKey::ProductIdCounter)?;
    let parsed = raw
        .as_deref()
        .map(|s| s.trim().trim_matches('"'))
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|n| *n > 0);
    Ok(parsed.unwrap_or(1))
}
