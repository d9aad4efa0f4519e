//! The warehouse service object
//!
//! [`Inventory`] owns the repository and the pending outbound cart. Its
//! operations are spread over the `services` modules, one `impl` block per
//! concern.

use chrono::{DateTime, Utc};
use erawan_shared::{
    OutboundCart, OutboundRecord, Product, ProductId, PurchaseRecord, StoreroomId, StoreroomNames,
};
use tracing::info;

use crate::config::{CatalogConfig, Config, InventoryConfig};
use crate::error::{AppError, AppResult};
use crate::repository::{Repository, StoreState};
use crate::store::{KeyValueStore, StoreKey};

pub struct Inventory<S> {
    pub(crate) repo: Repository<S>,
    pub(crate) catalog: CatalogConfig,
    pub(crate) settings: InventoryConfig,
    pub(crate) cart: OutboundCart,
}

impl<S: KeyValueStore> Inventory<S> {
    /// Load the warehouse held by `store`
    pub fn open(store: S, config: &Config) -> AppResult<Self> {
        let repo = Repository::load(store, &config.catalog)?;
        info!(environment = %config.environment, "Inventory opened");
        Ok(Self {
            repo,
            catalog: config.catalog.clone(),
            settings: config.inventory.clone(),
            cart: OutboundCart::default(),
        })
    }

    /// Open with built-in defaults, skipping file and environment lookup
    pub fn with_defaults(store: S) -> AppResult<Self> {
        Self::open(store, &Config::default())
    }

    pub fn products(&self) -> &[Product] {
        &self.repo.state().products
    }

    pub fn product(&self, id: ProductId) -> AppResult<&Product> {
        self.repo
            .state()
            .product(id)
            .ok_or_else(|| AppError::NotFound(format!("Product {}", id)))
    }

    pub fn purchases(&self) -> &[PurchaseRecord] {
        &self.repo.state().purchases
    }

    pub fn outbound(&self) -> &[OutboundRecord] {
        &self.repo.state().outbound
    }

    pub fn categories(&self) -> &[String] {
        &self.repo.state().categories
    }

    pub fn storeroom_names(&self) -> &StoreroomNames {
        &self.repo.state().storeroom_names
    }

    pub fn storeroom_name(&self, id: StoreroomId) -> &str {
        self.repo
            .state()
            .storeroom_names
            .get(&id)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Id the next created product will receive
    pub fn next_product_id(&self) -> ProductId {
        ProductId(self.repo.state().next_product_id)
    }

    pub fn cart(&self) -> &OutboundCart {
        &self.cart
    }

    pub fn settings(&self) -> &InventoryConfig {
        &self.settings
    }

    pub fn store(&self) -> &S {
        self.repo.store()
    }

    pub fn into_store(self) -> S {
        self.repo.into_store()
    }

    /// Re-read the store, discarding the cart
    pub fn reload(&mut self) -> AppResult<()> {
        self.repo.reload(&self.catalog)?;
        self.cart = OutboundCart::default();
        Ok(())
    }

    pub(crate) fn state(&self) -> &StoreState {
        self.repo.state()
    }

    pub(crate) fn state_mut(&mut self) -> &mut StoreState {
        self.repo.state_mut()
    }

    pub(crate) fn product_mut(&mut self, id: ProductId) -> AppResult<&mut Product> {
        self.repo
            .state_mut()
            .product_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Product {}", id)))
    }

    pub(crate) fn persist(&mut self, keys: &[StoreKey]) -> AppResult<()> {
        self.repo.save_keys(keys)
    }
}

/// Timestamp for an operation: the caller's, or now
pub(crate) fn resolve_time(time: Option<DateTime<Utc>>) -> DateTime<Utc> {
    time.unwrap_or_else(Utc::now)
}
