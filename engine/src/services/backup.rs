//! Whole-warehouse export and import

use erawan_shared::{ExportDocument, OutboundRecord, Product, PurchaseRecord, StoreroomNames};
use serde_json::Value;
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::inventory::Inventory;
use crate::migration;
use crate::store::{KeyValueStore, StoreKey};

/// Counts of what an import brought in
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub products: usize,
    pub purchases: usize,
    pub outbound: usize,
    pub categories: usize,
}

impl<S: KeyValueStore> Inventory<S> {
    /// Snapshot of everything persisted
    pub fn export(&self) -> ExportDocument {
        let state = self.state();
        ExportDocument {
            products: state.products.clone(),
            purchases: state.purchases.clone(),
            outbound: state.outbound.clone(),
            categories: state.categories.clone(),
            names: Some(state.storeroom_names.clone()),
            cnt: Some(state.next_product_id),
        }
    }

    pub fn export_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Replace the stored warehouse with a backup document and reload.
    ///
    /// The document is checked in full before anything is written. Absent
    /// `names` or `cnt` leave the stored values as they are.
    pub fn import_json(&mut self, text: &str) -> AppResult<ImportSummary> {
        let mut doc: Value = serde_json::from_str(text)
            .map_err(|e| AppError::Import(format!("not a JSON document: {}", e)))?;
        let object = doc
            .as_object_mut()
            .ok_or_else(|| AppError::Import("backup must be a JSON object".to_string()))?;

        let mut products = take_required(object, "products")?;
        let mut purchases = take_required(object, "purchases")?;
        let mut outbound = object.remove("outbound").filter(|v| !v.is_null()).unwrap_or(Value::Array(vec![]));
        let categories = take_required(object, "categories")?;
        let mut names = object.remove("names").filter(|v| !v.is_null());
        let cnt = object.remove("cnt").filter(|v| !v.is_null());

        migration::migrate_products(&mut products, &self.catalog);
        migration::migrate_purchases(&mut purchases);
        migration::migrate_outbound(&mut outbound);
        if let Some(names) = names.as_mut() {
            migration::migrate_storeroom_names(names);
        }

        let products: Vec<Product> = parse_section(products, "products")?;
        let purchases: Vec<PurchaseRecord> = parse_section(purchases, "purchases")?;
        let outbound: Vec<OutboundRecord> = parse_section(outbound, "outbound")?;
        let categories: Vec<String> = parse_section(categories, "categories")?;
        let names: Option<StoreroomNames> = names.map(|n| parse_section(n, "names")).transpose()?;
        let cnt: Option<u32> = cnt
            .map(|c| match c {
                Value::String(s) => s.trim().parse::<u32>().ok(),
                other => other.as_u64().and_then(|n| u32::try_from(n).ok()),
            })
            .map(|c| c.ok_or_else(|| AppError::Import("cnt must be a positive integer".to_string())))
            .transpose()?;

        let summary = ImportSummary {
            products: products.len(),
            purchases: purchases.len(),
            outbound: outbound.len(),
            categories: categories.len(),
        };

        let mut writes = vec![
            (StoreKey::Products, serde_json::to_string(&products)?),
            (StoreKey::Purchases, serde_json::to_string(&purchases)?),
            (StoreKey::Outbound, serde_json::to_string(&outbound)?),
            (StoreKey::Categories, serde_json::to_string(&categories)?),
        ];
        if let Some(names) = names {
            writes.push((StoreKey::StoreroomNames, serde_json::to_string(&names)?));
        }
        if let Some(cnt) = cnt {
            writes.push((StoreKey::ProductIdCounter, cnt.to_string()));
        }

        let store = self.repo.store_mut();
        for (key, text) in &writes {
            store.set(*key, text).map_err(|e| {
                error!(key = %key, error = %e, "Import write failed");
                e
            })?;
        }
        self.reload()?;

        info!(
            products = summary.products,
            purchases = summary.purchases,
            outbound = summary.outbound,
            "Backup imported"
        );
        Ok(summary)
    }
}

fn take_required(object: &mut serde_json::Map<String, Value>, key: &str) -> AppResult<Value> {
    object
        .remove(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::Import(format!("missing `{}`", key)))
}

fn parse_section<T: serde::de::DeserializeOwned>(value: Value, key: &str) -> AppResult<T> {
    serde_json::from_value(value).map_err(|e| AppError::Import(format!("invalid `{}`: {}", key, e)))
}
