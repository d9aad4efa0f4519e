//! Configuration management for Erawan WMS
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with ERAWAN_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Where the key-value store keeps its files
    pub storage: StorageConfig,

    /// Catalog defaults
    pub catalog: CatalogConfig,

    /// Stock and history behaviour
    pub inventory: InventoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one JSON file per store key
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Categories seeded into an empty store
    pub default_categories: Vec<String>,

    /// Unit name for products created without one
    pub default_unit_name: String,

    /// Box unit name for products created without one
    pub default_box_unit_name: String,

    /// Category given to products created from a purchase
    pub fallback_category: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Products with less total stock are flagged as low
    pub low_stock_threshold: i64,

    /// Rows returned by the history listings
    pub history_limit: usize,

    /// Rows returned by product search
    pub search_limit: usize,

    /// What happens to history rows when their product is deleted
    pub orphan_policy: OrphanPolicy,

    /// Create unknown products when a purchase names one
    pub auto_create_products: bool,
}

/// Handling of purchase and outbound rows whose product is deleted
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Keep the rows; they reference a product id that no longer exists
    #[default]
    Retain,
    /// Delete the rows together with the product
    Cascade,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("ERAWAN_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::defaults(config::Config::builder())?
            .set_default("environment", environment.clone())?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ERAWAN_ prefix)
            .add_source(
                Environment::with_prefix("ERAWAN")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("catalog.default_categories")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("environment", "development")?
            .set_default("storage.data_dir", "data")?
            .set_default(
                "catalog.default_categories",
                erawan_shared::default_categories(),
            )?
            .set_default("catalog.default_unit_name", "个")?
            .set_default("catalog.default_box_unit_name", "箱")?
            .set_default("catalog.fallback_category", "其他")?
            .set_default("inventory.low_stock_threshold", 10)?
            .set_default("inventory.history_limit", 50)?
            .set_default("inventory.search_limit", 50)?
            .set_default("inventory.orphan_policy", "retain")?
            .set_default("inventory.auto_create_products", true)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            storage: StorageConfig::default(),
            catalog: CatalogConfig::default(),
            inventory: InventoryConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_categories: erawan_shared::default_categories(),
            default_unit_name: "个".to_string(),
            default_box_unit_name: "箱".to_string(),
            fallback_category: "其他".to_string(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
            history_limit: 50,
            search_limit: 50,
            orphan_policy: OrphanPolicy::Retain,
            auto_create_products: true,
        }
    }
}
