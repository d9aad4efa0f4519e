//! Backup document exchanged by export and import

use serde::{Deserialize, Serialize};

use super::{OutboundRecord, Product, PurchaseRecord, StoreroomNames};

/// Full warehouse snapshot.
///
/// Keys differ from the persisted ones (`names` for `storeroomNames`, `cnt` for
/// `productIdCounter`) and must stay that way so older backups keep importing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDocument {
    pub products: Vec<Product>,
    pub purchases: Vec<PurchaseRecord>,
    #[serde(default)]
    pub outbound: Vec<OutboundRecord>,
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<StoreroomNames>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnt: Option<u32>,
}

/// Download name for a backup taken on `date`
pub fn backup_file_name(date: chrono::NaiveDate) -> String {
    format!("Erawan_Backup_{}.json", date.format("%Y-%m-%d"))
}
