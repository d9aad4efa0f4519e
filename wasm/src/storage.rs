//! Browser `localStorage` backend

use erawan_engine::{AppError, AppResult, KeyValueStore, StoreKey};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// Store keys map one to one onto `localStorage` items
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    /// The current window's `localStorage`
    pub fn open() -> AppResult<Self> {
        let window =
            web_sys::window().ok_or_else(|| AppError::Storage("no window available".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| AppError::Storage(js_message(&e)))?
            .ok_or_else(|| AppError::Storage("localStorage is disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: StoreKey) -> AppResult<Option<String>> {
        self.storage
            .get_item(key.as_str())
            .map_err(|e| AppError::Storage(format!("read {}: {}", key, js_message(&e))))
    }

    // quota errors surface here
    fn set(&mut self, key: StoreKey, value: &str) -> AppResult<()> {
        self.storage
            .set_item(key.as_str(), value)
            .map_err(|e| AppError::Storage(format!("write {}: {}", key, js_message(&e))))
    }

    fn remove(&mut self, key: StoreKey) -> AppResult<()> {
        self.storage
            .remove_item(key.as_str())
            .map_err(|e| AppError::Storage(format!("remove {}: {}", key, js_message(&e))))
    }
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
