//! Category and storeroom-name registries

use std::collections::BTreeMap;

use crate::types::StoreroomId;

/// Display names keyed by storeroom
pub type StoreroomNames = BTreeMap<StoreroomId, String>;

/// Categories a fresh warehouse starts with
pub const DEFAULT_CATEGORIES: &[&str] = &["饮料", "食品", "日用品", "其他"];

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// `Store 1` .. `Store 5`
pub fn default_storeroom_names() -> StoreroomNames {
    StoreroomId::all()
        .map(|s| (s, format!("Store {}", s)))
        .collect()
}

/// Fill in any storeroom that has no name yet
pub fn complete_storeroom_names(names: &mut StoreroomNames) {
    for (id, name) in default_storeroom_names() {
        names.entry(id).or_insert(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let names = default_storeroom_names();
        assert_eq!(names.len(), 5);
        assert_eq!(names[&StoreroomId::MAIN], "Store 1");
    }

    #[test]
    fn test_complete_keeps_existing_names() {
        let mut names = StoreroomNames::new();
        names.insert(StoreroomId::new(3).unwrap(), "Back room".into());
        complete_storeroom_names(&mut names);
        assert_eq!(names.len(), 5);
        assert_eq!(names[&StoreroomId::new(3).unwrap()], "Back room");
    }
}
