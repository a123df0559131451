use super::{LocalStorage, StorageResult};
use std::collections::BTreeMap;

/// In-process storage for ephemeral sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStorage;
    use crate::storage::LocalStorage;

    #[test]
    fn set_replaces_and_remove_is_idempotent() {
        let mut storage = MemoryStorage::new();
        storage.set_item("crm-data", "{}").unwrap();
        storage.set_item("crm-data", "{\"leads\":[]}").unwrap();
        assert_eq!(
            storage.get_item("crm-data").unwrap().as_deref(),
            Some("{\"leads\":[]}")
        );

        storage.remove_item("crm-data").unwrap();
        storage.remove_item("crm-data").unwrap();
        assert!(storage.get_item("crm-data").unwrap().is_none());
        assert!(storage.is_empty());
    }
}
