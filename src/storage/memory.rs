//! In-memory ledger for tests and embedding.
//!
//! `MemStore` keeps entries in a `BTreeMap`, so range scans come out in
//! byte-lexicographic key order just like the SQLite backend.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use super::scan::BufferedScan;
use super::store::{KeyValue, KeyValueStore, StoreError};

#[derive(Debug, Default)]
pub struct MemStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    open_scans: Arc<AtomicUsize>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with data.
    pub fn with_data(data: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            data: RwLock::new(data),
            open_scans: Arc::default(),
        }
    }

    /// Returns the number of entries in the store.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents, for comparing state before and after.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.data.read().map(|d| d.clone()).unwrap_or_default()
    }

    /// Number of range scans handed out and not yet released.
    pub fn open_scans(&self) -> usize {
        self.open_scans.load(Ordering::SeqCst)
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

impl KeyValueStore for MemStore {
    type Scan = BufferedScan;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let data = self.data.read().map_err(|_| poisoned())?;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|_| poisoned())?;
        data.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn range_query(&self, start: &str, end: &str) -> Result<BufferedScan, StoreError> {
        let data = self.data.read().map_err(|_| poisoned())?;
        // BTreeMap::range panics on an inverted range
        let entries = if start < end {
            data.range::<str, _>((Bound::Included(start), Bound::Excluded(end)))
                .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
                .collect()
        } else {
            Vec::new()
        };
        Ok(BufferedScan::tracked(entries, self.open_scans.clone()))
    }
}
