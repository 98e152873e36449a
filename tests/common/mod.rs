// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use ruleledger::application::{LedgerConfig, RuleLedgerService};
use ruleledger::storage::{
    BufferedScan, KeyValue, KeyValueStore, MemStore, RangeScan, SqliteStore, StoreError,
};
use tempfile::TempDir;

/// Helper to create a service over a fresh SQLite ledger in a temp dir
pub async fn sqlite_service() -> Result<(RuleLedgerService<SqliteStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::init(db_path.to_str().unwrap()).await?;
    Ok((RuleLedgerService::new(store), temp_dir))
}

/// Helper to create a service over an in-memory ledger
pub fn mem_service() -> RuleLedgerService<MemStore> {
    RuleLedgerService::new(MemStore::new())
}

pub fn mem_service_with(config: LedgerConfig) -> RuleLedgerService<MemStore> {
    RuleLedgerService::with_config(MemStore::new(), config)
}

pub fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Keys of a `queryAllRules` payload, in payload order
pub fn payload_keys(payload: &[u8]) -> Vec<String> {
    let results: Vec<serde_json::Value> = serde_json::from_slice(payload).unwrap();
    results
        .iter()
        .map(|r| r["Key"].as_str().unwrap().to_string())
        .collect()
}

/// Store wrapper that counts accesses and injects failures.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemStore,
    gets: AtomicUsize,
    puts: AtomicUsize,
    scans: AtomicUsize,
    closed_scans: Arc<AtomicUsize>,
    fail_put_at: Option<usize>,
    fail_scan_open: bool,
    fail_scan_after: Option<usize>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the nth put (0-based); earlier puts succeed
    pub fn failing_put_at(mut self, n: usize) -> Self {
        self.fail_put_at = Some(n);
        self
    }

    pub fn failing_scan_open(mut self) -> Self {
        self.fail_scan_open = true;
        self
    }

    /// Yield an error after `n` entries have been produced
    pub fn failing_scan_after(mut self, n: usize) -> Self {
        self.fail_scan_after = Some(n);
        self
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn accesses(&self) -> usize {
        self.gets() + self.puts() + self.scans()
    }

    pub fn closed_scans(&self) -> usize {
        self.closed_scans.load(Ordering::SeqCst)
    }
}

pub struct FaultyScan {
    inner: BufferedScan,
    yielded: usize,
    fail_after: Option<usize>,
    closed_scans: Arc<AtomicUsize>,
}

impl RangeScan for FaultyScan {
    async fn next(&mut self) -> Option<Result<KeyValue, StoreError>> {
        if self.fail_after == Some(self.yielded) {
            self.fail_after = None;
            return Some(Err(StoreError::Backend("scan interrupted".to_string())));
        }
        let entry = self.inner.next().await;
        if entry.is_some() {
            self.yielded += 1;
        }
        entry
    }

    async fn close(self) -> Result<(), StoreError> {
        self.closed_scans.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

impl KeyValueStore for FaultyStore {
    type Scan = FaultyScan;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put_at == Some(n) {
            return Err(StoreError::Backend(format!("put {} rejected", key)));
        }
        self.inner.put(key, value).await
    }

    async fn range_query(&self, start: &str, end: &str) -> Result<FaultyScan, StoreError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if self.fail_scan_open {
            return Err(StoreError::Backend("range query unavailable".to_string()));
        }
        Ok(FaultyScan {
            inner: self.inner.range_query(start, end).await?,
            yielded: 0,
            fail_after: self.fail_scan_after,
            closed_scans: self.closed_scans.clone(),
        })
    }
}
