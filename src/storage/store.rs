//! Key-value store abstraction the rule service runs against.
//!
//! Durability, ordering and isolation belong to the implementation. The
//! service only needs point reads, point writes and a half-open range scan.

#![allow(async_fn_in_trait)]

use thiserror::Error;

/// Error raised by a store backend. Its message is surfaced verbatim.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A single entry yielded by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A releasable iterator over a key range.
///
/// Callers must call [`close`](RangeScan::close) once done, including after
/// an error from [`next`](RangeScan::next). Dropping a scan also releases it.
pub trait RangeScan {
    /// Yields the next entry, or `None` once the range is exhausted.
    async fn next(&mut self) -> Option<Result<KeyValue, StoreError>>;

    /// Releases the scan.
    async fn close(self) -> Result<(), StoreError>;
}

/// The ledger primitives a host provides.
pub trait KeyValueStore {
    type Scan: RangeScan;

    /// Reads the value stored under `key`. Returns `Ok(None)` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes `value` under `key`, replacing any existing value.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Opens a scan over `start <= key < end` in byte-lexicographic key order.
    async fn range_query(&self, start: &str, end: &str) -> Result<Self::Scan, StoreError>;
}
