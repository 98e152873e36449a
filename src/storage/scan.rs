use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::store::{KeyValue, RangeScan, StoreError};

/// A range scan over entries already materialized by the backend.
///
/// When created with a counter, the counter is incremented while the scan is
/// open and decremented exactly once on close or drop.
#[derive(Debug)]
pub struct BufferedScan {
    entries: std::vec::IntoIter<KeyValue>,
    open_scans: Option<Arc<AtomicUsize>>,
}

impl BufferedScan {
    pub fn new(entries: Vec<KeyValue>) -> Self {
        Self {
            entries: entries.into_iter(),
            open_scans: None,
        }
    }

    /// Create a scan that registers itself in `open_scans` until released.
    pub fn tracked(entries: Vec<KeyValue>, open_scans: Arc<AtomicUsize>) -> Self {
        open_scans.fetch_add(1, Ordering::SeqCst);
        Self {
            entries: entries.into_iter(),
            open_scans: Some(open_scans),
        }
    }

    fn release(&mut self) {
        if let Some(counter) = self.open_scans.take() {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl RangeScan for BufferedScan {
    async fn next(&mut self) -> Option<Result<KeyValue, StoreError>> {
        self.entries.next().map(Ok)
    }

    async fn close(mut self) -> Result<(), StoreError> {
        self.release();
        Ok(())
    }
}

impl Drop for BufferedScan {
    fn drop(&mut self) {
        self.release();
    }
}
