use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;

use crate::application::{LedgerError, RuleLedgerService};
use crate::domain::Rule;
use crate::storage::KeyValueStore;

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred while importing one entry
#[derive(Debug, Clone)]
pub struct ImportError {
    /// Position of the entry in the input array
    pub index: usize,
    pub key: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub skip_existing: bool,
}

/// One element of an exported rule array
#[derive(Debug, Deserialize)]
struct ImportEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Record")]
    record: serde_json::Value,
}

/// Importer for loading rules into the ledger
pub struct Importer<'a, S> {
    service: &'a RuleLedgerService<S>,
}

impl<'a, S: KeyValueStore> Importer<'a, S> {
    pub fn new(service: &'a RuleLedgerService<S>) -> Self {
        Self { service }
    }

    /// Import rules from a JSON array in the `queryAllRules` format.
    ///
    /// A malformed document fails as a whole; a malformed entry is recorded
    /// in the result and the rest are still imported.
    pub async fn import_rules_json<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let entries: Vec<serde_json::Value> =
            serde_json::from_reader(reader).context("Expected a JSON array of rules")?;

        let mut imported = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for (index, value) in entries.into_iter().enumerate() {
            let entry: ImportEntry = match serde_json::from_value(value) {
                Ok(e) => e,
                Err(e) => {
                    errors.push(ImportError {
                        index,
                        key: None,
                        error: format!("Invalid entry: {}", e),
                    });
                    continue;
                }
            };

            let rule: Rule = match serde_json::from_value(entry.record) {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        index,
                        key: Some(entry.key),
                        error: format!("Invalid record: {}", e),
                    });
                    continue;
                }
            };

            if options.skip_existing {
                match self.service.get_rule(&entry.key).await {
                    Ok(None) => {}
                    // present, even if the stored record does not decode
                    Ok(Some(_)) | Err(LedgerError::Decode(_)) => {
                        skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        errors.push(ImportError {
                            index,
                            key: Some(entry.key),
                            error: format!("Lookup failed: {}", e),
                        });
                        continue;
                    }
                }
            }

            if options.dry_run {
                imported += 1;
                continue;
            }

            match self.service.create_rule(&entry.key, &rule).await {
                Ok(()) => imported += 1,
                Err(e) => errors.push(ImportError {
                    index,
                    key: Some(entry.key),
                    error: format!("Rule creation failed: {}", e),
                }),
            }
        }

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BufferedScan, MemStore, StoreError};

    /// Store whose point reads always fail.
    struct OfflineReads(MemStore);

    impl KeyValueStore for OfflineReads {
        type Scan = BufferedScan;

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::Backend("ledger offline".to_string()))
        }

        async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
            self.0.put(key, value).await
        }

        async fn range_query(&self, start: &str, end: &str) -> Result<BufferedScan, StoreError> {
            self.0.range_query(start, end).await
        }
    }

    const INPUT: &str = r#"[
        {"Key": "Rule0", "Record": {"ruleaction": "drop", "protocol": "udp", "sourceip": "10.0.0.1", "sourceport": "53"}},
        {"Key": "Rule1", "Record": "not a rule"},
        {"Record": {}},
        {"Key": "Rule2", "Record": {"ruleaction": "pass", "protocol": "tcp", "sourceip": "any", "sourceport": "any"}}
    ]"#;

    #[tokio::test]
    async fn test_import_collects_entry_errors() -> Result<()> {
        let service = RuleLedgerService::new(MemStore::new());
        let result = Importer::new(&service)
            .import_rules_json(INPUT.as_bytes(), ImportOptions::default())
            .await?;

        assert_eq!(result.imported, 2);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].index, 1);
        assert_eq!(result.errors[0].key.as_deref(), Some("Rule1"));
        assert_eq!(result.errors[1].index, 2);
        assert_eq!(result.errors[1].key, None);

        assert_eq!(
            service.get_rule("Rule0").await?,
            Some(Rule::new("drop", "udp", "10.0.0.1", "53"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() -> Result<()> {
        let service = RuleLedgerService::new(MemStore::new());
        let options = ImportOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = Importer::new(&service)
            .import_rules_json(INPUT.as_bytes(), options)
            .await?;

        assert_eq!(result.imported, 2);
        assert!(service.store().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_skip_existing() -> Result<()> {
        let service = RuleLedgerService::new(MemStore::new());
        service
            .create_rule("Rule0", &Rule::new("alert", "tcp", "x", "1"))
            .await?;

        let options = ImportOptions {
            skip_existing: true,
            ..Default::default()
        };
        let result = Importer::new(&service)
            .import_rules_json(INPUT.as_bytes(), options)
            .await?;

        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(service.get_rule("Rule0").await?.unwrap().action, "alert");
        Ok(())
    }

    #[tokio::test]
    async fn test_skip_existing_keeps_undecodable_record() -> Result<()> {
        let service = RuleLedgerService::new(MemStore::new());
        service.store().put("Rule0", b"not json").await?;

        let options = ImportOptions {
            skip_existing: true,
            ..Default::default()
        };
        let result = Importer::new(&service)
            .import_rules_json(INPUT.as_bytes(), options)
            .await?;

        assert_eq!(result.skipped, 1);
        assert_eq!(service.store().get("Rule0").await?, Some(b"not json".to_vec()));
        Ok(())
    }

    #[tokio::test]
    async fn test_skip_existing_reports_failed_lookup() -> Result<()> {
        let service = RuleLedgerService::new(OfflineReads(MemStore::new()));
        let options = ImportOptions {
            skip_existing: true,
            ..Default::default()
        };
        let result = Importer::new(&service)
            .import_rules_json(INPUT.as_bytes(), options)
            .await?;

        assert_eq!(result.imported, 0);
        assert_eq!(result.skipped, 0);
        // two malformed entries plus two failed lookups
        assert_eq!(result.errors.len(), 4);
        let lookup: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.error.contains("ledger offline"))
            .collect();
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup[0].key.as_deref(), Some("Rule0"));
        assert_eq!(lookup[1].key.as_deref(), Some("Rule2"));
        assert!(service.store().0.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_non_array_document() {
        let service = RuleLedgerService::new(MemStore::new());
        let result = Importer::new(&service)
            .import_rules_json(r#"{"Key": "Rule0"}"#.as_bytes(), ImportOptions::default())
            .await;
        assert!(result.is_err());
    }
}
