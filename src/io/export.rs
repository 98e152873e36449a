use anyhow::{Context, Result};
use std::io::Write;

use crate::application::RuleLedgerService;
use crate::domain::RuleCodec;
use crate::storage::KeyValueStore;

/// Exporter for dumping the rules in the scan range to various formats
pub struct Exporter<'a, S> {
    service: &'a RuleLedgerService<S>,
}

impl<'a, S: KeyValueStore> Exporter<'a, S> {
    pub fn new(service: &'a RuleLedgerService<S>) -> Self {
        Self { service }
    }

    /// Export rules to CSV format, one row per key
    pub async fn export_rules_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let entries = self.service.scan_rules().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "key",
            "ruleaction",
            "protocol",
            "sourceip",
            "sourceport",
        ])?;

        let mut count = 0;
        for entry in &entries {
            let rule = RuleCodec::decode(&entry.value)
                .with_context(|| format!("Failed to decode rule {}", entry.key))?;

            csv_writer.write_record([
                entry.key.as_str(),
                rule.action.as_str(),
                rule.protocol.as_str(),
                rule.source_ip.as_str(),
                rule.source_port.as_str(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export rules as the pretty-printed `queryAllRules` payload
    pub async fn export_rules_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let payload = self.service.query_all_rules().await?;
        let results: Vec<serde_json::Value> =
            serde_json::from_slice(&payload).context("Invalid queryAllRules payload")?;

        serde_json::to_writer_pretty(&mut writer, &results)?;
        writeln!(writer)?;
        Ok(results.len())
    }
}
