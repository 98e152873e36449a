use log::{debug, info, warn};
use serde::Serialize;
use serde_json::value::RawValue;

use crate::domain::{Rule, RuleCodec, default_rules, rule_key};
use crate::storage::{KeyValue, KeyValueStore, RangeScan, StoreError};

use super::{LedgerConfig, LedgerError, MissingRulePolicy, Operation, Response};

/// Rule ledger service: routes named operations to record-level handlers
/// against a host-provided key-value store.
///
/// This is the primary interface for any client (CLI host, importer, tests).
pub struct RuleLedgerService<S> {
    store: S,
    config: LedgerConfig,
}

/// One element of the `queryAllRules` payload.
#[derive(Serialize)]
struct QueryResult<'a> {
    #[serde(rename = "Key")]
    key: &'a str,
    #[serde(rename = "Record")]
    record: Record,
}

/// A stored value embedded in a JSON response.
#[derive(Serialize)]
#[serde(untagged)]
enum Record {
    /// Valid JSON, embedded verbatim.
    Json(Box<RawValue>),
    /// Anything else, embedded as a JSON string.
    Text(String),
}

impl Record {
    fn embed(key: &str, value: &[u8]) -> Self {
        let parsed = std::str::from_utf8(value)
            .ok()
            .and_then(|text| RawValue::from_string(text.to_string()).ok());
        match parsed {
            Some(raw) => Record::Json(raw),
            None => {
                warn!("Record under {} is not JSON, embedding it as a string", key);
                Record::Text(String::from_utf8_lossy(value).into_owned())
            }
        }
    }
}

impl<S: KeyValueStore> RuleLedgerService<S> {
    /// Create a service with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ========================
    // Host entry points
    // ========================

    /// Bootstrap hook called once when the host instantiates the service.
    /// Does not seed any data.
    pub fn init(&self) -> Response {
        debug!("init");
        Response::success(Vec::new())
    }

    /// Run the operation named `function` with `args`.
    ///
    /// Every failure is reported as an error response carrying the error's
    /// message; nothing is retried.
    pub async fn invoke(&self, function: &str, args: &[String]) -> Response {
        let result = self.dispatch(function, args).await;
        if let Err(e) = &result {
            debug!("{} failed: {}", function, e);
        }
        result.into()
    }

    /// Like [`invoke`](Self::invoke) but keeps the typed error.
    ///
    /// Name and argument count are checked before the store is touched.
    pub async fn dispatch(&self, function: &str, args: &[String]) -> Result<Vec<u8>, LedgerError> {
        let op = Operation::from_name(function)
            .ok_or_else(|| LedgerError::UnknownOperation(function.to_string()))?;
        if args.len() != op.arity() {
            return Err(LedgerError::ArgumentCount {
                expected: op.arity(),
            });
        }
        debug!(
            "invoke {} with {} argument(s), mutating: {}",
            op,
            args.len(),
            op.is_mutating()
        );

        match op {
            Operation::QueryRule => self.query_rule(&args[0]).await,
            Operation::InitLedger => self.seed_defaults().await.map(|_| Vec::new()),
            Operation::CreateRule => {
                let rule = Rule::new(
                    args[1].as_str(),
                    args[2].as_str(),
                    args[3].as_str(),
                    args[4].as_str(),
                );
                self.create_rule(&args[0], &rule).await.map(|_| Vec::new())
            }
            Operation::QueryAllRules => self.query_all_rules().await,
            Operation::ChangeRuleSourcePort => self
                .change_rule_source_port(&args[0], &args[1])
                .await
                .map(|_| Vec::new()),
        }
    }

    // ========================
    // Rule operations
    // ========================

    /// Raw bytes stored under `key`; empty if the key is absent.
    pub async fn query_rule(&self, key: &str) -> Result<Vec<u8>, LedgerError> {
        Ok(self.store.get(key).await?.unwrap_or_default())
    }

    /// Decoded rule under `key`, or `None` if the key is absent.
    pub async fn get_rule(&self, key: &str) -> Result<Option<Rule>, LedgerError> {
        match self.store.get(key).await? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(RuleCodec::decode(&bytes)?)),
            _ => Ok(None),
        }
    }

    /// Write the default rules under `<prefix>0`..`<prefix>9`, in index order.
    ///
    /// Writes are independent: a failure stops the seed and leaves the
    /// earlier records in place. Returns the number of records written.
    pub async fn seed_defaults(&self) -> Result<usize, LedgerError> {
        let rules = default_rules();
        for (i, rule) in rules.iter().enumerate() {
            let key = rule_key(&self.config.key_prefix, i);
            self.store.put(&key, &RuleCodec::encode(rule)?).await?;
            info!("Added {}: {}", key, rule);
        }
        Ok(rules.len())
    }

    /// Store `rule` under `key`, replacing whatever was there.
    pub async fn create_rule(&self, key: &str, rule: &Rule) -> Result<(), LedgerError> {
        self.store.put(key, &RuleCodec::encode(rule)?).await?;
        debug!("Created {}: {}", key, rule);
        Ok(())
    }

    /// Every entry in the configured scan range, in store order.
    ///
    /// The scan is closed before returning, whether or not iteration failed.
    pub async fn scan_rules(&self) -> Result<Vec<KeyValue>, LedgerError> {
        let mut scan = self
            .store
            .range_query(&self.config.scan_start, &self.config.scan_end)
            .await?;

        let drained = drain(&mut scan).await;
        let closed = scan.close().await;

        let entries = drained?;
        closed?;
        Ok(entries)
    }

    /// JSON array of `{"Key": ..., "Record": ...}` for every entry in the
    /// scan range. Records are embedded as stored, not re-encoded.
    pub async fn query_all_rules(&self) -> Result<Vec<u8>, LedgerError> {
        let entries = self.scan_rules().await?;
        let results: Vec<QueryResult<'_>> = entries
            .iter()
            .map(|entry| QueryResult {
                key: &entry.key,
                record: Record::embed(&entry.key, &entry.value),
            })
            .collect();

        let payload =
            serde_json::to_vec(&results).map_err(|e| LedgerError::Encode(e.to_string()))?;
        debug!("queryAllRules: {}", String::from_utf8_lossy(&payload));
        Ok(payload)
    }

    /// Replace the source port of the rule under `key` and write it back.
    ///
    /// An absent key is handled per [`MissingRulePolicy`]; a record that
    /// cannot be decoded fails without writing.
    pub async fn change_rule_source_port(
        &self,
        key: &str,
        new_port: &str,
    ) -> Result<Rule, LedgerError> {
        let rule = match self.get_rule(key).await? {
            Some(rule) => {
                if rule.is_blank() {
                    warn!("{} holds a blank rule, only its port will change", key);
                }
                rule
            }
            None => match self.config.missing_rule {
                MissingRulePolicy::Fabricate => {
                    warn!("{} does not exist, writing a blank rule with port {}", key, new_port);
                    Rule::default()
                }
                MissingRulePolicy::Reject => return Err(LedgerError::NotFound(key.to_string())),
            },
        };

        let updated = rule.with_source_port(new_port);
        self.store.put(key, &RuleCodec::encode(&updated)?).await?;
        debug!("Changed source port of {} to {}", key, new_port);
        Ok(updated)
    }
}

async fn drain<R: RangeScan>(scan: &mut R) -> Result<Vec<KeyValue>, StoreError> {
    let mut entries = Vec::new();
    while let Some(entry) = scan.next().await {
        entries.push(entry?);
    }
    Ok(entries)
}
