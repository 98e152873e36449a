use serde::{Deserialize, Serialize};

/// Number of records written by the default seed.
pub const DEFAULT_RULE_COUNT: usize = 10;

/// Port token meaning "match every source port".
pub const ANY_PORT: &str = "any";

/// A traffic-filtering directive stored in the ledger.
///
/// The ledger key is not part of the record: callers pick it on creation.
/// Field names on the wire are fixed (`ruleaction`, `protocol`, `sourceip`,
/// `sourceport`) because previously written records must stay readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "ruleaction", default)]
    pub action: String,
    #[serde(rename = "protocol", default)]
    pub protocol: String,
    #[serde(rename = "sourceip", default)]
    pub source_ip: String,
    #[serde(rename = "sourceport", default)]
    pub source_port: String,
}

impl Rule {
    pub fn new(
        action: impl Into<String>,
        protocol: impl Into<String>,
        source_ip: impl Into<String>,
        source_port: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            protocol: protocol.into(),
            source_ip: source_ip.into(),
            source_port: source_port.into(),
        }
    }

    pub fn with_source_port(mut self, source_port: impl Into<String>) -> Self {
        self.source_port = source_port.into();
        self
    }

    /// Returns true if every field except the source port is empty.
    pub fn is_blank(&self) -> bool {
        self.action.is_empty() && self.protocol.is_empty() && self.source_ip.is_empty()
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.action, self.protocol, self.source_ip, self.source_port
        )
    }
}

/// Builds the ledger key for the rule at `index`, e.g. `Rule3`.
pub fn rule_key(prefix: &str, index: usize) -> String {
    format!("{}{}", prefix, index)
}

/// The placeholder alert rules written by the default seed, in index order.
///
/// Index 0 carries an explicit port; every other entry matches any port.
pub fn default_rules() -> Vec<Rule> {
    (0..DEFAULT_RULE_COUNT)
        .map(|i| {
            let port = if i == 0 { "2589" } else { ANY_PORT };
            Rule::new("alert", "tcp", "$HOME_NET", port)
        })
        .collect()
}
