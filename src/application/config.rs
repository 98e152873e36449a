/// What `changeRuleSourcePort` does when the key holds no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingRulePolicy {
    /// Write back an otherwise empty record carrying only the new port.
    /// This is the long-standing ledger behaviour and stays the default.
    #[default]
    Fabricate,
    /// Fail with `NotFound` and leave the ledger untouched.
    Reject,
}

impl MissingRulePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingRulePolicy::Fabricate => "fabricate",
            MissingRulePolicy::Reject => "reject",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fabricate" => Some(MissingRulePolicy::Fabricate),
            "reject" => Some(MissingRulePolicy::Reject),
            _ => None,
        }
    }
}

impl std::fmt::Display for MissingRulePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime settings for [`RuleLedgerService`](super::RuleLedgerService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Inclusive lower bound of the `queryAllRules` scan.
    pub scan_start: String,
    /// Exclusive upper bound of the `queryAllRules` scan.
    pub scan_end: String,
    /// Prefix of the keys written by the default seed.
    pub key_prefix: String,
    pub missing_rule: MissingRulePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            scan_start: "Rule0".to_string(),
            scan_end: "Rule999".to_string(),
            key_prefix: "Rule".to_string(),
            missing_rule: MissingRulePolicy::default(),
        }
    }
}

impl LedgerConfig {
    pub fn with_scan_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.scan_start = start.into();
        self.scan_end = end.into();
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_missing_rule(mut self, policy: MissingRulePolicy) -> Self {
        self.missing_rule = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = LedgerConfig::default();
        assert_eq!(config.scan_start, "Rule0");
        assert_eq!(config.scan_end, "Rule999");
        assert_eq!(config.key_prefix, "Rule");
        assert_eq!(config.missing_rule, MissingRulePolicy::Fabricate);
    }

    #[test]
    fn test_builders() {
        let config = LedgerConfig::default()
            .with_scan_range("A", "B")
            .with_key_prefix("Fw")
            .with_missing_rule(MissingRulePolicy::Reject);
        assert_eq!(config.scan_start, "A");
        assert_eq!(config.scan_end, "B");
        assert_eq!(config.key_prefix, "Fw");
        assert_eq!(config.missing_rule, MissingRulePolicy::Reject);
    }

    #[test]
    fn test_policy_roundtrip() {
        for policy in [MissingRulePolicy::Fabricate, MissingRulePolicy::Reject] {
            assert_eq!(MissingRulePolicy::from_str(policy.as_str()), Some(policy));
        }
        assert_eq!(MissingRulePolicy::from_str("REJECT"), Some(MissingRulePolicy::Reject));
        assert_eq!(MissingRulePolicy::from_str("ignore"), None);
    }
}
