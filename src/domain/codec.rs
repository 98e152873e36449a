use crate::application::LedgerError;

use super::Rule;

/// Byte encoding of [`Rule`] records as stored in the ledger.
///
/// The encoding is a compact JSON object with the keys `ruleaction`,
/// `protocol`, `sourceip` and `sourceport`, in that order.
pub struct RuleCodec;

impl RuleCodec {
    pub fn encode(rule: &Rule) -> Result<Vec<u8>, LedgerError> {
        serde_json::to_vec(rule).map_err(|e| LedgerError::Encode(e.to_string()))
    }

    /// Decode a stored record.
    ///
    /// Missing fields decode as empty strings. Bytes that are not a JSON
    /// object are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Rule, LedgerError> {
        serde_json::from_slice(bytes).map_err(|e| LedgerError::Decode(e.to_string()))
    }
}
