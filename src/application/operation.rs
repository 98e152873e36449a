/// The named operations a host may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    QueryRule,
    InitLedger,
    CreateRule,
    QueryAllRules,
    ChangeRuleSourcePort,
}

/// Host-facing names, looked up by [`Operation::from_name`].
const OPERATIONS: &[(&str, Operation)] = &[
    ("queryRule", Operation::QueryRule),
    ("initLedger", Operation::InitLedger),
    ("createRule", Operation::CreateRule),
    ("queryAllRules", Operation::QueryAllRules),
    ("changeRuleSourcePort", Operation::ChangeRuleSourcePort),
];

impl Operation {
    /// Names are matched exactly, including case.
    pub fn from_name(name: &str) -> Option<Self> {
        OPERATIONS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, op)| *op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::QueryRule => "queryRule",
            Operation::InitLedger => "initLedger",
            Operation::CreateRule => "createRule",
            Operation::QueryAllRules => "queryAllRules",
            Operation::ChangeRuleSourcePort => "changeRuleSourcePort",
        }
    }

    /// Exact number of string arguments the operation takes.
    pub fn arity(&self) -> usize {
        match self {
            Operation::QueryRule => 1,
            Operation::InitLedger => 0,
            Operation::CreateRule => 5,
            Operation::QueryAllRules => 0,
            Operation::ChangeRuleSourcePort => 2,
        }
    }

    /// Returns true if the operation writes to the ledger.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Operation::InitLedger | Operation::CreateRule | Operation::ChangeRuleSourcePort
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
