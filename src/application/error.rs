use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Incorrect number of arguments. Expecting {expected}")]
    ArgumentCount { expected: usize },

    #[error("Invalid Smart Contract function name.")]
    UnknownOperation(String),

    #[error("{0} does not exist")]
    NotFound(String),

    #[error("Failed to decode rule: {0}")]
    Decode(String),

    #[error("Failed to encode rule: {0}")]
    Encode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
