// Application layer: operation dispatch and the rule ledger service.
// Every client (CLI host, importer, tests) goes through RuleLedgerService.

pub mod config;
pub mod error;
pub mod operation;
pub mod response;
pub mod service;

pub use config::*;
pub use error::*;
pub use operation::*;
pub use response::*;
pub use service::*;
