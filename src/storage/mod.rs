mod memory;
mod scan;
mod sqlite;
mod store;

pub use memory::*;
pub use scan::*;
pub use sqlite::*;
pub use store::*;

/// SQL migration for the ledger state table
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
