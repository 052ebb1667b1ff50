//! CarePoints Persistence - SQLite storage for the rewards ledger

pub mod cache;
pub mod sqlite;

pub use sqlite::Database;
