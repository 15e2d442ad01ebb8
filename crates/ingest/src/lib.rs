//! Transaction ingest: CSV loading and cleaning of the retail line-item log.

pub mod cleaner;
pub mod loader;

pub use cleaner::{clean_transactions, CleanReport};
pub use loader::{load_transactions, load_transactions_file, RawTransaction};
