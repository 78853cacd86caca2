//! SQLite backend for the Tally sales store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each of the three logical collections
//! (sales, item details, ledger details) is a table of JSON documents.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
