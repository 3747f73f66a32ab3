//! SQLite source of truth using `rusqlite` through `tokio-rusqlite`.
//!
//! Values are stored as JSON in a single key/value table.

mod error;
mod schema;
mod source;

pub use source::SqliteSourceOfTruth;
