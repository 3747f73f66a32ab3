//! Source-of-truth backends.
//!
//! The in-memory backend is always available. The SQLite backend is enabled
//! with the `sqlite` feature:
//!
//! ```bash
//! cargo build -p tierstore --features sqlite
//! ```

mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use inmemory::MemorySourceOfTruth;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSourceOfTruth;
