//! SQLite backend for the campus community engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. One [`SqliteStore`] serves as
//! academic directory, identity directory and community store at once.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
