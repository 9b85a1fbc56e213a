//! SQLite backend for the Footfall interaction store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. A single SQLite file is never sharded;
//! the `chunks` metadata table exists so deployments that front a partitioned
//! store can describe their topology to the engine.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
