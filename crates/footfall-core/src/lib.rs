//! Core types and trait definitions for the Footfall interaction store.
//!
//! This crate is deliberately free of database dependencies. It defines the
//! document model, the query vocabulary spoken to a backend, and the
//! [`store::DocumentStore`] trait every backend implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod document;
pub mod error;
pub mod interaction;
pub mod options;
pub mod query;
pub mod registry;
pub mod store;

pub use error::{Error, Result};
