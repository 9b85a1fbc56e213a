//! Merge-and-renumber engine for contact interaction histories.
//!
//! Two invariants are kept over any [`DocumentStore`]: every visit belongs to
//! exactly one contact, and a contact's visit indices are `1..=N` in
//! `(start time, interaction id)` order. [`InteractionStorage`] repairs them
//! when two contact identities are merged and when one contact is
//! renumbered, choosing per call between in-place updates and the
//! copy-then-delete relocation a sharded store requires.
//!
//! [`DocumentStore`]: footfall_core::store::DocumentStore

mod loader;
mod merge;
mod relocate;
mod renumber;
mod storage;
mod topology;

pub mod error;
pub mod provider;

pub use error::{Error, Result};
pub use merge::{IDENTIFIER_LOCK_TIMEOUT, MergeReport};
pub use relocate::{Location, Relocation};
pub use renumber::RenumberReport;
pub use storage::InteractionStorage;
pub use topology::Topology;

#[cfg(test)]
mod tests;
