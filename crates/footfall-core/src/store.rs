//! The `DocumentStore` trait and its error contract.
//!
//! The trait is implemented by storage backends (e.g. `footfall-store-sqlite`).
//! The merge and renumber engine depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  document::Document,
  query::{Filter, FindQuery, RemoveMode, Update, WriteConcern},
};

/// The well-known server code for a unique-key constraint violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors a backend reports. Callers inspect [`StoreError::code`] to tell a
/// duplicate-key violation apart from every other failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The numeric server code carried by this failure, if any.
  fn code(&self) -> Option<i32>;

  fn is_duplicate_key(&self) -> bool { self.code() == Some(DUPLICATE_KEY_CODE) }
}

/// Abstraction over the interaction collection of a document store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait DocumentStore: Send + Sync {
  type Error: StoreError;

  /// Run a filtered find.
  ///
  /// `Ok(None)` means the store handed back no cursor at all, which callers
  /// treat as the store being unavailable. No matches is `Ok(Some(vec![]))`.
  fn find<'a>(
    &'a self,
    query: &'a FindQuery,
  ) -> impl Future<Output = Result<Option<Vec<Document>>, Self::Error>> + Send + 'a;

  /// Return the first document matching `filter`, if any.
  fn find_one<'a>(
    &'a self,
    filter: &'a Filter,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + 'a;

  /// Insert a new document. A document whose identity already exists at the
  /// same location fails with a duplicate-key error.
  fn insert<'a>(
    &'a self,
    document: &'a Document,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Apply `update` to every document matching `filter`. Returns the number
  /// of matched documents; always `0` for unacknowledged writes.
  fn update<'a>(
    &'a self,
    filter: &'a Filter,
    update: &'a Update,
    concern: WriteConcern,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Remove documents matching `filter`. Returns the number removed; always
  /// `0` for unacknowledged writes.
  fn remove<'a>(
    &'a self,
    filter: &'a Filter,
    mode: RemoveMode,
    concern: WriteConcern,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Number of partition chunks recorded for the interaction collection in
  /// the store's metadata. Zero means the collection is not sharded.
  fn chunk_count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
