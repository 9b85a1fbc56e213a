//! Shard-aware relocation — moving a visit to another contact when the
//! contact is not part of the shard key.
//!
//! A contact change on a sharded collection cannot be an in-place update:
//! the document has to be written at its new location and removed from the
//! old one. The two steps are not atomic, so the procedure is written to
//! converge when re-run or raced:
//!
//! 1. re-read the full document at its current location;
//! 2. apply the mutation to the in-memory copy;
//! 3. insert the copy;
//! 4. remove the original without waiting for acknowledgement, since the
//!    durable replacement already exists;
//! 5. if step 3 hits a duplicate key, remove the original with
//!    acknowledgement and insert the copy again;
//! 6. if that insert collides too, bring the existing destination copy up to
//!    date, failing if the identity now lives anywhere else.

use footfall_core::{
  document::Document,
  query::{Filter, RemoveMode, Update, WriteConcern},
  store::{DocumentStore, StoreError},
};
use tracing::debug;
use uuid::Uuid;

use crate::{Error, InteractionStorage, Result};

/// Where one visit currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
  pub contact_id:     Uuid,
  pub interaction_id: Uuid,
}

impl Location {
  pub fn of(doc: &Document) -> Self {
    Self { contact_id: doc.contact_id, interaction_id: doc.interaction_id }
  }

  pub fn filter(&self) -> Filter { Filter::located(self.contact_id, self.interaction_id) }
}

/// How a relocation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
  /// Copy inserted, original removed unacknowledged.
  Moved,
  /// Copy collided with an existing key; original removed with
  /// acknowledgement and the copy re-inserted.
  Recovered,
  /// The destination copy already existed and was brought up to date.
  Converged,
}

impl<S: DocumentStore> InteractionStorage<S> {
  /// Move the visit at `source` by applying `mutation` through
  /// copy-then-delete.
  pub async fn relocate(&self, source: Location, mutation: &Update) -> Result<Relocation> {
    let source_filter = source.filter();
    let mut copy = self
      .store
      .find_one(&source_filter)
      .await
      .map_err(Error::store)?
      .ok_or(Error::VisitNotFound {
        contact_id:     source.contact_id,
        interaction_id: source.interaction_id,
      })?;
    mutation.apply(&mut copy);

    match self.store.insert(&copy).await {
      Ok(()) => {
        self
          .store
          .remove(&source_filter, RemoveMode::Single, WriteConcern::Unacknowledged)
          .await
          .map_err(Error::store)?;
        Ok(Relocation::Moved)
      }
      Err(e) if e.is_duplicate_key() => {
        debug!(
          interaction_id = %source.interaction_id,
          "relocation hit a duplicate key, removing original before re-insert"
        );
        self
          .store
          .remove(&source_filter, RemoveMode::Single, WriteConcern::Acknowledged)
          .await
          .map_err(Error::store)?;
        self.reinsert(&copy, mutation).await
      }
      Err(e) => Err(Error::store(e)),
    }
  }

  async fn reinsert(&self, copy: &Document, mutation: &Update) -> Result<Relocation> {
    match self.store.insert(copy).await {
      Ok(()) => Ok(Relocation::Recovered),
      // Another writer got the copy there first; make sure it carries our
      // mutation.
      Err(e) if e.is_duplicate_key() => {
        let destination = Location::of(copy);
        let matched = self
          .store
          .update(&destination.filter(), mutation, WriteConcern::Acknowledged)
          .await
          .map_err(Error::store)?;
        if matched == 0 {
          return Err(Error::DestinationMissing {
            contact_id:     destination.contact_id,
            interaction_id: destination.interaction_id,
          });
        }
        Ok(Relocation::Converged)
      }
      Err(e) => Err(Error::store(e)),
    }
  }
}
