//! Renumbering — recompute one contact's visit indices from chronology.

use footfall_core::{
  document::Field,
  query::{Filter, Set, Update, WriteConcern},
  store::DocumentStore,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, InteractionStorage, Location, Result};

/// What a renumber did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenumberReport {
  pub visits:    usize,
  pub reindexed: usize,
}

impl<S: DocumentStore> InteractionStorage<S> {
  /// Set the visit indices of `contact_id` to `1..=N` in
  /// `(start time, interaction id)` order.
  ///
  /// Only the index changes, never the contact, so every write is an
  /// in-place update whatever the topology.
  pub async fn renumber_interactions(&self, contact_id: Uuid) -> Result<RenumberReport> {
    let visits = self
      .visit_keys(Filter::eq(Field::ContactId, contact_id), "renumber")
      .await?;

    let mut report = RenumberReport { visits: visits.len(), reindexed: 0 };
    for (index, visit) in (1u32..).zip(&visits) {
      if visit.visit_index == index {
        continue;
      }
      let update = Update::new().set(Set::VisitIndex(index));
      self
        .store
        .update(&Location::of(visit).filter(), &update, WriteConcern::Acknowledged)
        .await
        .map_err(Error::store)?;
      debug!(interaction_id = %visit.interaction_id, from = visit.visit_index, to = index, "renumbered visit");
      report.reindexed += 1;
    }

    info!(%contact_id, visits = report.visits, reindexed = report.reindexed, "renumbered contact visits");
    Ok(report)
  }
}
