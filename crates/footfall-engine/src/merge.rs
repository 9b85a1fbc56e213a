//! Identity merge — fold a dying contact's visits into a surviving contact
//! and renumber the combined history.

use std::time::Duration;

use footfall_core::{
  document::{Document, Field},
  query::{Filter, Set, Update, WriteConcern},
  store::DocumentStore,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, InteractionStorage, Location, Result, Topology};

/// How long a caller waits for an identifier lock before giving up on a
/// merge. Also the default time a store connection waits for a competing
/// writer.
pub const IDENTIFIER_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// What a merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
  pub topology:   Topology,
  /// Visits of both contacts fetched at the start of the merge.
  pub visits:     usize,
  /// Moved to the surviving contact by copy-then-delete.
  pub relocated:  usize,
  /// Moved to the surviving contact by an in-place update.
  pub reassigned: usize,
  /// Already on the surviving contact; only the index changed.
  pub reindexed:  usize,
  pub untouched:  usize,
}

impl MergeReport {
  fn new(topology: Topology, visits: usize) -> Self {
    Self { topology, visits, relocated: 0, reassigned: 0, reindexed: 0, untouched: 0 }
  }
}

/// Running state of a merge pass: the index the next visit receives, plus
/// the tally so far. Threaded by value through [`InteractionStorage::merge_step`].
#[derive(Debug, Clone, Copy)]
struct MergeCursor {
  next_index: u32,
  report:     MergeReport,
}

impl MergeCursor {
  fn advance(mut self) -> Self {
    self.next_index += 1;
    self
  }
}

impl<S: DocumentStore> InteractionStorage<S> {
  /// Reassign every visit of `dying` to `surviving` and renumber the union
  /// `1..=N` in `(start time, interaction id)` order.
  ///
  /// Visits appended by other writers after the initial fetch are not part
  /// of this merge; a later merge or renumber picks them up. Writes already
  /// made are kept if a later step fails.
  pub async fn merge_visits(&self, dying: Uuid, surviving: Uuid) -> Result<MergeReport> {
    let owners = Filter::any([
      Filter::eq(Field::ContactId, dying),
      Filter::eq(Field::ContactId, surviving),
    ]);
    let visits = self.visit_keys(owners, "merge").await?;
    let topology = self.topology().await;

    let mut cursor = MergeCursor {
      next_index: 1,
      report:     MergeReport::new(topology, visits.len()),
    };
    for visit in &visits {
      cursor = self.merge_step(cursor, visit, surviving).await?;
    }

    let report = cursor.report;
    info!(
      %dying,
      %surviving,
      ?topology,
      visits = report.visits,
      relocated = report.relocated,
      reassigned = report.reassigned,
      reindexed = report.reindexed,
      "merged contact visits"
    );
    Ok(report)
  }

  /// Bring one visit into the merged sequence at `cursor.next_index`.
  async fn merge_step(
    &self,
    mut cursor: MergeCursor,
    visit: &Document,
    surviving: Uuid,
  ) -> Result<MergeCursor> {
    let index = cursor.next_index;
    let location = Location::of(visit);
    let mut update = Update::new();

    if visit.contact_id != surviving {
      if cursor.report.topology == Topology::Sharded {
        let mutation = Update::new()
          .set(Set::ContactId(surviving))
          .set(Set::VisitIndex(index));
        let relocation = self.relocate(location, &mutation).await?;
        debug!(interaction_id = %visit.interaction_id, index, ?relocation, "relocated visit");
        cursor.report.relocated += 1;
        return Ok(cursor.advance());
      }
      update.push(Set::ContactId(surviving));
    }

    if visit.visit_index != index {
      update.push(Set::VisitIndex(index));
    }

    if update.is_empty() {
      cursor.report.untouched += 1;
      return Ok(cursor.advance());
    }

    self
      .store
      .update(&location.filter(), &update, WriteConcern::Acknowledged)
      .await
      .map_err(Error::store)?;

    if visit.contact_id != surviving {
      cursor.report.reassigned += 1;
    } else {
      cursor.report.reindexed += 1;
    }
    debug!(interaction_id = %visit.interaction_id, index, "updated visit in place");
    Ok(cursor.advance())
  }
}
