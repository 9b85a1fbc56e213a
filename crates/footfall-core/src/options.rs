//! Load options — what the interaction loader is asked to fetch.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Either one interaction by identity, or a page of a contact's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionLoadOptions {
  /// Exact interaction, optionally required to belong to `contact_id`.
  Interaction {
    interaction_id: Uuid,
    contact_id:     Option<Uuid>,
  },
  History(HistoryWindow),
}

impl InteractionLoadOptions {
  pub fn interaction(interaction_id: Uuid) -> Self {
    Self::Interaction { interaction_id, contact_id: None }
  }

  pub fn scoped_interaction(interaction_id: Uuid, contact_id: Uuid) -> Self {
    Self::Interaction { interaction_id, contact_id: Some(contact_id) }
  }
}

impl From<HistoryWindow> for InteractionLoadOptions {
  fn from(window: HistoryWindow) -> Self { Self::History(window) }
}

/// A time-bounded, paged slice of one contact's interactions, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWindow {
  pub contact_id:    Uuid,
  /// Inclusive lower bound on the start time.
  pub minimum_start: Option<DateTime<Utc>>,
  /// Exclusive upper bound on the start time.
  pub maximum_start: Option<DateTime<Utc>>,
  pub skip:          usize,
  /// Page size. Zero loads nothing without touching the store.
  pub take:          usize,
}

impl HistoryWindow {
  /// The whole history of `contact_id`.
  pub fn new(contact_id: Uuid) -> Self {
    Self {
      contact_id,
      minimum_start: None,
      maximum_start: None,
      skip: 0,
      take: usize::MAX,
    }
  }

  pub fn since(mut self, at: DateTime<Utc>) -> Self {
    self.minimum_start = Some(at);
    self
  }

  pub fn before(mut self, at: DateTime<Utc>) -> Self {
    self.maximum_start = Some(at);
    self
  }

  pub fn skip(mut self, n: usize) -> Self {
    self.skip = n;
    self
  }

  pub fn take(mut self, n: usize) -> Self {
    self.take = n;
    self
  }
}
