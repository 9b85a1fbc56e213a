//! Query vocabulary spoken to a [`DocumentStore`](crate::store::DocumentStore).
//!
//! Filters, updates, sort keys and projections are plain data. Backends
//! translate them into their native query language; [`Filter::matches`],
//! [`Update::apply`] and [`Projection::apply`] give the reference semantics
//! every backend must agree with.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::document::{Document, Field, Value};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// A predicate over interaction documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
  Eq(Field, Value),
  /// Field is greater than or equal to the value.
  Gte(Field, Value),
  /// Field is strictly less than the value.
  Lt(Field, Value),
  And(Vec<Filter>),
  Or(Vec<Filter>),
}

impl Filter {
  pub fn eq(field: Field, value: impl Into<Value>) -> Self {
    Self::Eq(field, value.into())
  }

  pub fn gte(field: Field, value: impl Into<Value>) -> Self {
    Self::Gte(field, value.into())
  }

  pub fn lt(field: Field, value: impl Into<Value>) -> Self {
    Self::Lt(field, value.into())
  }

  /// Conjoin `other`, flattening nested conjunctions.
  pub fn and(self, other: Filter) -> Self {
    match (self, other) {
      (Self::And(mut left), Self::And(right)) => {
        left.extend(right);
        Self::And(left)
      }
      (Self::And(mut left), right) => {
        left.push(right);
        Self::And(left)
      }
      (left, Self::And(mut right)) => {
        right.insert(0, left);
        Self::And(right)
      }
      (left, right) => Self::And(vec![left, right]),
    }
  }

  /// Disjunction of `filters`.
  pub fn any(filters: impl IntoIterator<Item = Filter>) -> Self {
    Self::Or(filters.into_iter().collect())
  }

  /// The `(contact, interaction)` pair that addresses one stored visit at
  /// its current location.
  pub fn located(contact_id: Uuid, interaction_id: Uuid) -> Self {
    Self::eq(Field::ContactId, contact_id)
      .and(Self::eq(Field::InteractionId, interaction_id))
  }

  /// Evaluate the filter against a document.
  pub fn matches(&self, doc: &Document) -> bool {
    match self {
      Self::Eq(field, value) => doc.field(*field).as_ref() == Some(value),
      Self::Gte(field, value) => compare(doc, *field, value)
        .is_some_and(|o| o != Ordering::Less),
      Self::Lt(field, value) => compare(doc, *field, value)
        .is_some_and(|o| o == Ordering::Less),
      Self::And(all) => all.iter().all(|f| f.matches(doc)),
      Self::Or(any) => any.iter().any(|f| f.matches(doc)),
    }
  }
}

fn compare(doc: &Document, field: Field, value: &Value) -> Option<Ordering> {
  let actual = doc.field(field)?;
  (std::mem::discriminant(&actual) == std::mem::discriminant(value))
    .then(|| actual.cmp(value))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// A single field assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Set {
  ContactId(Uuid),
  VisitIndex(u32),
}

/// A combined set of field assignments applied in one write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Update {
  sets: Vec<Set>,
}

impl Update {
  pub fn new() -> Self { Self::default() }

  pub fn set(mut self, set: Set) -> Self {
    self.push(set);
    self
  }

  /// Add an assignment; a later assignment to the same field replaces the
  /// earlier one.
  pub fn push(&mut self, set: Set) {
    self
      .sets
      .retain(|s| std::mem::discriminant(s) != std::mem::discriminant(&set));
    self.sets.push(set);
  }

  /// Merge several updates into one.
  pub fn combine(updates: impl IntoIterator<Item = Update>) -> Self {
    let mut combined = Self::new();
    for set in updates.into_iter().flat_map(|u| u.sets) {
      combined.push(set);
    }
    combined
  }

  pub fn is_empty(&self) -> bool { self.sets.is_empty() }

  pub fn sets(&self) -> &[Set] { &self.sets }

  pub fn apply(&self, doc: &mut Document) {
    for set in &self.sets {
      match *set {
        Set::ContactId(id) => doc.contact_id = id,
        Set::VisitIndex(index) => doc.visit_index = index,
      }
    }
  }
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
  pub field:     Field,
  pub direction: Direction,
}

impl SortKey {
  pub const fn ascending(field: Field) -> Self {
    Self { field, direction: Direction::Ascending }
  }

  pub const fn descending(field: Field) -> Self {
    Self { field, direction: Direction::Descending }
  }
}

/// The total visit order: start time, then interaction identity.
pub const CHRONOLOGICAL: [SortKey; 2] = [
  SortKey::ascending(Field::StartAt),
  SortKey::ascending(Field::InteractionId),
];

/// Newest first, as returned to history readers.
pub const NEWEST_FIRST: [SortKey; 2] = [
  SortKey::descending(Field::StartAt),
  SortKey::descending(Field::InteractionId),
];

/// Compare two documents by `keys`, in order. Unset fields sort first.
pub fn compare_documents(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
  keys
    .iter()
    .map(|key| {
      let ord = a.field(key.field).cmp(&b.field(key.field));
      match key.direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
      }
    })
    .find(|o| o.is_ne())
    .unwrap_or(Ordering::Equal)
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// Which parts of a document a find returns.
///
/// The identity, contact, start time, visit index and discriminator are
/// always returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
  #[default]
  All,
  /// Only the always-returned fields; no channel, empty payload.
  Keys,
  /// The channel plus the named payload fields.
  Fields(Vec<String>),
}

impl Projection {
  pub fn apply(&self, mut doc: Document) -> Document {
    match self {
      Self::All => {}
      Self::Keys => {
        doc.channel_id = None;
        doc.payload.clear();
      }
      Self::Fields(keep) => doc.payload.retain(|k, _| keep.contains(k)),
    }
    doc
  }
}

// ─── Find ────────────────────────────────────────────────────────────────────

/// A filtered find with cursor options.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
  pub filter:     Filter,
  pub sort:       Vec<SortKey>,
  pub skip:       usize,
  /// `None` returns every remaining match.
  pub limit:      Option<usize>,
  pub projection: Projection,
}

impl FindQuery {
  pub fn new(filter: Filter) -> Self {
    Self {
      filter,
      sort: Vec::new(),
      skip: 0,
      limit: None,
      projection: Projection::All,
    }
  }

  pub fn sort_by(mut self, keys: &[SortKey]) -> Self {
    self.sort = keys.to_vec();
    self
  }

  pub fn skip(mut self, n: usize) -> Self {
    self.skip = n;
    self
  }

  pub fn limit(mut self, n: usize) -> Self {
    self.limit = Some(n);
    self
  }

  pub fn project(mut self, projection: Projection) -> Self {
    self.projection = projection;
    self
  }
}

// ─── Write options ───────────────────────────────────────────────────────────

/// Whether a write waits for the store to confirm it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteConcern {
  Acknowledged,
  /// Fire-and-forget: the outcome is never reported to the caller.
  Unacknowledged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
  /// Remove at most one matching document.
  Single,
  All,
}
