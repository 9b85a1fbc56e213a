//! Test doubles and fixtures shared by the engine tests.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};
use footfall_core::{
  document::{Document, Field},
  interaction::Visit,
  query::{
    CHRONOLOGICAL, Filter, FindQuery, RemoveMode, Update, WriteConcern, compare_documents,
  },
  store::{DUPLICATE_KEY_CODE, DocumentStore, StoreError},
};
use footfall_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::InteractionStorage;

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

pub fn visit(contact: Uuid, secs: i64, index: u32) -> Document {
  Visit::new(contact, at(secs), index).to_document().unwrap()
}

pub async fn sqlite() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

pub async fn seed<S: DocumentStore>(store: &S, docs: &[Document]) {
  for doc in docs {
    store.insert(doc).await.unwrap();
  }
}

/// `(start seconds, visit index)` of every visit of `contact`, in visit order.
pub async fn history<S: DocumentStore>(
  storage: &InteractionStorage<S>,
  contact: Uuid,
) -> Vec<(i64, u32)> {
  let query = FindQuery::new(Filter::eq(Field::ContactId, contact)).sort_by(&CHRONOLOGICAL);
  storage
    .store()
    .find(&query)
    .await
    .unwrap()
    .unwrap()
    .iter()
    .map(|d| (d.start_at.timestamp(), d.visit_index))
    .collect()
}

/// Assert indices are exactly `1..=N` in visit order.
pub async fn assert_numbered<S: DocumentStore>(storage: &InteractionStorage<S>, contact: Uuid) {
  let indices: Vec<u32> = history(storage, contact).await.into_iter().map(|(_, i)| i).collect();
  let expected: Vec<u32> = (1..=indices.len() as u32).collect();
  assert_eq!(indices, expected);
}

// ─── Memory store ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("memory store error (code {code:?}): {message}")]
pub struct MemoryError {
  code:    Option<i32>,
  message: String,
}

impl StoreError for MemoryError {
  fn code(&self) -> Option<i32> { self.code }
}

/// Which fields make a document unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uniqueness {
  /// One document per interaction id, as on a single node.
  Global,
  /// One document per `(contact, interaction)`, as when each contact's copy
  /// lands on a different shard.
  PerShard,
}

/// A store failure injected by [`MemoryStore::failing`]. Injected errors
/// never carry the duplicate-key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  /// Inserts fail from the given call onwards, counted since the last
  /// [`MemoryStore::reset_calls`].
  Insert { from_call: usize },
  /// Every update fails.
  Update,
}

/// Code carried by injected failures.
pub const FAULT_CODE: i32 = 13;

/// What the topology probe sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
  Chunks(u64),
  Fails,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
  pub find:                  usize,
  pub find_one:              usize,
  pub insert:                usize,
  pub update:                usize,
  pub acknowledged_remove:   usize,
  pub unacknowledged_remove: usize,
  pub chunk_count:           usize,
}

impl Calls {
  pub fn total(&self) -> usize {
    self.find
      + self.find_one
      + self.insert
      + self.update
      + self.acknowledged_remove
      + self.unacknowledged_remove
      + self.chunk_count
  }

  pub fn writes(&self) -> usize {
    self.insert + self.update + self.acknowledged_remove + self.unacknowledged_remove
  }
}

#[derive(Default)]
struct State {
  docs:    Vec<Document>,
  calls:   Calls,
  /// Appears right after the next acknowledged remove.
  planted: Option<Document>,
}

/// An in-process document store with knobs for the failure modes the
/// engine must handle.
pub struct MemoryStore {
  uniqueness: Uniqueness,
  probe:      Probe,
  cursor:     bool,
  fault:      Option<Fault>,
  state:      Mutex<State>,
}

impl MemoryStore {
  pub fn new(uniqueness: Uniqueness, probe: Probe) -> Self {
    Self { uniqueness, probe, cursor: true, fault: None, state: Mutex::default() }
  }

  /// Finds hand back no cursor.
  pub fn without_cursor(mut self) -> Self {
    self.cursor = false;
    self
  }

  pub fn failing(mut self, fault: Fault) -> Self {
    self.fault = Some(fault);
    self
  }

  fn state(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap() }

  pub fn calls(&self) -> Calls { self.state().calls }

  pub fn reset_calls(&self) { self.state().calls = Calls::default(); }

  pub fn documents(&self) -> Vec<Document> { self.state().docs.clone() }

  /// Bypass the store interface, e.g. to plant a concurrent writer's copy.
  pub fn put(&self, doc: Document) { self.state().docs.push(doc); }

  /// Have a concurrent writer store `doc` as soon as the next acknowledged
  /// remove returns.
  pub fn plant_after_remove(&self, doc: Document) { self.state().planted = Some(doc); }

  fn injected(operation: &str) -> MemoryError {
    MemoryError { code: Some(FAULT_CODE), message: format!("{operation} rejected") }
  }

  fn collides(&self, a: &Document, b: &Document) -> bool {
    match self.uniqueness {
      Uniqueness::Global => a.interaction_id == b.interaction_id,
      Uniqueness::PerShard => {
        a.interaction_id == b.interaction_id && a.contact_id == b.contact_id
      }
    }
  }
}

impl DocumentStore for MemoryStore {
  type Error = MemoryError;

  async fn find(&self, query: &FindQuery) -> Result<Option<Vec<Document>>, MemoryError> {
    let mut state = self.state();
    state.calls.find += 1;
    if !self.cursor {
      return Ok(None);
    }

    let mut docs: Vec<Document> =
      state.docs.iter().filter(|d| query.filter.matches(d)).cloned().collect();
    docs.sort_by(|a, b| compare_documents(a, b, &query.sort));
    Ok(Some(
      docs
        .into_iter()
        .skip(query.skip)
        .take(query.limit.unwrap_or(usize::MAX))
        .map(|d| query.projection.apply(d))
        .collect(),
    ))
  }

  async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, MemoryError> {
    let mut state = self.state();
    state.calls.find_one += 1;
    Ok(state.docs.iter().find(|d| filter.matches(d)).cloned())
  }

  async fn insert(&self, document: &Document) -> Result<(), MemoryError> {
    let mut state = self.state();
    state.calls.insert += 1;
    if let Some(Fault::Insert { from_call }) = self.fault
      && state.calls.insert >= from_call
    {
      return Err(Self::injected("insert"));
    }
    if state.docs.iter().any(|d| self.collides(d, document)) {
      return Err(MemoryError {
        code:    Some(DUPLICATE_KEY_CODE),
        message: format!("duplicate key {}", document.interaction_id),
      });
    }
    state.docs.push(document.clone());
    Ok(())
  }

  async fn update(
    &self,
    filter: &Filter,
    update: &Update,
    concern: WriteConcern,
  ) -> Result<u64, MemoryError> {
    let mut state = self.state();
    state.calls.update += 1;
    if self.fault == Some(Fault::Update) {
      return Err(Self::injected("update"));
    }
    let mut matched = 0;
    for doc in state.docs.iter_mut().filter(|d| filter.matches(d)) {
      update.apply(doc);
      matched += 1;
    }
    Ok(if concern == WriteConcern::Acknowledged { matched } else { 0 })
  }

  async fn remove(
    &self,
    filter: &Filter,
    mode: RemoveMode,
    concern: WriteConcern,
  ) -> Result<u64, MemoryError> {
    let mut state = self.state();
    match concern {
      WriteConcern::Acknowledged => state.calls.acknowledged_remove += 1,
      WriteConcern::Unacknowledged => state.calls.unacknowledged_remove += 1,
    }

    let before = state.docs.len();
    match mode {
      RemoveMode::All => state.docs.retain(|d| !filter.matches(d)),
      RemoveMode::Single => {
        if let Some(pos) = state.docs.iter().position(|d| filter.matches(d)) {
          state.docs.remove(pos);
        }
      }
    }
    let removed = (before - state.docs.len()) as u64;
    if concern == WriteConcern::Acknowledged
      && let Some(doc) = state.planted.take()
    {
      state.docs.push(doc);
    }
    Ok(if concern == WriteConcern::Acknowledged { removed } else { 0 })
  }

  async fn chunk_count(&self) -> Result<u64, MemoryError> {
    self.state().calls.chunk_count += 1;
    match self.probe {
      Probe::Chunks(n) => Ok(n),
      Probe::Fails => Err(MemoryError {
        code:    None,
        message: "not authorized on config".into(),
      }),
    }
  }
}
