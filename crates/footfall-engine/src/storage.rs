//! [`InteractionStorage`] — the engine's handle on one interaction collection.

use footfall_core::{
  document::{Document, Field},
  interaction::Visit,
  query::{CHRONOLOGICAL, Filter, FindQuery, Projection},
  registry::DiscriminatorRegistry,
  store::DocumentStore,
};

use crate::{Error, Result};

/// Loader, merge engine and renumber engine over a [`DocumentStore`].
///
/// Holds no mutable state of its own; consistency rests on the store's
/// per-document atomicity, so one value can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct InteractionStorage<S> {
  pub(crate) store:    S,
  pub(crate) registry: DiscriminatorRegistry,
}

impl<S: DocumentStore> InteractionStorage<S> {
  /// Use the built-in subtype registry.
  pub fn new(store: S) -> Self { Self::with_registry(store, DiscriminatorRegistry::default()) }

  pub fn with_registry(store: S, registry: DiscriminatorRegistry) -> Self {
    Self { store, registry }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Fetch the visits matching `owner` in chronological order, carrying only
  /// the fields the merge and renumber passes read.
  pub(crate) async fn visit_keys(
    &self,
    owner: Filter,
    operation: &'static str,
  ) -> Result<Vec<Document>> {
    let visit = self.registry.lookup(Visit::TAG)?;
    let query = FindQuery::new(owner.and(Filter::eq(Field::Discriminator, visit.value.as_str())))
      .sort_by(&CHRONOLOGICAL)
      .project(Projection::Keys);

    self
      .store
      .find(&query)
      .await
      .map_err(Error::store)?
      .ok_or(Error::StoreUnavailable { operation })
  }
}
