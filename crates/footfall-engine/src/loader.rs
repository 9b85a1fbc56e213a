//! Interaction loader — one interaction by identity, or a page of a
//! contact's history narrowed to a subtype.

use footfall_core::{
  document::Field,
  interaction::{InteractionRecord, Visit},
  options::{HistoryWindow, InteractionLoadOptions},
  query::{Filter, FindQuery, NEWEST_FIRST, Projection},
  store::DocumentStore,
};

use crate::{Error, InteractionStorage, Result};

impl<S: DocumentStore> InteractionStorage<S> {
  /// Load interactions of type `T`.
  ///
  /// An absent cursor yields an empty list here: readers treat "no cursor"
  /// and "no rows" alike. Requesting a subtype without a registered
  /// discriminator fails before the store is contacted.
  pub async fn load_interactions<T: InteractionRecord>(
    &self,
    options: &InteractionLoadOptions,
  ) -> Result<Vec<T>> {
    let query = match options {
      InteractionLoadOptions::Interaction { interaction_id, contact_id } => {
        let mut filter = Filter::eq(Field::InteractionId, *interaction_id);
        if let Some(contact_id) = contact_id {
          filter = filter.and(Filter::eq(Field::ContactId, *contact_id));
        }
        FindQuery::new(filter)
      }
      InteractionLoadOptions::History(window) => {
        if window.take == 0 {
          return Ok(Vec::new());
        }
        self.history_query::<T>(window)?
      }
    };

    let Some(documents) = self.store.find(&query).await.map_err(Error::store)? else {
      return Ok(Vec::new());
    };

    documents
      .into_iter()
      .map(|doc| T::from_document(doc).map_err(Error::from))
      .collect()
  }

  /// [`load_interactions`](Self::load_interactions) narrowed to visits.
  pub async fn load_visits(&self, options: &InteractionLoadOptions) -> Result<Vec<Visit>> {
    self.load_interactions::<Visit>(options).await
  }

  fn history_query<T: InteractionRecord>(&self, window: &HistoryWindow) -> Result<FindQuery> {
    let mut filter = Filter::eq(Field::ContactId, window.contact_id);
    if let Some(min) = window.minimum_start {
      filter = filter.and(Filter::gte(Field::StartAt, min));
    }
    if let Some(max) = window.maximum_start {
      filter = filter.and(Filter::lt(Field::StartAt, max));
    }

    let mut projection = Projection::All;
    if let Some(discriminator) = self.registry.resolve::<T>()? {
      filter = Filter::eq(Field::Discriminator, discriminator.value.as_str()).and(filter);
      projection = discriminator.projection();
    }

    Ok(
      FindQuery::new(filter)
        .sort_by(&NEWEST_FIRST)
        .skip(window.skip)
        .limit(window.take)
        .project(projection),
    )
  }
}
