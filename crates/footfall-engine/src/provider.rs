//! Provider facade — the surface handed to the rest of the application.
//!
//! Delegates to [`InteractionStorage`] and fills in the channel of loaded
//! visits that were stored before channels existed, using their traffic
//! type.

use std::collections::HashMap;

use footfall_core::{
  interaction::{InteractionRecord, Visit},
  options::InteractionLoadOptions,
  store::DocumentStore,
};
use uuid::Uuid;

use crate::{InteractionStorage, MergeReport, RenumberReport, Result};

/// Maps a legacy traffic-type code to a channel.
pub trait TrafficTypeConverter: Send + Sync {
  fn channel_for(&self, traffic_type: i32) -> Option<Uuid>;
}

/// A fixed traffic-type → channel table, typically read from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticChannelMap {
  channels: HashMap<i32, Uuid>,
}

impl StaticChannelMap {
  pub fn new(channels: HashMap<i32, Uuid>) -> Self { Self { channels } }

  pub fn len(&self) -> usize { self.channels.len() }

  pub fn is_empty(&self) -> bool { self.channels.is_empty() }
}

impl FromIterator<(i32, Uuid)> for StaticChannelMap {
  fn from_iter<I: IntoIterator<Item = (i32, Uuid)>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

impl TrafficTypeConverter for StaticChannelMap {
  fn channel_for(&self, traffic_type: i32) -> Option<Uuid> {
    self.channels.get(&traffic_type).copied()
  }
}

/// Interaction access with channel back-fill.
pub struct InteractionProvider<S, C> {
  storage:   InteractionStorage<S>,
  converter: C,
}

impl<S: DocumentStore, C: TrafficTypeConverter> InteractionProvider<S, C> {
  pub fn new(storage: InteractionStorage<S>, converter: C) -> Self {
    Self { storage, converter }
  }

  pub fn storage(&self) -> &InteractionStorage<S> { &self.storage }

  pub async fn load_interactions<T: InteractionRecord>(
    &self,
    options: &InteractionLoadOptions,
  ) -> Result<Vec<T>> {
    let mut records = self.storage.load_interactions::<T>(options).await?;
    records.iter_mut().for_each(|r| self.backfill_channel(r));
    Ok(records)
  }

  pub async fn load_visits(&self, options: &InteractionLoadOptions) -> Result<Vec<Visit>> {
    self.load_interactions::<Visit>(options).await
  }

  pub async fn merge_visits(&self, dying: Uuid, surviving: Uuid) -> Result<MergeReport> {
    self.storage.merge_visits(dying, surviving).await
  }

  pub async fn renumber_interactions(&self, contact_id: Uuid) -> Result<RenumberReport> {
    self.storage.renumber_interactions(contact_id).await
  }

  /// Only unset (or nil) channels are filled, and only for known traffic
  /// types. Nothing is written back to the store.
  fn backfill_channel<T: InteractionRecord>(&self, record: &mut T) {
    if record.channel_id().is_none_or(|c| c.is_nil())
      && let Some(traffic_type) = record.traffic_type()
      && let Some(channel) = self.converter.channel_for(traffic_type)
    {
      record.set_channel_id(channel);
    }
  }
}
