//! Topology probe — is the interaction collection split across shards?

use footfall_core::store::DocumentStore;
use tracing::{debug, warn};

use crate::InteractionStorage;

/// Physical layout of the interaction collection, as far as the engine
/// needs to know it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
  /// One node; contact changes can be applied in place.
  SingleServer,
  /// Partitioned by a key other than the contact; contact changes move
  /// documents.
  Sharded,
}

impl<S: DocumentStore> InteractionStorage<S> {
  /// Probe the store's partition metadata.
  ///
  /// Never fails: when the metadata cannot be read the collection is assumed
  /// sharded, since the sharded write path is correct on either layout.
  pub async fn topology(&self) -> Topology {
    match self.store.chunk_count().await {
      Ok(0) => Topology::SingleServer,
      Ok(chunks) => {
        debug!(chunks, "interaction collection is sharded");
        Topology::Sharded
      }
      Err(error) => {
        warn!(%error, "cannot obtain number of chunks from store metadata, assuming sharded");
        Topology::Sharded
      }
    }
  }

  pub async fn is_single_server(&self) -> bool {
    self.topology().await == Topology::SingleServer
  }
}
