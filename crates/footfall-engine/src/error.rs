//! Error type for `footfall-engine`.

use footfall_core::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] footfall_core::Error),

  /// The store returned no cursor where one was required. Distinct from an
  /// empty result, which is never an error.
  #[error("interaction store unavailable: {operation} returned no cursor")]
  StoreUnavailable { operation: &'static str },

  /// A visit selected for relocation was gone by the time it was re-read.
  #[error("visit {interaction_id} of contact {contact_id} not found for relocation")]
  VisitNotFound {
    contact_id:     Uuid,
    interaction_id: Uuid,
  },

  /// A relocation's destination copy was claimed by another writer and is
  /// no longer where the relocation expects it.
  #[error("visit {interaction_id} missing at destination contact {contact_id} after relocation")]
  DestinationMissing {
    contact_id:     Uuid,
    interaction_id: Uuid,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store(error: impl StoreError) -> Self { Self::Store(Box::new(error)) }

  /// Missing setup, such as an unregistered subtype. Never worth retrying.
  pub fn is_configuration(&self) -> bool {
    matches!(self, Self::Core(e) if e.is_configuration())
  }

  /// The store could not produce data it was expected to have.
  pub fn is_store_unavailable(&self) -> bool {
    matches!(
      self,
      Self::StoreUnavailable { .. } | Self::VisitNotFound { .. } | Self::DestinationMissing { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
