//! The stored shape of an interaction.
//!
//! Every interaction subtype is persisted as a [`Document`]: a fixed set of
//! indexed fields shared by all subtypes, a discriminator naming the subtype,
//! and a free-form payload holding the subtype's own fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Fields ──────────────────────────────────────────────────────────────────

/// An addressable top-level field of an interaction document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
  InteractionId,
  ContactId,
  StartAt,
  VisitIndex,
  Discriminator,
  ChannelId,
}

impl Field {
  /// Stable name; backends that store fields by name use it as the column.
  pub fn name(self) -> &'static str {
    match self {
      Self::InteractionId => "interaction_id",
      Self::ContactId => "contact_id",
      Self::StartAt => "start_at",
      Self::VisitIndex => "visit_index",
      Self::Discriminator => "discriminator",
      Self::ChannelId => "channel_id",
    }
  }
}

/// A typed value a [`Field`] can be compared against.
///
/// Ordering is only meaningful between values of the same variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
  Uuid(Uuid),
  Time(DateTime<Utc>),
  Index(u32),
  Text(String),
}

impl From<Uuid> for Value {
  fn from(v: Uuid) -> Self { Self::Uuid(v) }
}

impl From<DateTime<Utc>> for Value {
  fn from(v: DateTime<Utc>) -> Self { Self::Time(v) }
}

impl From<u32> for Value {
  fn from(v: u32) -> Self { Self::Index(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// One interaction as held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  /// Unique across the collection; the tie-breaker of the visit order.
  pub interaction_id: Uuid,
  /// Owning contact. Not part of the shard key.
  pub contact_id:     Uuid,
  /// Backends may truncate to microsecond precision.
  pub start_at:       DateTime<Utc>,
  /// 1-based position within the contact's chronological history.
  pub visit_index:    u32,
  /// Subtype tag, e.g. `"Visit"`.
  pub discriminator:  String,
  pub channel_id:     Option<Uuid>,
  /// Subtype-specific fields.
  #[serde(default)]
  pub payload:        serde_json::Map<String, serde_json::Value>,
}

impl Document {
  /// Read a top-level field. Returns `None` only for an unset channel.
  pub fn field(&self, field: Field) -> Option<Value> {
    Some(match field {
      Field::InteractionId => Value::Uuid(self.interaction_id),
      Field::ContactId => Value::Uuid(self.contact_id),
      Field::StartAt => Value::Time(self.start_at),
      Field::VisitIndex => Value::Index(self.visit_index),
      Field::Discriminator => Value::Text(self.discriminator.clone()),
      Field::ChannelId => Value::Uuid(self.channel_id?),
    })
  }
}
