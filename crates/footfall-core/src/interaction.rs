//! Interaction records — the typed views over stored documents.
//!
//! [`Interaction`] is the supertype: it can hold any stored document.
//! [`Visit`] is the dominant subtype and is told apart from other subtypes by
//! its discriminator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, document::Document};

// ─── Record trait ────────────────────────────────────────────────────────────

/// A type the loader can materialise from stored documents.
pub trait InteractionRecord: Sized + Send {
  /// Registry tag of this subtype; `None` for the root interaction type,
  /// which is never narrowed by discriminator.
  const TYPE_TAG: Option<&'static str>;

  fn from_document(document: Document) -> Result<Self>;

  /// Traffic classification used to back-fill a missing channel. Only visits
  /// carry one.
  fn traffic_type(&self) -> Option<i32>;

  fn channel_id(&self) -> Option<Uuid>;

  fn set_channel_id(&mut self, channel_id: Uuid);
}

// ─── Interaction ─────────────────────────────────────────────────────────────

/// Any stored interaction, whatever its subtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
  pub interaction_id: Uuid,
  pub contact_id:     Uuid,
  pub start_at:       DateTime<Utc>,
  pub visit_index:    u32,
  pub discriminator:  String,
  pub channel_id:     Option<Uuid>,
  pub payload:        serde_json::Map<String, serde_json::Value>,
}

impl InteractionRecord for Interaction {
  const TYPE_TAG: Option<&'static str> = None;

  fn from_document(document: Document) -> Result<Self> {
    Ok(Self {
      interaction_id: document.interaction_id,
      contact_id:     document.contact_id,
      start_at:       document.start_at,
      visit_index:    document.visit_index,
      discriminator:  document.discriminator,
      channel_id:     document.channel_id,
      payload:        document.payload,
    })
  }

  fn traffic_type(&self) -> Option<i32> {
    if self.discriminator != Visit::DISCRIMINATOR {
      return None;
    }
    self
      .payload
      .get("traffic_type")
      .and_then(serde_json::Value::as_i64)
      .and_then(|t| i32::try_from(t).ok())
  }

  fn channel_id(&self) -> Option<Uuid> { self.channel_id }

  fn set_channel_id(&mut self, channel_id: Uuid) { self.channel_id = Some(channel_id); }
}

// ─── Visit ───────────────────────────────────────────────────────────────────

/// One website visit by a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
  pub interaction_id: Uuid,
  pub contact_id:     Uuid,
  pub start_at:       DateTime<Utc>,
  /// 1-based position within the contact's chronological history.
  pub visit_index:    u32,
  pub channel_id:     Option<Uuid>,
  /// Traffic classification code assigned at ingestion.
  pub traffic_type:   Option<i32>,
  pub site_name:      Option<String>,
  pub language:       Option<String>,
  /// Accumulated engagement value.
  pub value:          i32,
  pub page_count:     u32,
}

/// The subtype-specific part of a visit, stored in the document payload.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct VisitPayload {
  traffic_type: Option<i32>,
  site_name:    Option<String>,
  language:     Option<String>,
  value:        i32,
  page_count:   u32,
}

impl Visit {
  /// Registry tag of the visit subtype.
  pub const TAG: &'static str = "visit";

  /// Discriminator value stored on visit documents.
  pub const DISCRIMINATOR: &'static str = "Visit";

  /// Payload fields owned by the visit subtype.
  pub const FIELDS: &'static [&'static str] =
    &["traffic_type", "site_name", "language", "value", "page_count"];

  /// A fresh visit with a new identity and no subtype data.
  pub fn new(contact_id: Uuid, start_at: DateTime<Utc>, visit_index: u32) -> Self {
    Self {
      interaction_id: Uuid::new_v4(),
      contact_id,
      start_at,
      visit_index,
      channel_id: None,
      traffic_type: None,
      site_name: None,
      language: None,
      value: 0,
      page_count: 0,
    }
  }

  /// The stored form of this visit.
  pub fn to_document(&self) -> Result<Document> {
    let payload = VisitPayload {
      traffic_type: self.traffic_type,
      site_name:    self.site_name.clone(),
      language:     self.language.clone(),
      value:        self.value,
      page_count:   self.page_count,
    };
    let payload = match serde_json::to_value(payload)? {
      serde_json::Value::Object(map) => map,
      _ => serde_json::Map::new(),
    };

    Ok(Document {
      interaction_id: self.interaction_id,
      contact_id: self.contact_id,
      start_at: self.start_at,
      visit_index: self.visit_index,
      discriminator: Self::DISCRIMINATOR.to_owned(),
      channel_id: self.channel_id,
      payload,
    })
  }
}

impl InteractionRecord for Visit {
  const TYPE_TAG: Option<&'static str> = Some(Visit::TAG);

  fn from_document(document: Document) -> Result<Self> {
    let payload: VisitPayload =
      serde_json::from_value(serde_json::Value::Object(document.payload))?;

    Ok(Self {
      interaction_id: document.interaction_id,
      contact_id:     document.contact_id,
      start_at:       document.start_at,
      visit_index:    document.visit_index,
      channel_id:     document.channel_id,
      traffic_type:   payload.traffic_type,
      site_name:      payload.site_name,
      language:       payload.language,
      value:          payload.value,
      page_count:     payload.page_count,
    })
  }

  fn traffic_type(&self) -> Option<i32> { self.traffic_type }

  fn channel_id(&self) -> Option<Uuid> { self.channel_id }

  fn set_channel_id(&mut self, channel_id: Uuid) { self.channel_id = Some(channel_id); }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn visit_survives_document_form() {
    let mut visit = Visit::new(Uuid::new_v4(), Utc.timestamp_opt(42, 0).unwrap(), 3);
    visit.traffic_type = Some(20);
    visit.site_name = Some("website".into());
    visit.page_count = 7;

    let doc = visit.to_document().unwrap();
    assert_eq!(doc.discriminator, Visit::DISCRIMINATOR);
    assert_eq!(doc.payload["page_count"], 7);

    assert_eq!(Visit::from_document(doc).unwrap(), visit);
  }

  #[test]
  fn projected_visit_defaults_missing_payload() {
    let mut doc = Visit::new(Uuid::new_v4(), Utc::now(), 1).to_document().unwrap();
    doc.payload.clear();

    let visit = Visit::from_document(doc).unwrap();
    assert_eq!(visit.traffic_type, None);
    assert_eq!(visit.page_count, 0);
  }

  #[test]
  fn supertype_reads_traffic_type_of_visits_only() {
    let mut visit = Visit::new(Uuid::new_v4(), Utc::now(), 1);
    visit.traffic_type = Some(15);
    let mut doc = visit.to_document().unwrap();

    let interaction = Interaction::from_document(doc.clone()).unwrap();
    assert_eq!(interaction.traffic_type(), Some(15));

    doc.discriminator = "Call".into();
    let interaction = Interaction::from_document(doc).unwrap();
    assert_eq!(interaction.traffic_type(), None);
  }
}
