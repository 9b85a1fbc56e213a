//! Encoding helpers between the core query vocabulary and SQLite.
//!
//! Timestamps are stored as integer microseconds so that SQL ordering matches
//! chronological ordering. UUIDs are stored as hyphenated lowercase strings,
//! whose lexicographic order equals [`Uuid`]'s byte order. Payloads are
//! compact JSON objects.

use chrono::{DateTime, Utc};
use footfall_core::{
  document::{Document, Value},
  query::{Direction, Filter, Set, SortKey, Update},
};
use rusqlite::types::Value as SqlValue;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_ts(dt: DateTime<Utc>) -> i64 { dt.timestamp_micros() }

pub fn decode_ts(micros: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_micros(micros).ok_or(Error::Timestamp(micros))
}

fn encode_value(value: &Value) -> SqlValue {
  match value {
    Value::Uuid(id) => SqlValue::Text(encode_uuid(*id)),
    Value::Time(dt) => SqlValue::Integer(encode_ts(*dt)),
    Value::Index(i) => SqlValue::Integer(i64::from(*i)),
    Value::Text(s) => SqlValue::Text(s.clone()),
  }
}

// ─── Clauses ─────────────────────────────────────────────────────────────────

/// Compile `filter` to a `WHERE` expression, appending its positional
/// parameters to `params`.
pub fn compile_filter(filter: &Filter, params: &mut Vec<SqlValue>) -> String {
  match filter {
    Filter::Eq(field, value) => {
      params.push(encode_value(value));
      format!("{} = ?", field.name())
    }
    Filter::Gte(field, value) => {
      params.push(encode_value(value));
      format!("{} >= ?", field.name())
    }
    Filter::Lt(field, value) => {
      params.push(encode_value(value));
      format!("{} < ?", field.name())
    }
    Filter::And(all) if all.is_empty() => "1 = 1".to_owned(),
    Filter::Or(any) if any.is_empty() => "1 = 0".to_owned(),
    Filter::And(all) => join(all, " AND ", params),
    Filter::Or(any) => join(any, " OR ", params),
  }
}

fn join(filters: &[Filter], sep: &str, params: &mut Vec<SqlValue>) -> String {
  let parts: Vec<String> = filters
    .iter()
    .map(|f| format!("({})", compile_filter(f, params)))
    .collect();
  parts.join(sep)
}

/// ` ORDER BY ...`, or an empty string for no sort keys.
pub fn order_by(keys: &[SortKey]) -> String {
  if keys.is_empty() {
    return String::new();
  }
  let terms: Vec<String> = keys
    .iter()
    .map(|k| {
      let dir = match k.direction {
        Direction::Ascending => "ASC",
        Direction::Descending => "DESC",
      };
      format!("{} {dir}", k.field.name())
    })
    .collect();
  format!(" ORDER BY {}", terms.join(", "))
}

/// Compile `update` to the body of a `SET` clause.
pub fn set_clause(update: &Update, params: &mut Vec<SqlValue>) -> String {
  let parts: Vec<&str> = update
    .sets()
    .iter()
    .map(|set| match *set {
      Set::ContactId(id) => {
        params.push(SqlValue::Text(encode_uuid(id)));
        "contact_id = ?"
      }
      Set::VisitIndex(index) => {
        params.push(SqlValue::Integer(i64::from(index)));
        "visit_index = ?"
      }
    })
    .collect();
  parts.join(", ")
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawDocument::from_row`]; `{payload}` is replaced by
/// the payload expression of the projection in use.
pub const DOCUMENT_COLUMNS: &str = "interaction_id, contact_id, start_at, visit_index, \
                                    discriminator, channel_id, {payload}";

/// Raw values read directly from an `interactions` row.
pub struct RawDocument {
  pub interaction_id: String,
  pub contact_id:     String,
  pub start_at:       i64,
  pub visit_index:    i64,
  pub discriminator:  String,
  pub channel_id:     Option<String>,
  pub payload:        String,
}

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      interaction_id: row.get(0)?,
      contact_id:     row.get(1)?,
      start_at:       row.get(2)?,
      visit_index:    row.get(3)?,
      discriminator:  row.get(4)?,
      channel_id:     row.get(5)?,
      payload:        row.get(6)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      interaction_id: decode_uuid(&self.interaction_id)?,
      contact_id:     decode_uuid(&self.contact_id)?,
      start_at:       decode_ts(self.start_at)?,
      visit_index:    u32::try_from(self.visit_index)
        .map_err(|_| Error::VisitIndex(self.visit_index))?,
      discriminator:  self.discriminator,
      channel_id:     self.channel_id.as_deref().map(decode_uuid).transpose()?,
      payload:        serde_json::from_str(&self.payload)?,
    })
  }
}
