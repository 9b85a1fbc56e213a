//! [`SqliteStore`] — the SQLite implementation of [`DocumentStore`].

use std::{path::Path, time::Duration};

use footfall_core::{
  document::Document,
  query::{Filter, FindQuery, Projection, RemoveMode, Update, WriteConcern},
  store::DocumentStore,
};
use rusqlite::types::Value as SqlValue;

use crate::{
  Error, Result,
  encode::{
    DOCUMENT_COLUMNS, RawDocument, compile_filter, encode_ts, encode_uuid, order_by,
    set_clause,
  },
  schema::{COLLECTION, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An interaction collection backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Like [`SqliteStore::open`], but writers wait up to `lock_timeout` for a
  /// competing writer's file lock instead of failing immediately.
  pub async fn open_with_lock_timeout(
    path: impl AsRef<Path>,
    lock_timeout: Duration,
  ) -> Result<Self> {
    let store = Self::open(path).await?;
    store
      .conn
      .call(move |conn| {
        conn.busy_timeout(lock_timeout)?;
        Ok(())
      })
      .await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Record a partition chunk for the interaction collection. Any recorded
  /// chunk makes the collection report itself as sharded.
  pub async fn record_chunk(&self, shard: &str, min_key: &str, max_key: &str) -> Result<()> {
    let shard   = shard.to_owned();
    let min_key = min_key.to_owned();
    let max_key = max_key.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO chunks (collection, shard, min_key, max_key) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![COLLECTION, shard, min_key, max_key],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of documents matching `filter`.
  pub async fn count(&self, filter: &Filter) -> Result<u64> {
    let mut params = Vec::new();
    let where_clause = compile_filter(filter, &mut params);
    let sql = format!("SELECT COUNT(*) FROM interactions WHERE {where_clause}");

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params), |r| r.get(0))?)
      })
      .await?;
    Ok(n.unsigned_abs())
  }

  async fn select(
    &self,
    filter: &Filter,
    query: Option<&FindQuery>,
    limit: Option<usize>,
  ) -> Result<Vec<Document>> {
    let mut params = Vec::new();
    let where_clause = compile_filter(filter, &mut params);
    let projection = query.map(|q| q.projection.clone()).unwrap_or_default();
    let payload = match projection {
      Projection::Keys => "'{}'",
      _ => "payload",
    };
    let order = query.map(|q| order_by(&q.sort)).unwrap_or_default();
    let skip = query.map_or(0, |q| q.skip);
    let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
    let offset = i64::try_from(skip).unwrap_or(i64::MAX);

    let sql = format!(
      "SELECT {} FROM interactions WHERE {where_clause}{order} LIMIT {limit} OFFSET {offset}",
      DOCUMENT_COLUMNS.replace("{payload}", payload),
    );

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| Ok(projection.apply(raw.into_document()?)))
      .collect()
  }

  /// Resolve the outcome of a write according to its concern. Unacknowledged
  /// writes never report failures to the caller.
  fn settle(
    operation: &'static str,
    concern: WriteConcern,
    outcome: std::result::Result<usize, tokio_rusqlite::Error>,
  ) -> Result<u64> {
    match concern {
      WriteConcern::Acknowledged => Ok(outcome? as u64),
      WriteConcern::Unacknowledged => {
        if let Err(error) = outcome {
          tracing::debug!(operation, %error, "unacknowledged write failed");
        }
        Ok(0)
      }
    }
  }
}

fn is_unique_violation(error: &tokio_rusqlite::Error) -> bool {
  matches!(
    error,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn find(&self, query: &FindQuery) -> Result<Option<Vec<Document>>> {
    // A local connection always yields a cursor.
    let docs = self.select(&query.filter, Some(query), query.limit).await?;
    Ok(Some(docs))
  }

  async fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
    Ok(self.select(filter, None, Some(1)).await?.into_iter().next())
  }

  async fn insert(&self, document: &Document) -> Result<()> {
    let id             = document.interaction_id;
    let id_str         = encode_uuid(document.interaction_id);
    let contact_str    = encode_uuid(document.contact_id);
    let start_at       = encode_ts(document.start_at);
    let visit_index    = i64::from(document.visit_index);
    let discriminator  = document.discriminator.clone();
    let channel_str    = document.channel_id.map(encode_uuid);
    let payload_str    = serde_json::to_string(&document.payload)?;

    let outcome = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO interactions (
             interaction_id, contact_id, start_at, visit_index,
             discriminator, channel_id, payload
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            contact_str,
            start_at,
            visit_index,
            discriminator,
            channel_str,
            payload_str,
          ],
        )?;
        Ok(())
      })
      .await;

    match outcome {
      Err(e) if is_unique_violation(&e) => Err(Error::DuplicateKey(id)),
      other => Ok(other?),
    }
  }

  async fn update(
    &self,
    filter: &Filter,
    update: &Update,
    concern: WriteConcern,
  ) -> Result<u64> {
    if update.is_empty() {
      return Ok(0);
    }

    let mut params: Vec<SqlValue> = Vec::new();
    let set = set_clause(update, &mut params);
    let where_clause = compile_filter(filter, &mut params);
    let sql = format!("UPDATE interactions SET {set} WHERE {where_clause}");

    let outcome = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(params))?))
      .await;

    Self::settle("update", concern, outcome)
  }

  async fn remove(
    &self,
    filter: &Filter,
    mode: RemoveMode,
    concern: WriteConcern,
  ) -> Result<u64> {
    let mut params: Vec<SqlValue> = Vec::new();
    let where_clause = compile_filter(filter, &mut params);
    let sql = match mode {
      RemoveMode::All => format!("DELETE FROM interactions WHERE {where_clause}"),
      RemoveMode::Single => format!(
        "DELETE FROM interactions WHERE rowid IN (
           SELECT rowid FROM interactions WHERE {where_clause} LIMIT 1
         )"
      ),
    };

    let outcome = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(params))?))
      .await;

    Self::settle("remove", concern, outcome)
  }

  async fn chunk_count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
          rusqlite::params![COLLECTION],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n.unsigned_abs())
  }
}
