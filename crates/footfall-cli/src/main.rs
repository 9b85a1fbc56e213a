//! `footfall` — inspect and repair contact visit histories.
//!
//! Reads `footfall.toml` (or the path given with `--config`), layered under
//! `FOOTFALL_*` environment variables, and opens the SQLite interaction
//! store it names.
//!
//! # Usage
//!
//! ```
//! footfall visits <CONTACT> --since 2024-01-01T00:00:00Z --take 20
//! footfall interaction <INTERACTION> --contact <CONTACT>
//! footfall merge <DYING> <SURVIVING>
//! footfall renumber <CONTACT>
//! footfall topology
//! ```

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use footfall_core::{
  interaction::Interaction,
  options::{HistoryWindow, InteractionLoadOptions},
};
use footfall_engine::{
  IDENTIFIER_LOCK_TIMEOUT, InteractionStorage,
  provider::{InteractionProvider, StaticChannelMap},
};
use footfall_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "footfall", version, about = "Contact visit history maintenance")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "footfall.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// List a contact's visits, newest first.
  Visits {
    contact: Uuid,
    /// Earliest start time to include (RFC 3339).
    #[arg(long)]
    since:   Option<DateTime<Utc>>,
    /// Start time to stop before (RFC 3339).
    #[arg(long)]
    before:  Option<DateTime<Utc>>,
    #[arg(long, default_value_t = 0)]
    skip:    usize,
    #[arg(long)]
    take:    Option<usize>,
  },
  /// Show one interaction of any type.
  Interaction {
    id:      Uuid,
    /// Only match if the interaction belongs to this contact.
    #[arg(long)]
    contact: Option<Uuid>,
  },
  /// Move every visit of DYING to SURVIVING and renumber the result.
  Merge { dying: Uuid, surviving: Uuid },
  /// Recompute a contact's visit indices from chronology.
  Renumber { contact: Uuid },
  /// Report whether the interaction collection is sharded.
  Topology,
}

// ─── Config file ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Settings {
  store_path:      PathBuf,
  /// Milliseconds a writer waits on a competing writer's lock.
  lock_timeout_ms: Option<u64>,
  /// Traffic type → channel, for visits recorded before channels existed.
  #[serde(default)]
  channels:        HashMap<String, Uuid>,
}

impl Settings {
  fn lock_timeout(&self) -> Duration {
    self
      .lock_timeout_ms
      .map(Duration::from_millis)
      .unwrap_or(IDENTIFIER_LOCK_TIMEOUT)
  }

  /// Keys arrive as strings from both TOML tables and the environment.
  fn channel_map(&self) -> anyhow::Result<StaticChannelMap> {
    self
      .channels
      .iter()
      .map(|(traffic_type, channel)| {
        let traffic_type = traffic_type
          .parse::<i32>()
          .with_context(|| format!("traffic type {traffic_type:?} is not an integer"))?;
        Ok::<_, anyhow::Error>((traffic_type, *channel))
      })
      .collect()
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings: Settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FOOTFALL"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let channels = settings.channel_map()?;
  let store_path = expand_tilde(&settings.store_path);

  let store = SqliteStore::open_with_lock_timeout(&store_path, settings.lock_timeout())
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::debug!(?store_path, channels = channels.len(), "opened interaction store");

  let provider = InteractionProvider::new(InteractionStorage::new(store), channels);

  match cli.command {
    Command::Visits { contact, since, before, skip, take } => {
      let mut window = HistoryWindow::new(contact).skip(skip);
      if let Some(since) = since {
        window = window.since(since);
      }
      if let Some(before) = before {
        window = window.before(before);
      }
      if let Some(take) = take {
        window = window.take(take);
      }
      let visits = provider
        .load_visits(&window.into())
        .await
        .context("failed to load visits")?;
      println!("{}", serde_json::to_string_pretty(&visits)?);
    }
    Command::Interaction { id, contact } => {
      let options = match contact {
        Some(contact) => InteractionLoadOptions::scoped_interaction(id, contact),
        None => InteractionLoadOptions::interaction(id),
      };
      let found = provider
        .load_interactions::<Interaction>(&options)
        .await
        .context("failed to load interaction")?;
      let Some(interaction) = found.first() else {
        anyhow::bail!("no interaction {id}");
      };
      println!("{}", serde_json::to_string_pretty(interaction)?);
    }
    Command::Merge { dying, surviving } => {
      let report = provider
        .merge_visits(dying, surviving)
        .await
        .with_context(|| format!("failed to merge {dying} into {surviving}"))?;
      println!(
        "merged {} visits ({:?}): {} relocated, {} reassigned, {} reindexed, {} untouched",
        report.visits,
        report.topology,
        report.relocated,
        report.reassigned,
        report.reindexed,
        report.untouched,
      );
    }
    Command::Renumber { contact } => {
      let report = provider
        .renumber_interactions(contact)
        .await
        .with_context(|| format!("failed to renumber {contact}"))?;
      println!("renumbered {} visits: {} reindexed", report.visits, report.reindexed);
    }
    Command::Topology => {
      println!("{:?}", provider.storage().topology().await);
    }
  }

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
