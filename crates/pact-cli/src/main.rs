//! `pact` — drive contract lifecycles stored as JSON snapshots on disk.
//!
//! # Usage
//!
//! ```text
//! pact create 001 --terms "Deliver goods upon payment." --party A --party B
//! pact sign 001 A SignatureA
//! pact execute 001
//! pact events 001
//! pact demo
//! ```
//!
//! The snapshot directory comes from `--store-dir`, else `PACT_STORE_DIR`,
//! else `store_dir` in the config file (`pact.toml` by default), else `.`.

mod commands;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pact_core::clock::SystemClock;
use pact_store_fs::FsStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulated multi-party contracts")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pact.toml")]
  config: PathBuf,

  /// Directory holding `contract_<id>.json` snapshots.
  #[arg(long, value_name = "DIR")]
  store_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create a new contract and write its first snapshot.
  Create {
    id:      String,
    /// Free-text terms of the agreement.
    #[arg(long)]
    terms:   String,
    /// A party that must sign; repeat for each party.
    #[arg(long = "party", required = true)]
    parties: Vec<String>,
  },
  /// Sign a contract on behalf of a party.
  Sign {
    id:        String,
    party:     String,
    signature: String,
  },
  /// Report whether every party has signed.
  Verify { id: String },
  /// Execute a fully signed contract.
  Execute { id: String },
  /// Print the event log, one JSON object per line.
  Events { id: String },
  /// Print the full snapshot along with its lifecycle state.
  Show { id: String },
  /// Replay a two-party walkthrough: reminders, signatures, execution.
  Demo {
    #[arg(long, default_value = "001")]
    id: String,
  },
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Settings read from the config file and `PACT_*` environment variables.
#[derive(Deserialize, Debug)]
struct PactConfig {
  #[serde(default = "default_store_dir")]
  store_dir: PathBuf,
}

fn default_store_dir() -> PathBuf { PathBuf::from(".") }

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("PACT"))
    .build()
    .context("failed to read config file")?;

  let pact_cfg: PactConfig = settings
    .try_deserialize()
    .context("failed to deserialise PactConfig")?;

  let store_dir =
    expand_tilde(cli.store_dir.as_deref().unwrap_or(&pact_cfg.store_dir));
  let store = FsStore::open(&store_dir)
    .with_context(|| format!("failed to open store at {store_dir:?}"))?;

  let mut out = std::io::stdout().lock();
  let clock = SystemClock;

  match cli.command {
    Command::Create { id, terms, parties } => {
      commands::create(&store, clock, &id, &terms, parties, &mut out)
    }
    Command::Sign {
      id,
      party,
      signature,
    } => commands::sign(&store, clock, &id, &party, &signature, &mut out),
    Command::Verify { id } => commands::verify(&store, clock, &id, &mut out),
    Command::Execute { id } => commands::execute(&store, clock, &id, &mut out),
    Command::Events { id } => commands::events(&store, clock, &id, &mut out),
    Command::Show { id } => commands::show(&store, clock, &id, &mut out),
    Command::Demo { id } => commands::demo(&store, clock, &id, &mut out),
  }
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
