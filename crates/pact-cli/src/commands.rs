//! Subcommand implementations.
//!
//! Each command attaches to the stored snapshot, performs one operation, and
//! writes a human-readable result to `out`.

use std::io::Write;

use anyhow::{Context as _, Result, bail};
use pact_core::{
  Contract, ExecuteOutcome, SignOutcome,
  clock::Clock,
  record::TIMESTAMP_FORMAT,
  store::SnapshotStore,
};
use serde_json::json;

fn load<S, C>(store: S, clock: C, id: &str) -> Result<Contract<S, C>>
where
  S: SnapshotStore,
  C: Clock,
{
  match Contract::load(store, clock, id)
    .with_context(|| format!("failed to load contract {id:?}"))?
  {
    Some(contract) => Ok(contract),
    None => bail!("no contract with id {id:?}"),
  }
}

pub fn create<S: SnapshotStore, C: Clock>(
  store: S,
  clock: C,
  id: &str,
  terms: &str,
  parties: Vec<String>,
  out: &mut impl Write,
) -> Result<()> {
  let contract = Contract::create(store, clock, id, terms, parties)
    .with_context(|| format!("failed to create contract {id:?}"))?;
  contract.save().context("failed to save contract")?;
  writeln!(out, "created contract {id} ({})", contract.record().hash)?;
  Ok(())
}

pub fn sign<S: SnapshotStore, C: Clock>(
  store: S,
  clock: C,
  id: &str,
  party: &str,
  signature: &str,
  out: &mut impl Write,
) -> Result<()> {
  let mut contract = load(store, clock, id)?;
  match contract.sign(party, signature)? {
    SignOutcome::Signed => writeln!(out, "{party} signed contract {id}")?,
    SignOutcome::UnknownParty => {
      bail!("{party} is not a party to contract {id}")
    }
    SignOutcome::AlreadySigned => {
      bail!("{party} has already signed contract {id}")
    }
  }
  Ok(())
}

pub fn verify<S: SnapshotStore, C: Clock>(
  store: S,
  clock: C,
  id: &str,
  out: &mut impl Write,
) -> Result<()> {
  let mut contract = load(store, clock, id)?;
  if contract.verify_signatures() {
    writeln!(out, "all parties have signed contract {id}")?;
  } else {
    writeln!(
      out,
      "contract {id} is waiting on: {}",
      contract.pending_parties().join(", ")
    )?;
  }
  Ok(())
}

pub fn execute<S: SnapshotStore, C: Clock>(
  store: S,
  clock: C,
  id: &str,
  out: &mut impl Write,
) -> Result<()> {
  let mut contract = load(store, clock, id)?;
  match contract.execute()? {
    ExecuteOutcome::Executed => writeln!(out, "contract {id} executed")?,
    ExecuteOutcome::AlreadyExecuted => {
      bail!("contract {id} has already been executed")
    }
    ExecuteOutcome::NotFullySigned => bail!(
      "contract {id} cannot be executed until all parties sign (waiting on: {})",
      contract.pending_parties().join(", ")
    ),
  }
  Ok(())
}

pub fn events<S: SnapshotStore, C: Clock>(
  store: S,
  clock: C,
  id: &str,
  out: &mut impl Write,
) -> Result<()> {
  let contract = load(store, clock, id)?;
  for event in contract.events() {
    writeln!(out, "{}", serde_json::to_string(event)?)?;
  }
  Ok(())
}

pub fn show<S: SnapshotStore, C: Clock>(
  store: S,
  clock: C,
  id: &str,
  out: &mut impl Write,
) -> Result<()> {
  let contract = load(store, clock, id)?;
  let view = json!({
    "state": format!("{:?}", contract.state()),
    "pending_parties": contract.pending_parties(),
    "record": contract.record(),
  });
  writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
  Ok(())
}

/// Walk a two-party contract through its full lifecycle, attaching to any
/// snapshot already stored under `id`.
pub fn demo<S: SnapshotStore, C: Clock>(
  store: S,
  clock: C,
  id: &str,
  out: &mut impl Write,
) -> Result<()> {
  let terms = "Party A agrees to deliver goods to Party B upon payment.";
  let parties = vec!["Party A".to_owned(), "Party B".to_owned()];

  let mut contract = Contract::open(store, clock, id, terms, parties)
    .with_context(|| format!("failed to open contract {id:?}"))?;

  for (party, days) in [("Party A", 3), ("Party B", 5)] {
    let due = contract.set_reminder(party, days)?;
    writeln!(
      out,
      "reminder set for {party} to sign by {}",
      due.format(TIMESTAMP_FORMAT)
    )?;
  }

  let signatures = [("Party A", "SignatureA"), ("Party B", "SignatureB")];
  for (party, signature) in signatures {
    let outcome = contract.sign(party, signature)?;
    writeln!(out, "{party}: {outcome:?}")?;
  }

  for reminder in contract.check_reminders() {
    writeln!(out, "reminder: {} needs to sign the contract", reminder.party)?;
  }

  let outcome = contract.execute()?;
  writeln!(out, "execute: {outcome:?}")?;

  for event in contract.events() {
    writeln!(out, "{}", serde_json::to_string(event)?)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use pact_core::{ContractRecord, clock::ManualClock};
  use pact_store_fs::FsStore;

  use super::*;

  fn setup() -> (tempfile::TempDir, FsStore, ManualClock) {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::open(dir.path()).unwrap();
    let clock =
      ManualClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap());
    (dir, store, clock)
  }

  fn stored(store: &FsStore, id: &str) -> ContractRecord {
    ContractRecord::from_json(&store.read(id).unwrap().unwrap()).unwrap()
  }

  #[test]
  fn create_sign_execute_round_trip() {
    let (_dir, store, clock) = setup();
    let mut out = Vec::new();

    create(
      &store,
      &clock,
      "c1",
      "pay on delivery",
      vec!["A".into(), "B".into()],
      &mut out,
    )
    .unwrap();
    assert_eq!(stored(&store, "c1").events.len(), 1);

    sign(&store, &clock, "c1", "A", "x", &mut out).unwrap();
    assert!(execute(&store, &clock, "c1", &mut out).is_err());
    sign(&store, &clock, "c1", "B", "y", &mut out).unwrap();
    execute(&store, &clock, "c1", &mut out).unwrap();

    let record = stored(&store, "c1");
    assert!(record.executed);
    assert_eq!(record.signatures.len(), 2);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("contract c1 executed"));
  }

  #[test]
  fn create_twice_fails() {
    let (_dir, store, clock) = setup();
    let mut out = Vec::new();
    create(&store, &clock, "c1", "t", vec!["A".into()], &mut out).unwrap();
    let again = create(&store, &clock, "c1", "t", vec!["A".into()], &mut out);
    assert!(again.is_err());
  }

  #[test]
  fn sign_by_stranger_fails_and_leaves_snapshot() {
    let (_dir, store, clock) = setup();
    let mut out = Vec::new();
    create(&store, &clock, "c1", "t", vec!["A".into()], &mut out).unwrap();
    let before = stored(&store, "c1");

    assert!(sign(&store, &clock, "c1", "Mallory", "m", &mut out).is_err());
    assert_eq!(stored(&store, "c1"), before);
  }

  #[test]
  fn missing_contract_is_an_error() {
    let (_dir, store, clock) = setup();
    let mut out = Vec::new();
    assert!(events(&store, &clock, "ghost", &mut out).is_err());
  }

  #[test]
  fn demo_executes_and_reattaches() {
    let (_dir, store, clock) = setup();
    let mut out = Vec::new();

    demo(&store, &clock, "001", &mut out).unwrap();
    let first = stored(&store, "001");
    assert!(first.executed);

    // A second run attaches to the snapshot; signing and execution are
    // turned away and nothing is rewritten.
    let mut again = Vec::new();
    demo(&store, &clock, "001", &mut again).unwrap();
    assert_eq!(stored(&store, "001"), first);
    let text = String::from_utf8(again).unwrap();
    assert!(text.contains("AlreadySigned"));
    assert!(text.contains("AlreadyExecuted"));
  }

  #[test]
  fn show_reports_state_and_pending_parties() {
    let (_dir, store, clock) = setup();
    let mut out = Vec::new();
    create(&store, &clock, "c1", "t", vec!["A".into(), "B".into()], &mut out)
      .unwrap();
    sign(&store, &clock, "c1", "A", "x", &mut out).unwrap();

    let mut shown = Vec::new();
    show(&store, &clock, "c1", &mut shown).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&shown).unwrap();
    assert_eq!(value["state"], "PartiallySigned");
    assert_eq!(value["pending_parties"], json!(["B"]));
    assert_eq!(value["record"]["contract_id"], "c1");
  }
}
