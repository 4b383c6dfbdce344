//! [`Contract`] — a live contract bound to a snapshot store and a clock.
//!
//! Every mutation of persisted fields (signing, executing) rewrites the full
//! snapshot immediately. Verification events and reminders stay in memory
//! until the next write, or forever in the case of reminders.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  clock::{Clock, SystemClock},
  record::{ContractRecord, Event, TIMESTAMP_FORMAT},
  reminder::{Reminder, Reminders},
  store::SnapshotStore,
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of [`Contract::sign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutcome {
  Signed,
  /// The signer is not one of the contract's parties.
  UnknownParty,
  /// The signer has signed before; the first signature stands.
  AlreadySigned,
}

impl SignOutcome {
  pub fn is_signed(self) -> bool { matches!(self, Self::Signed) }
}

/// Result of [`Contract::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
  Executed,
  NotFullySigned,
  AlreadyExecuted,
}

impl ExecuteOutcome {
  pub fn is_executed(self) -> bool { matches!(self, Self::Executed) }
}

/// Where a contract stands in its lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContractState {
  Unsigned,
  PartiallySigned,
  FullySigned,
  Executed,
}

// ─── Contract ────────────────────────────────────────────────────────────────

pub struct Contract<S, C = SystemClock> {
  record:    ContractRecord,
  reminders: Reminders,
  store:     S,
  clock:     C,
}

impl<S: SnapshotStore, C: Clock> Contract<S, C> {
  /// Create a new contract and log its creation.
  ///
  /// The party list must be non-empty and free of duplicates. Fails with
  /// [`Error::AlreadyExists`] if `store` already holds a snapshot for `id`;
  /// use [`Contract::load`] or [`Contract::open`] to attach to it instead.
  ///
  /// Nothing is written until the first signature (or an explicit
  /// [`Contract::save`]).
  pub fn create(
    store: S,
    clock: C,
    id: impl Into<String>,
    terms: impl Into<String>,
    parties: Vec<String>,
  ) -> Result<Self> {
    let id = id.into();
    validate_parties(&parties)?;
    if store.contains(&id).map_err(Error::store)? {
      return Err(Error::AlreadyExists(id));
    }

    let record = ContractRecord::new(id, terms, parties);
    let mut contract = Self::from_record(record, store, clock);
    let hash = contract.record.hash.clone();
    contract.log_event("Contract Created", hash);
    Ok(contract)
  }

  /// Restore the contract persisted for `id`, taking every field from the
  /// snapshot verbatim. Returns `None` if no snapshot exists.
  pub fn load(store: S, clock: C, id: &str) -> Result<Option<Self>> {
    match store.read(id).map_err(Error::store)? {
      Some(document) => Self::restore(id, &document, store, clock).map(Some),
      None => Ok(None),
    }
  }

  /// Attach to the snapshot for `id` if one exists, otherwise create a new
  /// contract. When a snapshot exists, `terms` and `parties` are ignored.
  pub fn open(
    store: S,
    clock: C,
    id: impl Into<String>,
    terms: impl Into<String>,
    parties: Vec<String>,
  ) -> Result<Self> {
    let id = id.into();
    match store.read(&id).map_err(Error::store)? {
      Some(document) => Self::restore(&id, &document, store, clock),
      None => Self::create(store, clock, id, terms, parties),
    }
  }

  fn restore(id: &str, document: &[u8], store: S, clock: C) -> Result<Self> {
    let record = ContractRecord::from_json(document).map_err(|source| {
      Error::CorruptSnapshot {
        id: id.to_owned(),
        source,
      }
    })?;
    debug!(
      contract = id,
      events = record.events.len(),
      "loaded contract snapshot"
    );
    Ok(Self::from_record(record, store, clock))
  }

  fn from_record(record: ContractRecord, store: S, clock: C) -> Self {
    Self {
      record,
      reminders: Reminders::default(),
      store,
      clock,
    }
  }

  // ── Lifecycle ───────────────────────────────────────────────────────────

  /// Record `party`'s signature and persist.
  ///
  /// Unknown parties and repeat signers are turned away without any state
  /// change; `Err` is reserved for storage failures.
  pub fn sign(
    &mut self,
    party: &str,
    signature: impl Into<String>,
  ) -> Result<SignOutcome> {
    if !self.record.is_party(party) {
      warn!(contract = %self.record.id, party, "unknown party tried to sign");
      return Ok(SignOutcome::UnknownParty);
    }
    if self.record.has_signed(party) {
      warn!(contract = %self.record.id, party, "party has already signed");
      return Ok(SignOutcome::AlreadySigned);
    }

    let signature = signature.into();
    let mut next = self.record.clone();
    next.signatures.insert(party.to_owned(), signature.clone());
    next.events.push(self.stamp(format!("{party} Signed"), signature));
    self.commit(next)?;
    Ok(SignOutcome::Signed)
  }

  /// Whether every party has signed. Each successful check appends an
  /// "All Parties Signed" event; repeated checks are not deduplicated.
  pub fn verify_signatures(&mut self) -> bool {
    if self.record.all_signed() {
      self.log_event("All Parties Signed", "Verified");
      true
    } else {
      false
    }
  }

  /// Mark the contract executed once every party has signed, then persist.
  ///
  /// An already executed contract is left untouched, with no verification
  /// event appended.
  pub fn execute(&mut self) -> Result<ExecuteOutcome> {
    if self.record.executed {
      warn!(contract = %self.record.id, "contract has already been executed");
      return Ok(ExecuteOutcome::AlreadyExecuted);
    }
    if !self.verify_signatures() {
      warn!(
        contract = %self.record.id,
        pending = ?self.record.pending_parties().collect::<Vec<_>>(),
        "contract cannot be executed until all parties sign"
      );
      return Ok(ExecuteOutcome::NotFullySigned);
    }

    let mut next = self.record.clone();
    next.executed = true;
    next.events.push(self.stamp("Contract Executed", "Terms Enforced"));
    self.commit(next)?;
    Ok(ExecuteOutcome::Executed)
  }

  /// Write the full record to the store, replacing any previous snapshot.
  pub fn save(&self) -> Result<()> { self.write_record(&self.record) }

  /// Persist `next` and only then adopt it as the in-memory state. A failed
  /// write leaves the handle exactly as it was.
  fn commit(&mut self, next: ContractRecord) -> Result<()> {
    self.write_record(&next)?;
    let logged = self.record.events.len();
    self.record = next;
    for event in &self.record.events[logged..] {
      announce(&self.record.id, event);
    }
    Ok(())
  }

  fn write_record(&self, record: &ContractRecord) -> Result<()> {
    let document = record.to_json()?;
    self
      .store
      .write(&record.id, &document)
      .map_err(Error::store)?;
    debug!(
      contract = %record.id,
      bytes = document.len(),
      "wrote contract snapshot"
    );
    Ok(())
  }

  fn stamp(&self, name: impl Into<String>, data: impl Into<String>) -> Event {
    Event::new(name, data, self.clock.now_utc())
  }

  pub(crate) fn log_event(
    &mut self,
    name: impl Into<String>,
    data: impl Into<String>,
  ) {
    let event = self.stamp(name, data);
    announce(&self.record.id, &event);
    self.record.events.push(event);
  }

  // ── Reminders ───────────────────────────────────────────────────────────

  /// Remind `party` to sign `days` from now (local time). Any existing
  /// reminder for the party is replaced. The party is not checked against
  /// the party list.
  ///
  /// Fails with [`Error::ReminderOutOfRange`] when the due-time cannot be
  /// represented; existing reminders are left alone in that case.
  pub fn set_reminder(
    &mut self,
    party: &str,
    days: i64,
  ) -> Result<NaiveDateTime> {
    let due = self
      .reminders
      .set(party, days, self.clock.now_local())
      .ok_or_else(|| Error::ReminderOutOfRange {
        party: party.to_owned(),
        days,
      })?;
    info!(
      contract = %self.record.id,
      party,
      due = %due.format(TIMESTAMP_FORMAT),
      "reminder set"
    );
    Ok(due)
  }

  /// Reminders that are past due, in the order they were first set. Each one
  /// is reported every time this is called.
  pub fn check_reminders(&self) -> Vec<&Reminder> {
    let now = self.clock.now_local();
    let overdue: Vec<&Reminder> = self.reminders.overdue(now).collect();
    for reminder in &overdue {
      warn!(
        contract = %self.record.id,
        party = %reminder.party,
        "reminder: party needs to sign the contract"
      );
    }
    overdue
  }

  pub fn reminders(&self) -> &Reminders { &self.reminders }

  // ── Queries ─────────────────────────────────────────────────────────────

  pub fn record(&self) -> &ContractRecord { &self.record }

  pub fn id(&self) -> &str { &self.record.id }

  pub fn events(&self) -> &[Event] { &self.record.events }

  pub fn is_executed(&self) -> bool { self.record.executed }

  pub fn pending_parties(&self) -> Vec<&str> {
    self.record.pending_parties().collect()
  }

  pub fn state(&self) -> ContractState {
    if self.record.executed {
      ContractState::Executed
    } else if self.record.all_signed() {
      ContractState::FullySigned
    } else if self.record.signatures.is_empty() {
      ContractState::Unsigned
    } else {
      ContractState::PartiallySigned
    }
  }

  /// Consume the handle, returning the record and the store.
  pub fn into_parts(self) -> (ContractRecord, S) { (self.record, self.store) }
}

fn announce(contract: &str, event: &Event) {
  info!(
    contract,
    at = %event.timestamp.format(TIMESTAMP_FORMAT),
    "event logged: {}",
    event.event
  );
}

fn validate_parties(parties: &[String]) -> Result<()> {
  if parties.is_empty() {
    return Err(Error::NoParties);
  }
  for (i, party) in parties.iter().enumerate() {
    if parties[..i].contains(party) {
      return Err(Error::DuplicateParty(party.clone()));
    }
  }
  Ok(())
}
