//! The persisted contract state and its event log.
//!
//! [`ContractRecord`] is the snapshot document written to storage, one per
//! contract id. Field names on the wire are fixed; existing snapshots must
//! keep loading, so renaming a field is a breaking change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::content_hash;

/// Format shared by event timestamps and reminder due-times.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Event ───────────────────────────────────────────────────────────────────

/// An entry in the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub event:     String,
  pub data:      String,
  /// When the event was logged, UTC, whole seconds.
  #[serde(with = "utc_timestamp")]
  pub timestamp: DateTime<Utc>,
}

impl Event {
  pub fn new(
    event: impl Into<String>,
    data: impl Into<String>,
    at: DateTime<Utc>,
  ) -> Self {
    Self {
      event:     event.into(),
      data:      data.into(),
      timestamp: truncate_to_seconds(at),
    }
  }
}

fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
  DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

/// Serde adapter for `"YYYY-MM-DD HH:MM:SS"` UTC timestamps.
mod utc_timestamp {
  use chrono::{DateTime, NaiveDateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  use super::TIMESTAMP_FORMAT;

  pub fn serialize<S>(at: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    ser.collect_str(&at.format(TIMESTAMP_FORMAT))
  }

  pub fn deserialize<'de, D>(de: D) -> Result<DateTime<Utc>, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = String::deserialize(de)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
      .map(|naive| naive.and_utc())
      .map_err(|e| D::Error::custom(format!("bad timestamp {raw:?}: {e}")))
  }
}

// ─── ContractRecord ──────────────────────────────────────────────────────────

/// The full persisted state of one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
  #[serde(rename = "contract_id")]
  pub id:         String,
  #[serde(rename = "contract_terms")]
  pub terms:      String,
  #[serde(rename = "involved_parties")]
  pub parties:    Vec<String>,
  /// Party id → opaque signature. Keys are always a subset of `parties`.
  pub signatures: BTreeMap<String, String>,
  #[serde(rename = "contract_executed")]
  pub executed:   bool,
  pub events:     Vec<Event>,
  #[serde(rename = "contract_hash")]
  pub hash:       String,
}

impl ContractRecord {
  /// A fresh, unsigned record with its content hash computed. The event log
  /// starts empty.
  pub fn new(
    id: impl Into<String>,
    terms: impl Into<String>,
    parties: Vec<String>,
  ) -> Self {
    let id = id.into();
    let terms = terms.into();
    let hash = content_hash(&id, &terms);
    Self {
      id,
      terms,
      parties,
      signatures: BTreeMap::new(),
      executed: false,
      events: Vec::new(),
      hash,
    }
  }

  pub fn is_party(&self, party: &str) -> bool {
    self.parties.iter().any(|p| p == party)
  }

  pub fn has_signed(&self, party: &str) -> bool {
    self.signatures.contains_key(party)
  }

  /// Whether the signature count has reached the party count.
  pub fn all_signed(&self) -> bool {
    self.signatures.len() == self.parties.len()
  }

  /// Parties that have not signed yet, in party order.
  pub fn pending_parties(&self) -> impl Iterator<Item = &str> {
    self
      .parties
      .iter()
      .filter(|p| !self.signatures.contains_key(p.as_str()))
      .map(String::as_str)
  }

  pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(self)
  }

  pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
    serde_json::from_slice(bytes)
  }
}
