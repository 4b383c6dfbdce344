//! [`FsStore`] — the filesystem implementation of [`SnapshotStore`].

use std::{
  fs, io,
  path::{Path, PathBuf},
};

use pact_core::store::SnapshotStore;
use tracing::debug;

use crate::{Error, Result};

/// A snapshot store keeping one JSON file per contract in `dir`.
///
/// Writes replace the whole file. There is no locking; concurrent writers to
/// the same contract race and the last write wins.
#[derive(Debug, Clone)]
pub struct FsStore {
  dir: PathBuf,
}

impl FsStore {
  /// Open a store rooted at `dir`, creating the directory if needed.
  pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
    let dir = dir.into();
    fs::create_dir_all(&dir).map_err(|source| Error::Io {
      path: dir.clone(),
      source,
    })?;
    Ok(Self { dir })
  }

  pub fn dir(&self) -> &Path { &self.dir }

  /// The file holding the snapshot for `id`.
  pub fn path_for(&self, id: &str) -> Result<PathBuf> {
    validate_id(id)?;
    Ok(self.dir.join(format!("contract_{id}.json")))
  }
}

/// Reject ids that would escape the store directory or name no file.
fn validate_id(id: &str) -> Result<()> {
  let bad = id.is_empty()
    || id.contains(['/', '\\', '\0'])
    || id.contains("..");
  if bad {
    return Err(Error::InvalidId(id.to_owned()));
  }
  Ok(())
}

impl SnapshotStore for FsStore {
  type Error = Error;

  fn read(&self, id: &str) -> Result<Option<Vec<u8>>> {
    let path = self.path_for(id)?;
    match fs::read(&path) {
      Ok(bytes) => {
        debug!(path = %path.display(), bytes = bytes.len(), "read snapshot");
        Ok(Some(bytes))
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(source) => Err(Error::Io { path, source }),
    }
  }

  fn write(&self, id: &str, document: &[u8]) -> Result<()> {
    let path = self.path_for(id)?;
    fs::write(&path, document).map_err(|source| Error::Io {
      path: path.clone(),
      source,
    })?;
    debug!(path = %path.display(), bytes = document.len(), "wrote snapshot");
    Ok(())
  }

  fn contains(&self, id: &str) -> Result<bool> {
    let path = self.path_for(id)?;
    path.try_exists().map_err(|source| Error::Io { path, source })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};
  use pact_core::{
    Contract, ContractRecord, Error as CoreError, ExecuteOutcome,
    clock::ManualClock,
  };

  use super::*;

  fn store() -> (tempfile::TempDir, FsStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FsStore::open(dir.path()).expect("open store");
    (dir, store)
  }

  fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
  }

  #[test]
  fn file_is_named_after_contract_id() {
    let (dir, store) = store();
    assert_eq!(
      store.path_for("001").unwrap(),
      dir.path().join("contract_001.json")
    );
  }

  #[test]
  fn read_missing_returns_none() {
    let (_dir, store) = store();
    assert!(store.read("absent").unwrap().is_none());
    assert!(!store.contains("absent").unwrap());
  }

  #[test]
  fn write_overwrites_whole_document() {
    let (_dir, store) = store();
    store.write("x", b"a much longer first document").unwrap();
    store.write("x", b"short").unwrap();
    assert_eq!(store.read("x").unwrap().unwrap(), b"short");
    assert!(store.contains("x").unwrap());
  }

  #[test]
  fn rejects_ids_that_escape_the_directory() {
    let (_dir, store) = store();
    for id in ["", "../evil", "a/b", "a\\b", ".."] {
      assert!(
        matches!(store.write(id, b"{}"), Err(Error::InvalidId(_))),
        "id {id:?} should be rejected"
      );
    }
  }

  #[test]
  fn open_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FsStore::open(&nested).unwrap();
    store.write("1", b"{}").unwrap();
    assert!(nested.join("contract_1.json").exists());
  }

  #[test]
  fn contract_survives_restart() {
    let (_dir, store) = store();
    let clock = clock();

    let mut contract = Contract::create(
      &store,
      &clock,
      "001",
      "Party A agrees to deliver goods to Party B upon payment.",
      vec!["Party A".into(), "Party B".into()],
    )
    .unwrap();
    contract.sign("Party A", "SignatureA").unwrap();
    clock.advance(Duration::seconds(30));
    contract.sign("Party B", "SignatureB").unwrap();
    assert_eq!(contract.execute().unwrap(), ExecuteOutcome::Executed);
    let before = contract.record().clone();
    drop(contract);

    let reopened = FsStore::open(store.dir()).unwrap();
    let restored = Contract::load(&reopened, &clock, "001").unwrap().unwrap();
    assert_eq!(restored.record(), &before);
  }

  #[test]
  fn snapshot_file_uses_documented_field_names() {
    let (dir, store) = store();
    let clock = clock();
    let mut contract =
      Contract::create(&store, &clock, "7", "t", vec!["A".into()]).unwrap();
    contract.sign("A", "s").unwrap();

    let raw = std::fs::read(dir.path().join("contract_7.json")).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    for key in [
      "contract_id",
      "contract_terms",
      "involved_parties",
      "signatures",
      "contract_executed",
      "events",
      "contract_hash",
    ] {
      assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["events"][1]["timestamp"], "2024-06-01 12:00:00");
    assert_eq!(ContractRecord::from_json(&raw).unwrap().signatures["A"], "s");
  }

  #[test]
  fn truncated_file_is_reported_as_corrupt() {
    let (dir, store) = store();
    std::fs::write(dir.path().join("contract_9.json"), b"{\"contract_id\":")
      .unwrap();

    let result = Contract::load(&store, clock(), "9");
    assert!(matches!(result, Err(CoreError::CorruptSnapshot { .. })));
  }

  #[test]
  fn invalid_id_surfaces_as_store_error() {
    let (_dir, store) = store();
    let result = Contract::load(&store, clock(), "../x");
    assert!(matches!(result, Err(CoreError::Store(_))));
  }
}
