//! The `SnapshotStore` trait and an in-memory implementation.
//!
//! A store holds one opaque document per contract id. Writes replace the whole
//! document; the last write wins. There is no locking, so concurrent writers
//! to the same id may overwrite each other.

use std::{cell::RefCell, collections::HashMap, convert::Infallible};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a keyed snapshot store backend.
pub trait SnapshotStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the full document stored for `id`, or `None` if there is none.
  fn read(&self, id: &str) -> Result<Option<Vec<u8>>, Self::Error>;

  /// Replace the document stored for `id`.
  fn write(&self, id: &str, document: &[u8]) -> Result<(), Self::Error>;

  /// Whether a document exists for `id`.
  fn contains(&self, id: &str) -> Result<bool, Self::Error> {
    Ok(self.read(id)?.is_some())
  }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
  type Error = S::Error;

  fn read(&self, id: &str) -> Result<Option<Vec<u8>>, Self::Error> {
    (**self).read(id)
  }

  fn write(&self, id: &str, document: &[u8]) -> Result<(), Self::Error> {
    (**self).write(id, document)
  }

  fn contains(&self, id: &str) -> Result<bool, Self::Error> {
    (**self).contains(id)
  }
}

// ─── In-memory store ─────────────────────────────────────────────────────────

/// A store that keeps documents in a map — useful for testing.
#[derive(Debug, Default)]
pub struct MemoryStore {
  documents: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Overwrite the raw document for `id`, bypassing serialization.
  pub fn insert_raw(&self, id: &str, document: impl Into<Vec<u8>>) {
    self
      .documents
      .borrow_mut()
      .insert(id.to_owned(), document.into());
  }

  pub fn len(&self) -> usize { self.documents.borrow().len() }

  pub fn is_empty(&self) -> bool { self.documents.borrow().is_empty() }
}

impl SnapshotStore for MemoryStore {
  type Error = Infallible;

  fn read(&self, id: &str) -> Result<Option<Vec<u8>>, Self::Error> {
    Ok(self.documents.borrow().get(id).cloned())
  }

  fn write(&self, id: &str, document: &[u8]) -> Result<(), Self::Error> {
    self.insert_raw(id, document);
    Ok(())
  }

  fn contains(&self, id: &str) -> Result<bool, Self::Error> {
    Ok(self.documents.borrow().contains_key(id))
  }
}
