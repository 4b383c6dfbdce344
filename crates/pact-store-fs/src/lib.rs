//! Filesystem backend for Pact contract snapshots.
//!
//! Each contract is stored as `contract_<id>.json` in a single directory.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::FsStore;
