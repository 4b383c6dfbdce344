//! Core types for the Pact contract simulator.
//!
//! A contract is signed by a fixed set of parties and "executed" once every
//! party has signed. All state transitions are recorded in an append-only
//! event log, and the full state is persisted as a JSON snapshot keyed by
//! contract id through a [`store::SnapshotStore`].
//!
//! This crate is free of filesystem and CLI dependencies; storage backends
//! (e.g. `pact-store-fs`) implement [`store::SnapshotStore`].

pub mod clock;
pub mod contract;
pub mod error;
pub mod hash;
pub mod record;
pub mod reminder;
pub mod store;

pub use contract::{Contract, ContractState, ExecuteOutcome, SignOutcome};
pub use error::{Error, Result};
pub use record::{ContractRecord, Event};
