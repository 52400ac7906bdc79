//! # SmartCrypt Store
//!
//! Storage abstraction for the four persisted collections: users, files,
//! notifications, and the activity log.
//!
//! ## Backends
//!
//! - [`SqliteStore`] - primary backend (rusqlite, bundled), with versioned
//!   schema migrations
//! - [`MemoryStore`] - in-memory backend for tests, same semantics
//!
//! ## Semantics
//!
//! Storage performs no foreign-key enforcement; referential consistency is
//! the engine's job. Updates are whole-record swaps. Listings are newest
//! first, and batched notification pushes keep their in-call order at the
//! head of the list.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertUserOutcome, Store};
