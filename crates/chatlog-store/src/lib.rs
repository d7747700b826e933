//! # chatlog-store
//!
//! Document storage for the chat log backend.
//!
//! Documents are JSON objects addressed by `(collection, key)`. The
//! [`DocumentStore`] trait is the seam the services depend on; two backends
//! implement it:
//!
//! - [`SqliteStore`]: durable, backed by a single SQLite file and opened
//!   lazily on first use.
//! - [`MemoryStore`]: process-local, used by tests and throwaway instances.
//!
//! Every mutating operation is atomic per call. In particular
//! [`DocumentStore::append_to_array_field`] performs the duplicate check, the
//! push and the side-field updates in one critical section, which is what
//! keeps concurrent appends to the same document linearized.

pub mod adapter;
pub mod database;
pub mod document;
pub mod documents;
pub mod memory;
pub mod migrations;
pub mod sqlite;

mod error;

pub use adapter::DocumentStore;
pub use database::Database;
pub use document::{
    AppendOutcome, Appended, ArrayAppend, Document, Fields, Merged, SortOrder, WriteOutcome,
};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
