//! # Storage Layer
//!
//! This module defines the storage abstraction for zkbin. The [`DataStore`] trait
//! is the contract the request dispatcher works against; any backend that can
//! honor per-key atomic create-if-absent can sit behind it.
//!
//! ## Split of Responsibilities
//!
//! - [`backend::StorageBackend`]: raw bytes in, raw bytes out, per key. Knows
//!   *where* records live (directories, maps) and nothing about their content.
//! - [`paste_store::PasteStore`]: encoding, lazy migration of legacy records,
//!   expiry, and the failure policy below. Implements [`DataStore`] over any
//!   backend.
//!
//! ## Failure Policy
//!
//! Nothing above the store ever sees an error from normal operation.
//! Validation failures (unknown namespace, duplicate id), I/O failures and
//! corrupt records all surface as `false`, `None` or an empty value, and the
//! I/O and corruption cases are logged through `tracing`. A caller losing a
//! create race gets the same `false` as a caller creating a true duplicate.
//!
//! ## Concurrency
//!
//! All operations take `&self` and stores are `Send + Sync`, so one store can
//! serve many request workers. The only mutation discipline is per-key
//! atomicity: creates are exclusive, overwrites are atomic renames, deletes
//! and purges are idempotent and may race with reads (a racing read returns
//! either the whole old record or nothing).
//!
//! ## Purging
//!
//! There is no scheduler. [`DataStore::purge`] is called opportunistically
//! (see [`limiter`]) and inspects a bounded batch of randomly chosen pastes,
//! migrating legacy ones on the way and deleting those whose `expire_date` has
//! passed.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: production store on a sharded directory tree.
//! - [`memory::InMemoryStore`]: for testing logic without filesystem I/O.

use crate::id::PasteId;
use crate::model::{Comment, Paste, ThreadedComment};
use std::collections::BTreeMap;

pub mod backend;
pub mod format;
pub mod fs;
pub mod fs_backend;
pub mod limiter;
pub mod mem_backend;
pub mod memory;
pub mod migrate;
pub mod paste_store;

pub use backend::{CommentKey, Namespace, RecordKey};

/// Pastes found expired per purge call, by default.
pub const DEFAULT_PURGE_BATCH_SIZE: usize = 10;

/// A purge pass opens at most this many candidates per unit of batch size
/// before giving up, so stores full of unexpired pastes stay cheap to purge.
pub const PURGE_SCAN_FACTOR: usize = 10;

/// Report from a `purge` pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    /// Pastes opened and checked for expiry.
    pub inspected: usize,
    /// Legacy records (pastes and comments) converted on the way.
    pub migrated: usize,
    /// Expired pastes deleted, comments included.
    pub purged: usize,
}

/// Abstract interface for paste storage.
///
/// Every operation is total: failures are logged and reported through the
/// return value, never raised.
pub trait DataStore {
    /// True if a paste is stored under `id`. Side-effect free.
    fn exists(&self, id: &PasteId) -> bool;

    /// Store a new paste. Returns false, writing nothing, if `id` is taken
    /// or the write fails.
    fn create(&self, id: &PasteId, paste: &Paste) -> bool;

    /// Read a paste, upgrading a legacy record on the way.
    /// Returns None if the paste is absent or unreadable.
    fn read(&self, id: &PasteId) -> Option<Paste>;

    /// Delete a paste and all of its comments. Deleting a missing paste is a no-op.
    fn delete(&self, id: &PasteId);

    /// True if the comment is stored.
    fn exists_comment(&self, paste_id: &PasteId, parent_id: &PasteId, comment_id: &PasteId)
        -> bool;

    /// Store a new comment, once only, like [`DataStore::create`].
    fn create_comment(
        &self,
        paste_id: &PasteId,
        parent_id: &PasteId,
        comment_id: &PasteId,
        comment: &Comment,
    ) -> bool;

    /// All readable comments of a paste keyed by their creation time.
    /// Comments sharing a creation time collide; the one enumerated last wins.
    fn read_comments(&self, paste_id: &PasteId) -> BTreeMap<i64, ThreadedComment>;

    /// The value stored in `namespace`, or an empty string if the namespace
    /// is unknown or the value is missing or corrupt.
    fn get_value(&self, namespace: &str) -> String;

    /// Overwrite the value in `namespace`. False for unknown namespaces.
    fn set_value(&self, value: &str, namespace: &str) -> bool;

    /// Delete up to `batch_size` expired pastes.
    fn purge(&self, batch_size: usize) -> PurgeReport;

    /// Ids of all stored pastes, in either layout.
    fn list_pastes(&self) -> Vec<PasteId>;
}
