//! # Domain Model: Pastes and Comments
//!
//! The server never sees plaintext. A record is an opaque ciphertext (`ct`),
//! the associated authenticated data describing how it was encrypted
//! (`adata`), a format version (`v`) and a small metadata object the server
//! does interpret (`meta`).
//!
//! ## Records
//!
//! - [`Paste`]: `meta` carries `created`, the optional `expire_date` that drives
//!   purging, and the per-paste `salt`.
//! - [`Comment`]: same payload, `meta` carries `created` and an optional `icon`.
//! - [`ThreadedComment`]: a stored comment as handed back by the store, with the
//!   derived `id` and `parentid` fields next to the stored payload. These two
//!   fields are never persisted; the store computes them from the record's key.
//!
//! ## Opaque vs. structural fields
//!
//! `adata` is kept as an arbitrary JSON value and `ct` as a string, neither is
//! inspected. Everything else is a typed field. Unknown structural fields are
//! dropped on deserialization.
//!
//! ## Legacy Records
//!
//! Version 1 records omit `v`. It defaults to `1` on read.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::id::PasteId;

/// Format version assumed when a record carries none.
pub const LEGACY_VERSION: u64 = 1;

fn default_version() -> Number {
    Number::from(LEGACY_VERSION)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paste {
    #[serde(default)]
    pub adata: Value,
    #[serde(default)]
    pub ct: String,
    #[serde(default = "default_version")]
    pub v: Number,
    #[serde(default)]
    pub meta: PasteMeta,
}

impl Paste {
    pub fn new(adata: Value, ct: impl Into<String>, meta: PasteMeta) -> Self {
        Self {
            adata,
            ct: ct.into(),
            v: Number::from(2),
            meta,
        }
    }

    /// Unix timestamp after which the paste may be purged, if any.
    pub fn expires(&self) -> Option<i64> {
        self.meta.expire_date
    }

    /// True if the paste carries an expiry strictly before `now`.
    /// Pastes without `expire_date` never expire.
    pub fn is_expired(&self, now: i64) -> bool {
        self.meta.expire_date.is_some_and(|expiry| expiry < now)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub adata: Value,
    #[serde(default)]
    pub ct: String,
    #[serde(default = "default_version")]
    pub v: Number,
    #[serde(default)]
    pub meta: CommentMeta,
}

impl Comment {
    pub fn new(adata: Value, ct: impl Into<String>, meta: CommentMeta) -> Self {
        Self {
            adata,
            ct: ct.into(),
            v: Number::from(2),
            meta,
        }
    }

    /// Key under which the comment is listed in a discussion.
    /// Comments without a creation time sort first.
    pub fn created(&self) -> i64 {
        self.meta.created.unwrap_or_default()
    }
}

/// A comment as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub id: PasteId,
    pub parentid: PasteId,
}
