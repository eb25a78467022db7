//! # Legacy Format Migration
//!
//! Older installations stored records as bare JSON, without the protection
//! line of the current [`format`](super::format). Such records are upgraded
//! lazily, whenever a read or a purge pass runs into them.
//!
//! ## Detection
//!
//! [`is_legacy`] is a signature check on the raw bytes: a legacy record is a
//! JSON object, so its first non-whitespace byte is `{`. A current record
//! always starts with `<`. Nothing is parsed to tell them apart.
//!
//! ## Conversion
//!
//! A legacy record can sit in two places:
//!
//! 1. **Legacy location** (e.g. the extension-less file of the filesystem
//!    backend). The record is re-encoded, stored at the current location with
//!    create-if-absent, and only then is the legacy copy removed. A crash in
//!    between leaves both copies; the current one wins on the next read and
//!    the next pass removes the leftover.
//! 2. **Current location, bare JSON.** The record is re-encoded in place with
//!    an atomic overwrite.
//!
//! A legacy file that has disappeared was converted by someone else, which
//! is not an error. Once converted, a record is never detected as legacy again.

use super::backend::{RecordKey, StorageBackend};
use super::format;
use crate::error::{Result, ZkbinError};
use crate::model::{Comment, Paste};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Outcome of a [`migrate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// A legacy record was found and rewritten in the current format.
    Converted,
    /// Nothing to do: no record, or the record is already current.
    NotLegacy,
}

/// True if `raw` is a bare JSON record without the protection line.
pub fn is_legacy(raw: &[u8]) -> bool {
    raw.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{')
}

/// Upgrades the record at `key` to the current format if it is legacy.
/// Values have no legacy encoding and always report [`Migration::NotLegacy`].
pub fn migrate<B: StorageBackend + ?Sized>(backend: &B, key: &RecordKey) -> Result<Migration> {
    match key {
        RecordKey::Paste(_) => migrate_as::<Paste, B>(backend, key),
        RecordKey::Comment(_) => migrate_as::<Comment, B>(backend, key),
        RecordKey::Value(_) => Ok(Migration::NotLegacy),
    }
}

fn migrate_as<T, B>(backend: &B, key: &RecordKey) -> Result<Migration>
where
    T: Serialize + DeserializeOwned,
    B: StorageBackend + ?Sized,
{
    if let Some(raw) = backend.read_legacy(key)? {
        if !is_legacy(&raw) {
            return Err(ZkbinError::CorruptRecord(format!("legacy {}", key)));
        }
        let record: T = format::decode_legacy(&raw)?;
        let encoded = format::encode_record(&record)?;
        if !backend.create_if_absent(key, &encoded)? {
            debug!(%key, "current record already present, dropping legacy copy");
        }
        backend.remove_legacy(key)?;
        debug!(%key, "converted legacy record");
        return Ok(Migration::Converted);
    }

    match backend.read(key)? {
        Some(raw) if is_legacy(&raw) => {
            let record: T = format::decode_legacy(&raw)?;
            backend.write(key, &format::encode_record(&record)?)?;
            debug!(%key, "converted bare record in place");
            Ok(Migration::Converted)
        }
        _ => Ok(Migration::NotLegacy),
    }
}
