use crate::error::{Result, ZkbinError};
use crate::id::PasteId;
use std::fmt;
use std::str::FromStr;

/// Fixed slots for single scalar values (rate limiter state, install salt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Salt,
    PurgeLimiter,
    TrafficLimiter,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [
        Namespace::Salt,
        Namespace::PurgeLimiter,
        Namespace::TrafficLimiter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Salt => "salt",
            Namespace::PurgeLimiter => "purge_limiter",
            Namespace::TrafficLimiter => "traffic_limiter",
        }
    }
}

impl FromStr for Namespace {
    type Err = ZkbinError;

    fn from_str(s: &str) -> Result<Self> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| ZkbinError::UnknownNamespace(s.to_string()))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a comment: the paste it belongs to, the record it replies to
/// (the paste id itself for top-level comments) and its own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommentKey {
    pub paste: PasteId,
    pub parent: PasteId,
    pub comment: PasteId,
}

impl CommentKey {
    pub fn new(paste: &PasteId, parent: &PasteId, comment: &PasteId) -> Self {
        Self {
            paste: paste.clone(),
            parent: parent.clone(),
            comment: comment.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Paste(PasteId),
    Comment(CommentKey),
    Value(Namespace),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Paste(id) => write!(f, "paste {}", id),
            RecordKey::Comment(key) => write!(
                f,
                "comment {} (paste {}, parent {})",
                key.comment, key.paste, key.parent
            ),
            RecordKey::Value(ns) => write!(f, "value {}", ns),
        }
    }
}

/// Abstract interface for raw record I/O.
///
/// This trait handles the "how" of storage (filesystem vs memory) and deals
/// only in bytes. [`PasteStore`](super::paste_store::PasteStore) handles the
/// "what": encoding, migration, expiry and the boolean contract of
/// [`DataStore`](super::DataStore).
///
/// Records live at a *current* location. Backends that have an older layout
/// also expose a *legacy* location per key; backends without one keep the
/// default no-op legacy methods.
pub trait StorageBackend: Send + Sync {
    // --- Current Layout ---

    /// Read the raw bytes at the current location.
    /// Returns Ok(None) if nothing is stored there.
    fn read(&self, key: &RecordKey) -> Result<Option<Vec<u8>>>;

    /// True if a record is stored at the current location.
    fn exists(&self, key: &RecordKey) -> Result<bool>;

    /// Store `bytes` only if nothing is stored at `key` yet.
    /// MUST be atomic: of two concurrent calls for the same key exactly one
    /// returns Ok(true), and readers never observe a partial record.
    fn create_if_absent(&self, key: &RecordKey, bytes: &[u8]) -> Result<bool>;

    /// Store `bytes`, replacing any existing record. MUST be atomic.
    fn write(&self, key: &RecordKey, bytes: &[u8]) -> Result<()>;

    /// Remove a single record. Removing a missing record is not an error.
    fn remove(&self, key: &RecordKey) -> Result<()>;

    /// Remove a paste together with all of its comments, in either layout.
    /// Comments go first so an interrupted call never leaves a paste whose
    /// discussion is half gone. Removing a missing paste is not an error.
    fn remove_paste(&self, id: &PasteId) -> Result<()>;

    // --- Legacy Layout ---

    /// Read the raw bytes at the legacy location.
    fn read_legacy(&self, _key: &RecordKey) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    /// True if a record is stored at the legacy location.
    fn exists_legacy(&self, key: &RecordKey) -> Result<bool> {
        Ok(self.read_legacy(key)?.is_some())
    }

    /// Remove the record at the legacy location. Missing is not an error.
    fn remove_legacy(&self, _key: &RecordKey) -> Result<()> {
        Ok(())
    }

    // --- Discovery ---

    /// All paste ids found in storage, in either layout, without duplicates.
    fn list_pastes(&self) -> Result<Vec<PasteId>>;

    /// All comment keys stored under `paste`, in either layout, without
    /// duplicates, in a stable order.
    fn list_comments(&self, paste: &PasteId) -> Result<Vec<CommentKey>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_parse() {
        assert_eq!("salt".parse::<Namespace>().unwrap(), Namespace::Salt);
        assert_eq!(
            "purge_limiter".parse::<Namespace>().unwrap(),
            Namespace::PurgeLimiter
        );
        assert_eq!(
            "traffic_limiter".parse::<Namespace>().unwrap(),
            Namespace::TrafficLimiter
        );
        assert!("not_a_namespace".parse::<Namespace>().is_err());
        assert!("Salt".parse::<Namespace>().is_err());
    }

    #[test]
    fn test_namespace_names_roundtrip() {
        for ns in Namespace::ALL {
            assert_eq!(ns.as_str().parse::<Namespace>().unwrap(), ns);
        }
    }

    #[test]
    fn test_record_key_display() {
        let id: PasteId = "5b65a01b43987bc2".parse().unwrap();
        assert_eq!(RecordKey::Paste(id).to_string(), "paste 5b65a01b43987bc2");
        assert_eq!(
            RecordKey::Value(Namespace::Salt).to_string(),
            "value salt"
        );
    }
}
