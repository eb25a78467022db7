use super::backend::{CommentKey, Namespace, RecordKey, StorageBackend};
use super::format;
use super::migrate::{self, Migration};
use super::{DataStore, PurgeReport, PURGE_SCAN_FACTOR};
use crate::error::Result;
use crate::id::PasteId;
use crate::model::{Comment, Paste, ThreadedComment};
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub struct PasteStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
}

impl<B: StorageBackend> PasteStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Purge with an explicit clock. [`DataStore::purge`] calls this with the
    /// current time.
    pub fn purge_at(&self, batch_size: usize, now: i64) -> PurgeReport {
        let mut report = PurgeReport::default();
        if batch_size == 0 {
            return report;
        }

        let mut candidates = match self.backend.list_pastes() {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "purge: failed to list pastes");
                return report;
            }
        };
        candidates.shuffle(&mut rand::thread_rng());

        for id in candidates.iter().take(batch_size.saturating_mul(PURGE_SCAN_FACTOR)) {
            if report.purged >= batch_size {
                break;
            }
            report.inspected += 1;
            report.migrated += self.migrate_paste(id);

            let key = RecordKey::Paste(id.clone());
            match self.load::<Paste>(&key) {
                Ok(Some(paste)) if paste.is_expired(now) => {
                    match self.backend.remove_paste(id) {
                        Ok(()) => {
                            debug!(%id, "purged expired paste");
                            report.purged += 1;
                        }
                        Err(e) => warn!(%id, error = %e, "purge: failed to delete paste"),
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(%id, error = %e, "purge: skipping unreadable paste"),
            }
        }

        if report.purged > 0 || report.migrated > 0 {
            info!(
                inspected = report.inspected,
                migrated = report.migrated,
                purged = report.purged,
                "purge pass finished"
            );
        }
        report
    }

    /// Converts a paste and its comments, returning how many records changed.
    fn migrate_paste(&self, id: &PasteId) -> usize {
        let mut keys = vec![RecordKey::Paste(id.clone())];
        match self.backend.list_comments(id) {
            Ok(comments) => keys.extend(comments.into_iter().map(RecordKey::Comment)),
            Err(e) => warn!(%id, error = %e, "failed to list comments for migration"),
        }

        keys.iter()
            .filter(|key| match migrate::migrate(&self.backend, key) {
                Ok(Migration::Converted) => true,
                Ok(Migration::NotLegacy) => false,
                Err(e) => {
                    warn!(%key, error = %e, "failed to convert legacy record");
                    false
                }
            })
            .count()
    }

    /// Reads and decodes the record at `key`, converting a legacy copy first.
    fn load<T: DeserializeOwned>(&self, key: &RecordKey) -> Result<Option<T>> {
        if let Some(raw) = self.backend.read(key)? {
            if format::is_current(&raw) {
                return format::decode_record(&raw, &key.to_string()).map(Some);
            }
        }

        migrate::migrate(&self.backend, key)?;
        match self.backend.read(key)? {
            Some(raw) => format::decode_record(&raw, &key.to_string()).map(Some),
            None => Ok(None),
        }
    }

    fn stored(&self, key: &RecordKey) -> Result<bool> {
        Ok(self.backend.exists(key)? || self.backend.exists_legacy(key)?)
    }

    fn try_create<T: Serialize>(&self, key: &RecordKey, record: &T) -> Result<bool> {
        // a legacy copy still owns the id until it is converted
        if self.backend.exists_legacy(key)? {
            return Ok(false);
        }
        self.backend.create_if_absent(key, &format::encode_record(record)?)
    }

    fn try_read_comments(&self, paste_id: &PasteId) -> Result<BTreeMap<i64, ThreadedComment>> {
        let mut comments = BTreeMap::new();
        for key in self.backend.list_comments(paste_id)? {
            let CommentKey {
                parent, comment: id, ..
            } = key.clone();
            match self.load::<Comment>(&RecordKey::Comment(key)) {
                Ok(Some(comment)) => {
                    comments.insert(
                        comment.created(),
                        ThreadedComment {
                            comment,
                            id,
                            parentid: parent,
                        },
                    );
                }
                Ok(None) => {}
                Err(e) => warn!(paste = %paste_id, comment = %id, error = %e, "skipping unreadable comment"),
            }
        }
        Ok(comments)
    }
}

impl<B: StorageBackend> DataStore for PasteStore<B> {
    fn exists(&self, id: &PasteId) -> bool {
        self.stored(&RecordKey::Paste(id.clone()))
            .unwrap_or_else(|e| {
                warn!(%id, error = %e, "failed to check paste");
                false
            })
    }

    fn create(&self, id: &PasteId, paste: &Paste) -> bool {
        match self.try_create(&RecordKey::Paste(id.clone()), paste) {
            Ok(created) => created,
            Err(e) => {
                warn!(%id, error = %e, "failed to create paste");
                false
            }
        }
    }

    fn read(&self, id: &PasteId) -> Option<Paste> {
        self.load(&RecordKey::Paste(id.clone())).unwrap_or_else(|e| {
            warn!(%id, error = %e, "failed to read paste");
            None
        })
    }

    fn delete(&self, id: &PasteId) {
        if let Err(e) = self.backend.remove_paste(id) {
            warn!(%id, error = %e, "failed to delete paste");
        }
    }

    fn exists_comment(&self, paste_id: &PasteId, parent_id: &PasteId, comment_id: &PasteId) -> bool {
        let key = RecordKey::Comment(CommentKey::new(paste_id, parent_id, comment_id));
        self.stored(&key).unwrap_or_else(|e| {
            warn!(%key, error = %e, "failed to check comment");
            false
        })
    }

    fn create_comment(
        &self,
        paste_id: &PasteId,
        parent_id: &PasteId,
        comment_id: &PasteId,
        comment: &Comment,
    ) -> bool {
        let key = RecordKey::Comment(CommentKey::new(paste_id, parent_id, comment_id));
        match self.try_create(&key, comment) {
            Ok(created) => created,
            Err(e) => {
                warn!(%key, error = %e, "failed to create comment");
                false
            }
        }
    }

    fn read_comments(&self, paste_id: &PasteId) -> BTreeMap<i64, ThreadedComment> {
        self.try_read_comments(paste_id).unwrap_or_else(|e| {
            warn!(paste = %paste_id, error = %e, "failed to list comments");
            BTreeMap::new()
        })
    }

    fn get_value(&self, namespace: &str) -> String {
        let Ok(ns) = namespace.parse::<Namespace>() else {
            debug!(namespace, "get_value on unknown namespace");
            return String::new();
        };
        match self.backend.read(&RecordKey::Value(ns)) {
            Ok(Some(raw)) => format::decode_value(&raw).unwrap_or_else(|| {
                warn!(namespace, "ignoring corrupt value");
                String::new()
            }),
            Ok(None) => String::new(),
            Err(e) => {
                warn!(namespace, error = %e, "failed to read value");
                String::new()
            }
        }
    }

    fn set_value(&self, value: &str, namespace: &str) -> bool {
        let Ok(ns) = namespace.parse::<Namespace>() else {
            debug!(namespace, "set_value on unknown namespace");
            return false;
        };
        match self.backend.write(&RecordKey::Value(ns), &format::encode_value(value)) {
            Ok(()) => true,
            Err(e) => {
                warn!(namespace, error = %e, "failed to write value");
                false
            }
        }
    }

    fn purge(&self, batch_size: usize) -> PurgeReport {
        self.purge_at(batch_size, chrono::Utc::now().timestamp())
    }

    fn list_pastes(&self) -> Vec<PasteId> {
        self.backend.list_pastes().unwrap_or_else(|e| {
            warn!(error = %e, "failed to list pastes");
            Vec::new()
        })
    }
}
