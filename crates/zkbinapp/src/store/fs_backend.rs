use super::backend::{CommentKey, RecordKey, StorageBackend};
use crate::error::Result;
use crate::id::{is_valid_id, PasteId};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Extension of current-format files. Legacy files carry none.
const CURRENT_EXT: &str = ".php";
const DISCUSSION_SUFFIX: &str = ".discussion";
const TMP_PREFIX: &str = ".tmp-";

/// Written at the storage root so a web server pointed at it refuses to serve it.
const HTACCESS: &str = "<IfModule mod_authz_core.c>\n\
Require all denied\n\
</IfModule>\n\
<IfModule !mod_authz_core.c>\n\
Deny from all\n\
</IfModule>\n";

/// Filesystem backend with two levels of directory sharding.
///
/// ```text
/// <root>/
/// ├── .htaccess
/// ├── salt.php                                   # namespace values
/// └── 5b/65/
///     ├── 5b65a01b43987bc2.php                   # paste
///     └── 5b65a01b43987bc2.discussion/
///         └── 5b65a01b43987bc2.5a52eebf11c4c94b.5b65a01b43987bc2.php
///                                                # <paste>.<comment>.<parent>
/// ```
///
/// Legacy records use the same paths without the `.php` extension.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn shard_dir(&self, id: &PasteId) -> PathBuf {
        self.root.join(id.shard_outer()).join(id.shard_inner())
    }

    fn discussion_dir(&self, id: &PasteId) -> PathBuf {
        self.shard_dir(id)
            .join(format!("{}{}", id, DISCUSSION_SUFFIX))
    }

    fn comment_stem(key: &CommentKey) -> String {
        format!("{}.{}.{}", key.paste, key.comment, key.parent)
    }

    /// Path of the current-format file for `key`.
    pub fn current_path(&self, key: &RecordKey) -> PathBuf {
        match key {
            RecordKey::Paste(id) => self.shard_dir(id).join(format!("{}{}", id, CURRENT_EXT)),
            RecordKey::Comment(c) => self
                .discussion_dir(&c.paste)
                .join(format!("{}{}", Self::comment_stem(c), CURRENT_EXT)),
            RecordKey::Value(ns) => self.root.join(format!("{}{}", ns, CURRENT_EXT)),
        }
    }

    /// Path of the legacy file for `key`. Values never had a legacy layout.
    pub fn legacy_path(&self, key: &RecordKey) -> Option<PathBuf> {
        match key {
            RecordKey::Paste(id) => Some(self.shard_dir(id).join(id.as_str())),
            RecordKey::Comment(c) => Some(self.discussion_dir(&c.paste).join(Self::comment_stem(c))),
            RecordKey::Value(_) => None,
        }
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let htaccess = self.root.join(".htaccess");
        if !htaccess.exists() {
            // A concurrent writer may have won; both write the same content.
            fs::write(&htaccess, HTACCESS)?;
        }
        Ok(())
    }

    /// Write `bytes` to a temp file next to `target`, creating the directory
    /// if needed. Retries once if a concurrent purge pruned the directory
    /// between creating it and staging the file.
    fn stage(&self, target: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
        self.ensure_root()?;
        let dir = target.parent().unwrap_or(&self.root);
        let mut attempt = 0;
        loop {
            fs::create_dir_all(dir)?;
            match tempfile::Builder::new().prefix(TMP_PREFIX).tempfile_in(dir) {
                Ok(mut tmp) => {
                    tmp.write_all(bytes)?;
                    tmp.as_file().sync_all()?;
                    return Ok(tmp);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound && attempt == 0 => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_path(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_path(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove now-empty shard directories. Non-empty ones stay.
    fn prune_shards(&self, id: &PasteId) {
        let inner = self.shard_dir(id);
        if fs::remove_dir(&inner).is_ok() {
            if let Some(outer) = inner.parent() {
                let _ = fs::remove_dir(outer);
            }
        }
    }

    fn read_dir_names(dir: &Path) -> Result<Vec<(String, bool)>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let is_dir = entry.file_type()?.is_dir();
            if let Some(name) = entry.file_name().to_str() {
                names.push((name.to_string(), is_dir));
            }
        }
        Ok(names)
    }
}

fn is_shard_name(name: &str) -> bool {
    name.len() == 2 && name.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn strip_current_ext(name: &str) -> &str {
    name.strip_suffix(CURRENT_EXT).unwrap_or(name)
}

impl StorageBackend for FsBackend {
    fn read(&self, key: &RecordKey) -> Result<Option<Vec<u8>>> {
        Self::read_path(&self.current_path(key))
    }

    fn exists(&self, key: &RecordKey) -> Result<bool> {
        Ok(self.current_path(key).is_file())
    }

    fn create_if_absent(&self, key: &RecordKey, bytes: &[u8]) -> Result<bool> {
        let target = self.current_path(key);
        if target.exists() {
            return Ok(false);
        }
        let tmp = self.stage(&target, bytes)?;
        // Hard-links the temp file into place, failing if the target exists.
        match tmp.persist_noclobber(&target) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &RecordKey, bytes: &[u8]) -> Result<()> {
        let target = self.current_path(key);
        let tmp = self.stage(&target, bytes)?;
        tmp.persist(&target)?;
        Ok(())
    }

    fn remove(&self, key: &RecordKey) -> Result<()> {
        Self::remove_path(&self.current_path(key))
    }

    fn remove_paste(&self, id: &PasteId) -> Result<()> {
        match fs::remove_dir_all(self.discussion_dir(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        let key = RecordKey::Paste(id.clone());
        Self::remove_path(&self.current_path(&key))?;
        if let Some(legacy) = self.legacy_path(&key) {
            Self::remove_path(&legacy)?;
        }
        self.prune_shards(id);
        Ok(())
    }

    fn read_legacy(&self, key: &RecordKey) -> Result<Option<Vec<u8>>> {
        match self.legacy_path(key) {
            Some(path) => Self::read_path(&path),
            None => Ok(None),
        }
    }

    fn exists_legacy(&self, key: &RecordKey) -> Result<bool> {
        Ok(self.legacy_path(key).is_some_and(|p| p.is_file()))
    }

    fn remove_legacy(&self, key: &RecordKey) -> Result<()> {
        match self.legacy_path(key) {
            Some(path) => Self::remove_path(&path),
            None => Ok(()),
        }
    }

    fn list_pastes(&self) -> Result<Vec<PasteId>> {
        let mut ids = BTreeSet::new();
        for (outer, is_dir) in Self::read_dir_names(&self.root)? {
            if !is_dir || !is_shard_name(&outer) {
                continue;
            }
            let outer_dir = self.root.join(&outer);
            for (inner, is_dir) in Self::read_dir_names(&outer_dir)? {
                if !is_dir || !is_shard_name(&inner) {
                    continue;
                }
                let prefix = format!("{}{}", outer, inner);
                for (name, is_dir) in Self::read_dir_names(&outer_dir.join(&inner))? {
                    if is_dir {
                        continue;
                    }
                    let stem = strip_current_ext(&name);
                    if is_valid_id(stem) && stem.starts_with(&prefix) {
                        ids.insert(stem.parse::<PasteId>()?);
                    }
                }
            }
        }
        Ok(ids.into_iter().collect())
    }

    fn list_comments(&self, paste: &PasteId) -> Result<Vec<CommentKey>> {
        let mut keys = BTreeSet::new();
        for (name, is_dir) in Self::read_dir_names(&self.discussion_dir(paste))? {
            if is_dir {
                continue;
            }
            let parts: Vec<&str> = strip_current_ext(&name).split('.').collect();
            if let [owner, comment, parent] = parts.as_slice() {
                if *owner == paste.as_str() && is_valid_id(comment) && is_valid_id(parent) {
                    keys.insert(CommentKey {
                        paste: paste.clone(),
                        parent: parent.parse()?,
                        comment: comment.parse()?,
                    });
                }
            }
        }
        Ok(keys.into_iter().collect())
    }
}
