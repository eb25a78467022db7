use super::fs_backend::FsBackend;
use super::paste_store::PasteStore;
use std::path::{Path, PathBuf};

/// Store rooted at a PrivateBin-compatible data directory.
pub type FileStore = PasteStore<FsBackend>;

impl FileStore {
    /// Opens the store at `root`. Nothing is touched on disk until the first
    /// write, which creates the directory.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        PasteStore::with_backend(FsBackend::new(root))
    }

    pub fn root(&self) -> &Path {
        self.backend.root()
    }
}
