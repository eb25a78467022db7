use super::mem_backend::MemBackend;
use super::paste_store::PasteStore;

pub type InMemoryStore = PasteStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        PasteStore::with_backend(MemBackend::new())
    }
}
