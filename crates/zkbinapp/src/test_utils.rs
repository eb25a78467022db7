use crate::model::{Comment, CommentMeta, Paste, PasteMeta};
use crate::store::fs::FileStore;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub store: FileStore,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().join("data");
        let store = FileStore::open(&root);
        Self {
            _temp_dir: temp_dir,
            store,
            root,
        }
    }
}

/// A version 2 paste as a client would submit it.
pub fn sample_paste(expire_date: Option<i64>) -> Paste {
    Paste::new(
        json!([
            ["gMSNoLOk4z0RnmsYwXZ8mw==", "TZO+JWuIuxs=", 100000, 256, 128, "aes", "gcm", "zlib"],
            "plaintext",
            1,
            0
        ]),
        "ME5JF/YBEijp2uYMzLZozbKtWc5wfy6R59NBb7SmRig=",
        PasteMeta {
            created: Some(1344803344),
            expire_date,
            salt: None,
        },
    )
}

/// A version 2 top-level comment.
pub fn sample_comment() -> Comment {
    Comment::new(
        json!([
            ["Pd4pOKWkmDTT9uPwVwd5Ag==", "ZIUhFTliVz4=", 100000, 256, 128, "aes", "gcm", "zlib"],
            "plaintext",
            0,
            0
        ]),
        "ME5JF/YBEijp2uYMzLZozbKtWc5wfy6R59NBb7SmRig=",
        CommentMeta {
            created: Some(1344803528),
            icon: Some("data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAABAAAAAQCAIAAACQkWg2".to_string()),
        },
    )
}
