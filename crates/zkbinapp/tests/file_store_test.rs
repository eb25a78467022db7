use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use zkbinapp::id::PasteId;
use zkbinapp::model::{Comment, CommentMeta, Paste, PasteMeta};
use zkbinapp::store::format::PROTECTION_LINE;
use zkbinapp::store::fs::FileStore;
use zkbinapp::store::DataStore;

fn setup() -> (TempDir, FileStore) {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("data"));
    (dir, store)
}

fn pid(s: &str) -> PasteId {
    s.parse().unwrap()
}

fn paste(expire_date: Option<i64>) -> Paste {
    Paste::new(
        json!([["gMSNoLOk4z0RnmsYwXZ8mw==", "TZO+JWuIuxs=", 100000, 256, 128, "aes", "gcm", "zlib"], "plaintext", 0, 0]),
        "ME5JF/YBEijp2uYMzLZozbKtWc5wfy6R59NBb7SmRig=",
        PasteMeta {
            created: Some(1344803344),
            expire_date,
            salt: None,
        },
    )
}

fn comment(created: i64) -> Comment {
    Comment::new(
        json!([["Pd4pOKWkmDTT9uPwVwd5Ag==", "ZIUhFTliVz4=", 100000, 256, 128, "aes", "gcm", "zlib"], "plaintext", 0, 0]),
        "ZIUhFTliVz4/Pd4pOKWkmDTT9uPwVwd5Ag==",
        CommentMeta {
            created: Some(created),
            icon: None,
        },
    )
}

fn paste_file(root: &Path, id: &str) -> std::path::PathBuf {
    root.join(&id[0..2]).join(&id[2..4]).join(format!("{}.php", id))
}

#[test]
fn test_paste_lifecycle_on_disk() {
    let (_dir, store) = setup();
    let id = pid("5b65a01b43987bc2");
    let record = paste(None);

    assert!(!store.exists(&id));
    assert!(store.create(&id, &record));
    assert!(store.exists(&id));
    assert!(!store.create(&id, &paste(Some(1))));
    assert_eq!(store.read(&id), Some(record));

    let raw = fs::read_to_string(paste_file(store.root(), id.as_str())).unwrap();
    assert!(raw.starts_with(PROTECTION_LINE));
    // slashes are escaped so the payload cannot close the comment
    assert!(!raw.contains("*/"));
    assert!(raw.contains(r"Wc5wfy6R59NBb7SmRig="));
    assert!(raw.contains(r"\/"));

    store.delete(&id);
    assert!(!store.exists(&id));
    assert_eq!(store.read(&id), None);
    assert!(!store.root().join("5b").exists());
}

#[test]
fn test_delete_unknown_paste_is_noop() {
    let (_dir, store) = setup();
    store.delete(&pid("0000000000000000"));
    assert!(!store.exists(&pid("0000000000000000")));
}

#[test]
fn test_comments_are_threaded_and_cascade() {
    let (_dir, store) = setup();
    let id = pid("5b65a01b43987bc2");
    let first = pid("5a52eebf11c4c94b");
    let reply = pid("0000000000000001");

    assert!(store.create(&id, &paste(None)));
    assert!(store.create_comment(&id, &id, &first, &comment(1344803528)));
    assert!(store.create_comment(&id, &first, &reply, &comment(1344803600)));
    assert!(!store.create_comment(&id, &id, &first, &comment(1)));
    assert!(store.exists_comment(&id, &id, &first));
    assert!(store.exists_comment(&id, &first, &reply));

    let comments = store.read_comments(&id);
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[&1344803528].id, first);
    assert_eq!(comments[&1344803528].parentid, id);
    assert_eq!(comments[&1344803600].id, reply);
    assert_eq!(comments[&1344803600].parentid, first);
    assert_eq!(comments[&1344803528].comment, comment(1344803528));

    store.delete(&id);
    assert!(!store.exists_comment(&id, &id, &first));
    assert!(!store.exists_comment(&id, &first, &reply));
    assert!(store.read_comments(&id).is_empty());
}

#[test]
fn test_purge_deletes_expired_only() {
    let (_dir, store) = setup();
    let now = chrono::Utc::now().timestamp();
    let expired = [
        "000000000000000a",
        "000000000000000b",
        "000000000000000c",
        "000000000000000d",
        "000000000000000e",
        "000000000000000f",
        "0000000000000010",
    ];
    let kept = ["ffffffffffffff01", "ffffffffffffff02", "ffffffffffffff03"];

    for id in expired {
        assert!(store.create(&pid(id), &paste(Some(now - 3600))));
        assert!(store.create_comment(&pid(id), &pid(id), &pid("5a52eebf11c4c94b"), &comment(now)));
    }
    assert!(store.create(&pid(kept[0]), &paste(Some(now + 86400 * 365))));
    assert!(store.create(&pid(kept[1]), &paste(None)));
    assert!(store.create(&pid(kept[2]), &paste(Some(now + 3600))));

    let report = store.purge(10);
    assert_eq!(report.purged, 7);

    for id in expired {
        assert!(!store.exists(&pid(id)), "{} should be purged", id);
        assert!(store.read_comments(&pid(id)).is_empty());
    }
    for id in kept {
        assert!(store.exists(&pid(id)), "{} should be kept", id);
    }
}

#[test]
fn test_read_migrates_legacy_paste() {
    let (_dir, store) = setup();
    let id = pid("5b65a01b43987bc2");
    let mut legacy = paste(None);
    legacy.v = serde_json::Number::from(1);

    let shard = store.root().join("5b").join("65");
    fs::create_dir_all(&shard).unwrap();
    let legacy_file = shard.join("5b65a01b43987bc2");
    fs::write(&legacy_file, serde_json::to_vec(&legacy).unwrap()).unwrap();

    assert!(store.exists(&id));
    assert_eq!(store.read(&id), Some(legacy));
    assert!(!legacy_file.exists());

    let current = paste_file(store.root(), id.as_str());
    assert!(fs::read_to_string(current).unwrap().starts_with(PROTECTION_LINE));
}

#[test]
fn test_purge_converts_legacy_files_on_disk() {
    let (_dir, store) = setup();
    let root = store.root().to_path_buf();
    let comment_id = "5a52eebf11c4c94b";
    let ids: Vec<String> = (0..10).map(|n| format!("5b65a01b43987b{:02x}", n)).collect();

    for id in &ids {
        let shard = root.join(&id[0..2]).join(&id[2..4]);
        let discussion = shard.join(format!("{}.discussion", id));
        fs::create_dir_all(&discussion).unwrap();
        fs::write(shard.join(id), serde_json::to_vec(&paste(None)).unwrap()).unwrap();
        fs::write(
            discussion.join(format!("{}.{}.{}", id, comment_id, id)),
            serde_json::to_vec(&comment(1344803528)).unwrap(),
        )
        .unwrap();
    }

    let report = store.purge(10);
    assert_eq!(report.migrated, 20);
    assert_eq!(report.purged, 0);

    for id in &ids {
        let shard = root.join(&id[0..2]).join(&id[2..4]);
        let discussion = shard.join(format!("{}.discussion", id));
        let comment_stem = format!("{}.{}.{}", id, comment_id, id);
        assert!(shard.join(format!("{}.php", id)).is_file(), "{} not converted", id);
        assert!(!shard.join(id).exists(), "{} legacy file left", id);
        assert!(discussion.join(format!("{}.php", comment_stem)).is_file());
        assert!(!discussion.join(&comment_stem).exists());
        assert_eq!(store.read(&pid(id)), Some(paste(None)));
    }
}

#[test]
fn test_read_comments_migrates_legacy_comment() {
    let (_dir, store) = setup();
    let id = pid("5b65a01b43987bc2");
    assert!(store.create(&id, &paste(None)));

    let discussion = store.root().join("5b/65/5b65a01b43987bc2.discussion");
    fs::create_dir_all(&discussion).unwrap();
    let legacy_file = discussion.join("5b65a01b43987bc2.5a52eebf11c4c94b.5b65a01b43987bc2");
    fs::write(&legacy_file, serde_json::to_vec(&comment(1344803528)).unwrap()).unwrap();

    let comments = store.read_comments(&id);
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[&1344803528].id, pid("5a52eebf11c4c94b"));
    assert!(!legacy_file.exists());
    assert!(discussion
        .join("5b65a01b43987bc2.5a52eebf11c4c94b.5b65a01b43987bc2.php")
        .exists());
}

#[test]
fn test_corrupt_paste_reads_none() {
    let (_dir, store) = setup();
    let id = pid("5b65a01b43987bc2");
    let path = paste_file(store.root(), id.as_str());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "invalid content").unwrap();

    assert!(store.exists(&id));
    assert_eq!(store.read(&id), None);
}

#[test]
fn test_values_on_disk() {
    let (_dir, store) = setup();
    assert!(store.set_value("some salt", "salt"));
    assert_eq!(store.get_value("salt"), "some salt");
    assert!(store.root().join("salt.php").exists());
    assert!(store.root().join(".htaccess").exists());

    assert!(!store.set_value("x", "not_a_namespace"));
    assert_eq!(store.get_value("not_a_namespace"), "");
    assert!(!store.root().join("not_a_namespace.php").exists());

    fs::write(store.root().join("traffic_limiter.php"), "invalid content").unwrap();
    assert_eq!(store.get_value("traffic_limiter"), "");
}

#[test]
fn test_concurrent_create_has_one_winner() {
    let (_dir, store) = setup();
    let store = Arc::new(store);
    let id = pid("5b65a01b43987bc2");

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let store = Arc::clone(&store);
            let id = id.clone();
            thread::spawn(move || store.create(&id, &paste(Some(n))))
        })
        .collect();
    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|created| *created)
        .count();

    assert_eq!(wins, 1);
    assert!(store.read(&id).is_some());
}

#[test]
fn test_list_pastes_sees_both_layouts() {
    let (_dir, store) = setup();
    assert!(store.create(&pid("5b65a01b43987bc2"), &paste(None)));
    let shard = store.root().join("00").join("00");
    fs::create_dir_all(&shard).unwrap();
    fs::write(shard.join("0000000000000001"), serde_json::to_vec(&paste(None)).unwrap()).unwrap();

    assert_eq!(
        store.list_pastes(),
        vec![pid("0000000000000001"), pid("5b65a01b43987bc2")]
    );
}
