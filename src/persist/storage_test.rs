use super::*;

// =============================================================
// MemoryStore
// =============================================================

#[test]
fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get_item("token").unwrap(), None);

    store.set_item("token", "abc").unwrap();
    assert_eq!(store.get_item("token").unwrap().as_deref(), Some("abc"));
    assert_eq!(store.len(), 1);

    store.remove_item("token").unwrap();
    store.remove_item("token").unwrap();
    assert!(store.is_empty());
}

#[test]
fn memory_store_overwrites() {
    let store = MemoryStore::new();
    store.set_item("language", "\"ko\"").unwrap();
    store.set_item("language", "\"en\"").unwrap();
    assert_eq!(store.get_item("language").unwrap().as_deref(), Some("\"en\""));
}

#[test]
fn pin_key_is_namespaced() {
    assert_eq!(pin_key("header"), "pin.header");
}

// =============================================================
// DirStore
// =============================================================

#[test]
fn dir_store_persists_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();
    store.set_item(SCREEN_LIST_KEY, "[\"s1\"]").unwrap();

    let reopened = DirStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get_item(SCREEN_LIST_KEY).unwrap().as_deref(), Some("[\"s1\"]"));
}

#[test]
fn dir_store_missing_key_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();
    assert_eq!(store.get_item(PANELS_KEY).unwrap(), None);
    store.remove_item(PANELS_KEY).unwrap();
}

#[test]
fn dir_store_creates_nested_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("a").join("b");
    let store = DirStore::open(&root).unwrap();
    assert_eq!(store.root(), root.as_path());
    assert!(root.is_dir());
}

#[test]
fn dir_store_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();
    store.set_item(KAKAO_STATE_KEY, "s").unwrap();
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![KAKAO_STATE_KEY.to_owned()]);
}

#[test]
fn dir_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();
    for key in ["", "../escape", "a/b", ".hidden"] {
        assert!(matches!(store.set_item(key, "x"), Err(StorageError::InvalidKey(_))), "{key}");
    }
}

#[test]
fn store_is_object_safe() {
    let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
    store.set_item(OAUTH_CODE_KEY, "c").unwrap();
    assert_eq!(store.get_item(OAUTH_CODE_KEY).unwrap().as_deref(), Some("c"));
}
