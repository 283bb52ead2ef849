use super::*;
use wire::Message;

fn temp_store() -> FileStore {
    FileStore::new(std::env::temp_dir().join(format!("review-chat-test-{}", uuid::Uuid::new_v4())))
}

fn cleanup(store: &FileStore) {
    let _ = std::fs::remove_dir_all(store.dir());
}

// =============================================================
// MemoryStore
// =============================================================

#[test]
fn memory_store_read_missing_is_none() {
    let store = MemoryStore::new();
    assert_eq!(store.read("nope").unwrap(), None);
}

#[test]
fn memory_store_write_overwrites() {
    let store = MemoryStore::new();
    store.write("k", "one").unwrap();
    store.write("k", "two").unwrap();
    assert_eq!(store.read("k").unwrap().as_deref(), Some("two"));
}

#[test]
fn memory_store_delete_missing_is_ok() {
    let store = MemoryStore::new();
    store.delete("nope").unwrap();
    store.write("k", "v").unwrap();
    store.delete("k").unwrap();
    assert_eq!(store.read("k").unwrap(), None);
}

// =============================================================
// FileStore
// =============================================================

#[test]
fn file_store_round_trip_and_delete() {
    let store = temp_store();
    assert_eq!(store.read(CONVERSATION_KEY).unwrap(), None);

    store.write(CONVERSATION_KEY, "[1,2]").unwrap();
    assert_eq!(store.read(CONVERSATION_KEY).unwrap().as_deref(), Some("[1,2]"));
    assert!(store.dir().join("chatConversation.json").exists());

    store.delete(CONVERSATION_KEY).unwrap();
    assert_eq!(store.read(CONVERSATION_KEY).unwrap(), None);
    store.delete(CONVERSATION_KEY).unwrap();

    cleanup(&store);
}

#[test]
fn file_store_rejects_path_like_keys() {
    let store = temp_store();
    for key in ["", "../escape", "a/b", "with space"] {
        assert!(matches!(store.write(key, "x"), Err(StoreError::InvalidKey(_))), "{key:?}");
    }
    cleanup(&store);
}

// =============================================================
// JSON helpers
// =============================================================

#[test]
fn conversation_round_trips_through_store() {
    let store = MemoryStore::new();
    let conversation = vec![
        Message::user("What does this PR do?"),
        Message::assistant("It adds caching."),
        Message::user("What does this PR do?"),
    ];

    save_json(&store, CONVERSATION_KEY, &conversation);
    let restored: Vec<Message> = load_json(&store, CONVERSATION_KEY).unwrap();
    assert_eq!(restored, conversation);
}

#[test]
fn conversation_round_trips_through_file_store() {
    let store = temp_store();
    let conversation = vec![Message::system("ctx"), Message::user("q"), Message::assistant("a")];

    save_json(&store, CONVERSATION_KEY, &conversation);
    let reopened = FileStore::new(store.dir());
    let restored: Vec<Message> = load_json(&reopened, CONVERSATION_KEY).unwrap();
    assert_eq!(restored, conversation);

    cleanup(&store);
}

#[test]
fn load_json_undecodable_is_none() {
    let store = MemoryStore::new();
    store.write(CONVERSATION_KEY, "{not json").unwrap();
    let restored: Option<Vec<Message>> = load_json(&store, CONVERSATION_KEY);
    assert!(restored.is_none());
}

#[test]
fn remove_deletes_key() {
    let store = MemoryStore::new();
    store.write(CONVERSATION_KEY, "[]").unwrap();
    remove(&store, CONVERSATION_KEY);
    assert_eq!(store.read(CONVERSATION_KEY).unwrap(), None);
}
