use canvas_plus::dates::parse_timestamp;
use canvas_plus::store::{load, save};
use canvas_plus::{MemoryStorage, MutationOutcome, SqliteStorage, TodoItem, TodoStorage, TodoStore};

fn texts<S: TodoStorage>(store: &TodoStore<S>) -> Vec<String> {
    store.items().iter().map(|t| t.text.clone()).collect()
}

#[test]
fn empty_storage_loads_empty_list() {
    let store = TodoStore::open(MemoryStorage::default());
    assert!(store.is_empty());
}

#[test]
fn add_appends_trimmed_item_and_saves() {
    let mut store = TodoStore::open(MemoryStorage::default());
    assert!(matches!(store.add("  read chapter 4 "), MutationOutcome::Saved));

    let item = &store.items()[0];
    assert_eq!(item.text, "read chapter 4");
    assert!(!item.done);
    assert!(parse_timestamp(&item.created_at).is_some());
    assert!(store.storage().value.as_deref().unwrap().contains("createdAt"));
}

#[test]
fn blank_text_is_ignored() {
    let mut store = TodoStore::open(MemoryStorage::default());
    assert!(matches!(store.add(""), MutationOutcome::Ignored));
    assert!(matches!(store.add("   "), MutationOutcome::Ignored));
    assert!(matches!(store.add("\t\n"), MutationOutcome::Ignored));
    assert_eq!(store.len(), 0);
    assert_eq!(store.storage().value, None);
}

#[test]
fn toggle_twice_restores_flag() {
    let mut store = TodoStore::open(MemoryStorage::default());
    let _ = store.add("a");
    let _ = store.add("b");

    assert!(matches!(store.toggle(1), MutationOutcome::Saved));
    assert!(store.items()[1].done);
    assert!(!store.items()[0].done);
    let _ = store.toggle(1);
    assert!(!store.items()[1].done);
}

#[test]
fn toggle_does_not_touch_created_at() {
    let mut store = TodoStore::open(MemoryStorage::default());
    let _ = store.add("a");
    let created_at = store.items()[0].created_at.clone();
    let _ = store.toggle(0);
    assert_eq!(store.items()[0].created_at, created_at);
}

#[test]
fn out_of_range_index_is_ignored_without_writing() {
    let mut store = TodoStore::open(MemoryStorage::default());
    let _ = store.add("a");
    let before = store.storage().value.clone();
    store.storage_mut().value = Some("sentinel".to_string());

    assert!(matches!(store.toggle(1), MutationOutcome::Ignored));
    assert!(matches!(store.delete(5), MutationOutcome::Ignored));
    assert_eq!(store.storage().value.as_deref(), Some("sentinel"));
    assert_eq!(store.len(), 1);
    assert!(before.is_some());
}

#[test]
fn delete_keeps_relative_order() {
    let mut store = TodoStore::open(MemoryStorage::default());
    for text in ["a", "b", "c", "d"] {
        let _ = store.add(text);
    }
    assert!(matches!(store.delete(1), MutationOutcome::Saved));
    assert_eq!(texts(&store), vec!["a", "c", "d"]);
    let _ = store.delete(2);
    assert_eq!(texts(&store), vec!["a", "c"]);
    let _ = store.delete(0);
    assert_eq!(texts(&store), vec!["c"]);
}

#[test]
fn reload_matches_memory_after_mutations() {
    let mut store = TodoStore::open(MemoryStorage::default());
    let _ = store.add("one");
    let _ = store.add("two");
    let _ = store.add("three");
    let _ = store.toggle(2);
    let _ = store.delete(0);
    let _ = store.add("four");
    let _ = store.toggle(0);
    let _ = store.toggle(7);

    let in_memory = store.items().to_vec();
    assert_eq!(store.reload(), in_memory.as_slice());
}

#[test]
fn sqlite_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("todos.sqlite");

    {
        let mut store = TodoStore::open(SqliteStorage::open(&path).unwrap());
        let _ = store.add("write essay");
        let _ = store.add("lab report");
        let _ = store.toggle(1);
    }

    let store = TodoStore::open(SqliteStorage::open(&path).unwrap());
    assert_eq!(texts(&store), vec!["write essay", "lab report"]);
    assert!(!store.items()[0].done);
    assert!(store.items()[1].done);
}

#[test]
fn non_array_content_loads_empty() {
    for raw in [r#""not an array""#, "not an array", "{}", "42", "null", ""] {
        let store = TodoStore::open(MemoryStorage::with_value(raw));
        assert!(store.is_empty(), "expected empty list for {raw:?}");
    }
}

#[test]
fn read_failure_loads_empty() {
    let storage = MemoryStorage {
        value: Some(r#"[{"text":"a","done":false,"createdAt":"2026-05-09T14:00:00"}]"#.to_string()),
        fail_reads: true,
        fail_writes: false,
    };
    assert!(load(&storage).is_empty());
}

#[test]
fn malformed_entries_are_coerced() {
    let raw = r#"[
        {"text": "kept", "done": true, "createdAt": "2026-05-09T14:00:00"},
        {"done": "yes"},
        {"text": "no date", "createdAt": ""},
        "stray string"
    ]"#;
    let items = load(&MemoryStorage::with_value(raw));

    assert_eq!(items.len(), 4);
    assert_eq!(
        items[0],
        TodoItem {
            text: "kept".to_string(),
            done: true,
            created_at: "2026-05-09T14:00:00".to_string(),
        }
    );
    assert_eq!(items[1].text, "");
    assert!(!items[1].done);
    assert_eq!(items[2].text, "no date");
    for item in &items {
        assert!(parse_timestamp(&item.created_at).is_some());
    }
}

#[test]
fn write_failure_keeps_memory_and_next_save_reconciles() {
    let mut store = TodoStore::open(MemoryStorage::default());
    let _ = store.add("first");

    store.storage_mut().fail_writes = true;
    let outcome = store.add("second");
    assert!(matches!(outcome, MutationOutcome::Unsaved(_)));
    assert!(outcome.changed());
    assert_eq!(texts(&store), vec!["first", "second"]);
    assert_eq!(load(store.storage()).len(), 1);

    store.storage_mut().fail_writes = false;
    assert!(matches!(store.toggle(0), MutationOutcome::Saved));
    let persisted: Vec<String> = load(store.storage()).into_iter().map(|t| t.text).collect();
    assert_eq!(persisted, vec!["first", "second"]);
}

#[test]
fn save_writes_wire_field_names() {
    let mut storage = MemoryStorage::default();
    let items = vec![TodoItem::new("a", "2026-05-09T14:00:00.000Z")];
    save(&mut storage, &items).unwrap();

    let value: serde_json::Value = serde_json::from_str(storage.value.as_deref().unwrap()).unwrap();
    assert_eq!(
        value,
        serde_json::json!([{ "text": "a", "done": false, "createdAt": "2026-05-09T14:00:00.000Z" }])
    );
}
