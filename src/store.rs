//! Best-effort todo persistence.
//!
//! The in-memory list is authoritative. Storage failures are logged and
//! reported through [`MutationOutcome`] but never undo a mutation; the next
//! successful save reconciles storage with memory.

use log::{info, warn};
use serde_json::Value;

use crate::database::{StorageError, StorageResult};
use crate::dates::now_timestamp;
use crate::model::TodoItem;

/// A durable slot holding the serialized todo list.
pub trait TodoStorage {
    fn read(&self) -> StorageResult<Option<String>>;
    fn write(&mut self, value: &str) -> StorageResult<()>;
}

/// In-process storage with switchable failures.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    pub value: Option<String>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MemoryStorage {
    pub fn with_value(value: impl Into<String>) -> Self {
        MemoryStorage {
            value: Some(value.into()),
            ..MemoryStorage::default()
        }
    }
}

impl TodoStorage for MemoryStorage {
    fn read(&self) -> StorageResult<Option<String>> {
        if self.fail_reads {
            return Err(StorageError::Unavailable("read refused".to_string()));
        }
        Ok(self.value.clone())
    }

    fn write(&mut self, value: &str) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.value = Some(value.to_string());
        Ok(())
    }
}

impl<T: TodoStorage + ?Sized> TodoStorage for Box<T> {
    fn read(&self) -> StorageResult<Option<String>> {
        (**self).read()
    }

    fn write(&mut self, value: &str) -> StorageResult<()> {
        (**self).write(value)
    }
}

#[must_use]
#[derive(Debug)]
pub enum MutationOutcome {
    /// The list changed and storage now matches it.
    Saved,
    /// Nothing changed and nothing was written.
    Ignored,
    /// The list changed in memory but the write failed.
    Unsaved(StorageError),
}

impl MutationOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, MutationOutcome::Ignored)
    }

    fn from_save(result: StorageResult<()>) -> Self {
        match result {
            Ok(()) => MutationOutcome::Saved,
            Err(err) => MutationOutcome::Unsaved(err),
        }
    }
}

pub struct TodoStore<S: TodoStorage> {
    storage: S,
    items: Vec<TodoItem>,
}

impl<S: TodoStorage> TodoStore<S> {
    pub fn open(storage: S) -> Self {
        let items = load(&storage);
        TodoStore { storage, items }
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Replaces the in-memory list with whatever storage currently holds.
    pub fn reload(&mut self) -> &[TodoItem] {
        self.items = load(&self.storage);
        &self.items
    }

    pub fn save(&mut self) -> StorageResult<()> {
        save(&mut self.storage, &self.items)
    }

    pub fn add(&mut self, text: &str) -> MutationOutcome {
        let text = text.trim();
        if text.is_empty() {
            return MutationOutcome::Ignored;
        }
        self.items.push(TodoItem::new(text, now_timestamp()));
        MutationOutcome::from_save(self.save())
    }

    pub fn toggle(&mut self, index: usize) -> MutationOutcome {
        match self.items.get_mut(index) {
            Some(item) => item.done = !item.done,
            None => return MutationOutcome::Ignored,
        }
        MutationOutcome::from_save(self.save())
    }

    pub fn delete(&mut self, index: usize) -> MutationOutcome {
        if index >= self.items.len() {
            return MutationOutcome::Ignored;
        }
        self.items.remove(index);
        MutationOutcome::from_save(self.save())
    }
}

/// Reads the todo list, degrading to an empty list on any failure.
pub fn load<S: TodoStorage + ?Sized>(storage: &S) -> Vec<TodoItem> {
    let raw = match storage.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return vec![],
        Err(err) => {
            warn!("event=todos_load module=store status=error error={}", err);
            return vec![];
        }
    };
    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("event=todos_load module=store status=error error={}", err);
            return vec![];
        }
    };
    let entries = match parsed {
        Value::Array(entries) => entries,
        _ => {
            warn!("event=todos_load module=store status=error error=not_an_array");
            return vec![];
        }
    };

    let items: Vec<TodoItem> = entries.iter().map(coerce_item).collect();
    info!("event=todos_load module=store status=ok count={}", items.len());
    items
}

pub fn save<S: TodoStorage + ?Sized>(storage: &mut S, items: &[TodoItem]) -> StorageResult<()> {
    let result = serde_json::to_string(items)
        .map_err(StorageError::from)
        .and_then(|serialized| storage.write(&serialized));
    if let Err(err) = &result {
        warn!("event=todos_save module=store status=error error={}", err);
    }
    result
}

fn coerce_item(entry: &Value) -> TodoItem {
    let text = entry
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let done = entry.get("done").and_then(Value::as_bool).unwrap_or(false);
    let created_at = match entry.get("createdAt").and_then(Value::as_str) {
        Some(created_at) if !created_at.is_empty() => created_at.to_string(),
        _ => now_timestamp(),
    };
    TodoItem {
        text,
        done,
        created_at,
    }
}
