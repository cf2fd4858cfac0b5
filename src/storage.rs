//! Namespaced JSON persistence over a [`KeyValueStore`], with fallback.
//!
//! Every public operation is total: store and serialization failures are
//! logged and reported as `false` / `None` / a default value.

use log::{debug, error, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{Envelope, Settings, StorageSize, Todo};
use crate::store::{KeyValueStore, MemoryStore, StoreError, StoreKind};

pub const TODOS_KEY: &str = "todos";
pub const SETTINGS_KEY: &str = "settings";
pub const DEFAULT_NAMESPACE: &str = "todoApp";

const PROBE_KEY: &str = "__storage_test__";

pub struct StorageManager {
    namespace: String,
    store: Box<dyn KeyValueStore>,
}

impl StorageManager {
    /// Probe `primary` with a write/delete cycle and keep it if that works,
    /// otherwise route every operation to `fallback`.
    pub fn new(
        namespace: impl Into<String>,
        primary: Box<dyn KeyValueStore>,
        fallback: Box<dyn KeyValueStore>,
    ) -> Self {
        let namespace = namespace.into();
        let mut primary = primary;
        let store = match probe(primary.as_mut()) {
            Ok(()) => primary,
            Err(e) => {
                warn!(
                    "{} unavailable ({}), falling back to {}",
                    primary.kind(),
                    e,
                    fallback.kind()
                );
                fallback
            }
        };
        debug!("storage namespace '{}' using {}", namespace, store.kind());
        Self { namespace, store }
    }

    /// Adapter backed only by a process-local store
    pub fn session_only(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            store: Box::new(MemoryStore::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn active_kind(&self) -> StoreKind {
        self.store.kind()
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}_{}", self.namespace, key)
    }

    fn prefix(&self) -> String {
        format!("{}_", self.namespace)
    }

    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                error!("failed to serialize '{}': {}", key, e);
                return false;
            }
        };
        let full_key = self.namespaced(key);
        match self.store.set_item(&full_key, &serialized) {
            Ok(()) => {
                debug!("saved '{}' ({} chars)", full_key, serialized.chars().count());
                true
            }
            Err(e) => {
                error!("failed to save '{}': {}", full_key, e);
                false
            }
        }
    }

    /// Read and decode a value; absent, unreadable and corrupt data all yield `None`
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.namespaced(key);
        let raw = match self.store.get_item(&full_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("failed to read '{}': {}", full_key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ignoring corrupt data under '{}': {}", full_key, e);
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let full_key = self.namespaced(key);
        match self.store.remove_item(&full_key) {
            Ok(()) => true,
            Err(e) => {
                error!("failed to remove '{}': {}", full_key, e);
                false
            }
        }
    }

    /// Remove every key under this adapter's namespace
    pub fn clear(&mut self) -> bool {
        match self.clear_namespace() {
            Ok(removed) => {
                debug!("cleared {} keys under '{}'", removed, self.namespace);
                true
            }
            Err(e) => {
                error!("failed to clear namespace '{}': {}", self.namespace, e);
                false
            }
        }
    }

    fn clear_namespace(&mut self) -> Result<usize, StoreError> {
        let prefix = self.prefix();
        let keys: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(&prefix))
            .collect();
        for key in &keys {
            self.store.remove_item(key)?;
        }
        Ok(keys.len())
    }

    pub fn save_settings(&mut self, settings: &Settings) -> bool {
        self.save(SETTINGS_KEY, settings)
    }

    pub fn load_settings(&self) -> Settings {
        self.load(SETTINGS_KEY).unwrap_or_default()
    }

    pub fn export_data(&self) -> Envelope {
        let todos: Vec<Todo> = self.load(TODOS_KEY).unwrap_or_default();
        Envelope::new(todos, self.load_settings())
    }

    /// Restore todos and settings from an export envelope.
    ///
    /// Each field is written independently when present and well formed, so
    /// a partial envelope still imports what it has. Returns `false` when
    /// the input is not an object or a write fails.
    pub fn import_data(&mut self, envelope: &serde_json::Value) -> bool {
        let Some(fields) = envelope.as_object() else {
            error!("import rejected: envelope is not a JSON object");
            return false;
        };

        let mut ok = true;

        match fields.get("todos") {
            Some(todos @ serde_json::Value::Array(_)) => {
                match serde_json::from_value::<Vec<Todo>>(todos.clone()) {
                    Ok(todos) => ok &= self.save(TODOS_KEY, &todos),
                    Err(e) => warn!("import skipped todos: {}", e),
                }
            }
            Some(_) => warn!("import skipped todos: not an array"),
            None => debug!("import has no todos"),
        }

        match fields.get("settings") {
            Some(serde_json::Value::Null) | None => debug!("import has no settings"),
            Some(settings) => match serde_json::from_value::<Settings>(settings.clone()) {
                Ok(settings) => ok &= self.save_settings(&settings),
                Err(e) => warn!("import skipped settings: {}", e),
            },
        }

        ok
    }

    /// Summed character length of every namespaced value in the active store
    pub fn get_storage_size(&self) -> StorageSize {
        let prefix = self.prefix();
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!("failed to list keys: {}", e);
                return StorageSize::from_bytes(0);
            }
        };
        let bytes = keys
            .iter()
            .filter(|k| k.starts_with(&prefix))
            .filter_map(|k| self.store.get_item(k).ok().flatten())
            .map(|v| v.chars().count())
            .sum();
        StorageSize::from_bytes(bytes)
    }
}

fn probe(store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
    store.set_item(PROBE_KEY, PROBE_KEY)?;
    store.remove_item(PROBE_KEY)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::SqliteStore;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Store whose every call fails, standing in for a disabled storage area
    pub struct UnavailableStore;

    impl KeyValueStore for UnavailableStore {
        fn kind(&self) -> StoreKind {
            StoreKind::Local
        }
        fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
        fn remove_item(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
        fn keys(&self) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
    }

    /// Wraps a store and counts writes (the probe is not counted)
    pub struct CountingStore {
        pub inner: MemoryStore,
        pub writes: Rc<Cell<usize>>,
    }

    impl KeyValueStore for CountingStore {
        fn kind(&self) -> StoreKind {
            StoreKind::Local
        }
        fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get_item(key)
        }
        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            if key != PROBE_KEY {
                self.writes.set(self.writes.get() + 1);
            }
            self.inner.set_item(key, value)
        }
        fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
            self.inner.remove_item(key)
        }
        fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.keys()
        }
    }

    /// Durable-kind adapter over an in-memory SQLite database
    pub fn memory_manager() -> StorageManager {
        StorageManager::new(
            DEFAULT_NAMESPACE,
            Box::new(SqliteStore::in_memory().unwrap()),
            Box::new(MemoryStore::new()),
        )
    }

    pub fn counting_manager() -> (StorageManager, Rc<Cell<usize>>) {
        let writes = Rc::new(Cell::new(0));
        let store = CountingStore {
            inner: MemoryStore::new(),
            writes: Rc::clone(&writes),
        };
        let manager = StorageManager::new(
            DEFAULT_NAMESPACE,
            Box::new(store),
            Box::new(MemoryStore::new()),
        );
        (manager, writes)
    }
}
