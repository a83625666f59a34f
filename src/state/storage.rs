//! Persistent storage for small values.
//!
//! A [`Storage`] backend maps string keys to string payloads; [`Stored`]
//! layers a typed value on top, encoded as JSON. The backend is reached
//! through the environment ([`StorageKey`]), so a subtree can be pointed at
//! another backend without touching the views inside it.
//!
//! Failures never reach the view: reads fall back to the default and writes
//! report `false`, both with a warning.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::engine::EnvironmentKey;
use crate::error::Result;

/// Key/value backend.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: String) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process backend. Values live as long as the backend does.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.values.borrow_mut().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// A backend as installed in the environment. Two handles are equal when
/// they share the same backend.
#[derive(Clone)]
pub struct SharedStorage(pub Rc<dyn Storage>);

impl PartialEq for SharedStorage {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedStorage")
    }
}

/// Environment slot holding the storage backend, if any.
pub struct StorageKey;

impl EnvironmentKey for StorageKey {
    type Value = Option<SharedStorage>;

    fn default_value() -> Self::Value {
        None
    }
}

/// A typed value persisted under one key.
pub struct Stored<T> {
    storage: Option<Rc<dyn Storage>>,
    key: String,
    default: T,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Stored<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stored")
            .field("key", &self.key)
            .field("backed", &self.storage.is_some())
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned + Clone> Stored<T> {
    /// With no backend every read yields `default` and every write fails.
    pub fn new(storage: Option<Rc<dyn Storage>>, key: impl Into<String>, default: T) -> Self {
        Self {
            storage,
            key: key.into(),
            default,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored value, or the default when absent or unreadable.
    pub fn get(&self) -> T {
        match self.try_get() {
            Ok(Some(value)) => value,
            Ok(None) => self.default.clone(),
            Err(err) => {
                warn!(key = %self.key, %err, "stored value unreadable; using default");
                self.default.clone()
            }
        }
    }

    fn try_get(&self) -> Result<Option<T>> {
        let Some(storage) = &self.storage else {
            return Ok(None);
        };
        match storage.get(&self.key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Persist `value`. Returns false (and logs) if it could not be written.
    pub fn set(&self, value: &T) -> bool {
        let Some(storage) = &self.storage else {
            warn!(key = %self.key, "no storage backend; value not persisted");
            return false;
        };
        let written = serde_json::to_string(value)
            .map_err(Into::into)
            .and_then(|raw| storage.set(&self.key, raw));
        match written {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %self.key, %err, "failed to persist value");
                false
            }
        }
    }

    pub fn remove(&self) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        match storage.remove(&self.key) {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %self.key, %err, "failed to remove stored value");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct Broken;

    impl Storage for Broken {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Err(Error::Storage {
                key: key.to_owned(),
                message: "offline".into(),
            })
        }
        fn set(&self, key: &str, _value: String) -> Result<()> {
            self.get(key).map(|_| ())
        }
        fn remove(&self, key: &str) -> Result<()> {
            self.get(key).map(|_| ())
        }
    }

    #[test]
    fn round_trips_through_memory() {
        let backend: Rc<dyn Storage> = Rc::new(MemoryStorage::new());
        let volume = Stored::new(Some(Rc::clone(&backend)), "volume", 5u8);
        assert_eq!(volume.get(), 5);
        assert!(volume.set(&9));
        assert_eq!(Stored::new(Some(backend), "volume", 0u8).get(), 9);
        assert!(volume.remove());
        assert_eq!(volume.get(), 5);
    }

    #[test]
    fn failures_fall_back() {
        let broken = Stored::new(Some(Rc::new(Broken) as Rc<dyn Storage>), "k", vec![1, 2]);
        assert_eq!(broken.get(), vec![1, 2]);
        assert!(!broken.set(&vec![3]));

        let unbacked = Stored::new(None, "k", String::from("x"));
        assert_eq!(unbacked.get(), "x");
        assert!(!unbacked.set(&String::from("y")));
    }

    #[test]
    fn undecodable_payload_uses_default() {
        let backend = Rc::new(MemoryStorage::new());
        backend.set("n", "not json".into()).unwrap();
        let stored = Stored::new(Some(backend as Rc<dyn Storage>), "n", 7u32);
        assert_eq!(stored.get(), 7);
    }

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Window {
        width: u16,
        maximized: bool,
    }

    #[test]
    fn structs_persist_as_json() {
        let backend = Rc::new(MemoryStorage::new());
        let stored = Stored::new(
            Some(Rc::clone(&backend) as Rc<dyn Storage>),
            "window",
            Window { width: 80, maximized: false },
        );
        assert!(stored.set(&Window { width: 120, maximized: true }));
        assert_eq!(
            backend.get("window").unwrap().as_deref(),
            Some(r#"{"width":120,"maximized":true}"#)
        );
        assert_eq!(stored.get(), Window { width: 120, maximized: true });
    }
}
