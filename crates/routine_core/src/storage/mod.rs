//! Key-value backends the routine snapshot is mirrored into.

use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub mod file;
pub mod persist;

pub use file::{AsyncFileBackend, FileBackend, store_dir};

/// Synchronous string store, in the shape of browser local storage.
pub trait KeyValueBackend {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Asynchronous string store, in the shape of mobile async storage.
#[async_trait]
pub trait AsyncKeyValueBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// In-process backend. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> Result<T, AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::io("memory backend lock poisoned"))?;
        Ok(f(&mut entries))
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }
}

#[async_trait]
impl AsyncKeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        KeyValueBackend::get(self, key)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        KeyValueBackend::set(self, key, value)
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        KeyValueBackend::remove(self, key)
    }
}
