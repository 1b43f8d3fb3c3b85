//! Key-Value Storage
//!
//! The extension persists two flat JSON objects: a *sync* scope for user
//! settings and a *local* scope for operational counters. The host mirrors that
//! model behind an async trait so quota and settings logic never touch files
//! directly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_dir;

/// Storage scope, matching the browser's `storage.sync` / `storage.local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Sync,
    Local,
}

impl Scope {
    fn file_name(&self) -> &'static str {
        match self {
            Scope::Sync => "sync.json",
            Scope::Local => "local.json",
        }
    }
}

/// Async key-value storage with two scopes.
///
/// Missing keys are simply absent from the returned map.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_many(&self, scope: Scope, keys: &[&str]) -> AppResult<Map<String, Value>>;

    async fn set_many(&self, scope: Scope, values: Map<String, Value>) -> AppResult<()>;

    async fn get(&self, scope: Scope, key: &str) -> AppResult<Option<Value>> {
        let mut values = self.get_many(scope, &[key]).await?;
        Ok(values.remove(key))
    }

    async fn set(&self, scope: Scope, key: &str, value: Value) -> AppResult<()> {
        let mut values = Map::new();
        values.insert(key.to_string(), value);
        self.set_many(scope, values).await
    }
}

fn pick(source: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|k| source.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// In-process store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scopes: RwLock<HashMap<Scope, Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_many(&self, scope: Scope, keys: &[&str]) -> AppResult<Map<String, Value>> {
        let scopes = self.scopes.read().await;
        Ok(scopes.get(&scope).map(|m| pick(m, keys)).unwrap_or_default())
    }

    async fn set_many(&self, scope: Scope, values: Map<String, Value>) -> AppResult<()> {
        let mut scopes = self.scopes.write().await;
        scopes.entry(scope).or_default().extend(values);
        Ok(())
    }
}

/// One pretty-printed JSON file per scope under `dir`, written through on
/// every update.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    cache: Mutex<HashMap<Scope, Map<String, Value>>>,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, scope: Scope) -> PathBuf {
        self.dir.join(scope.file_name())
    }

    async fn load(&self, scope: Scope) -> AppResult<Map<String, Value>> {
        let path = self.path_for(scope);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Ok(Map::new()),
            Ok(content) => match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => Ok(map),
                _ => Err(AppError::storage(format!(
                    "{} does not contain a JSON object",
                    path.display()
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, scope: Scope, values: &Map<String, Value>) -> AppResult<()> {
        let path = self.path_for(scope);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(values)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get_many(&self, scope: Scope, keys: &[&str]) -> AppResult<Map<String, Value>> {
        let mut cache = self.cache.lock().await;
        if !cache.contains_key(&scope) {
            let loaded = self.load(scope).await?;
            cache.insert(scope, loaded);
        }
        Ok(cache.get(&scope).map(|m| pick(m, keys)).unwrap_or_default())
    }

    /// The cached map only changes once the file write has landed, so a
    /// failed write leaves reads agreeing with disk.
    async fn set_many(&self, scope: Scope, values: Map<String, Value>) -> AppResult<()> {
        let mut cache = self.cache.lock().await;
        let mut current = match cache.get(&scope) {
            Some(current) => current.clone(),
            None => self.load(scope).await?,
        };
        current.extend(values);
        self.persist(scope, &current).await?;
        cache.insert(scope, current);
        Ok(())
    }
}
