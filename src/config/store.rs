use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed settings document {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key-value persistence used for alert thresholds and enabled types
pub trait SettingsStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Value>, SettingsError>;
    fn save(&self, key: &str, value: Value) -> Result<(), SettingsError>;
}

/// Settings kept as a single JSON object on disk
#[derive(Debug, Clone)]
pub struct JsonFileSettings {
    path: PathBuf,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>, SettingsError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SettingsError::Malformed {
                path: self.path.clone(),
                reason: "top-level value is not an object".to_string(),
            }),
            Err(e) => Err(SettingsError::Malformed {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

impl SettingsStore for JsonFileSettings {
    fn load(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.read_document()?.remove(key))
    }

    fn save(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        // A corrupt document is replaced rather than blocking every save
        let mut document = self.read_document().unwrap_or_default();
        document.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(&Value::Object(document))?;
        fs::write(&self.path, contents).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-process settings
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: Value) -> Self {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }
}
