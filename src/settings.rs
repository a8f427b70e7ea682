use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SERVER_URL_KEY: &str = "ServerUrl";

/// Host key/value storage that survives restarts.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str);

    /// Flushes pending writes to durable storage.
    fn save(&mut self) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
    saves: usize,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}

/// Settings kept as a flat JSON object on disk.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
    dirty: bool,
}

impl JsonFileSettings {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let bytes = fs::read(&path)
                .with_context(|| format!("Failed to read settings file {}", path.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse settings file {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values, dirty: false })
    }

    /// Opens the file, starting empty if it is unreadable.
    pub fn open_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => store,
            Err(err) => {
                log::warn!("[settings] {err:?}. Starting with empty settings.");
                Self { path: path.to_path_buf(), values: BTreeMap::new(), dirty: false }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        if self.values.get(key).map(String::as_str) != Some(value) {
            self.values.insert(key.to_string(), value.to_string());
            self.dirty = true;
        }
    }

    fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating settings directory '{}'", parent.display()))?;
            }
        }
        let json = serde_json::to_vec_pretty(&self.values).context("serializing settings")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings file {}", self.path.display()))?;
        self.dirty = false;
        log::debug!("[settings] saved {}", self.path.display());
        Ok(())
    }
}
