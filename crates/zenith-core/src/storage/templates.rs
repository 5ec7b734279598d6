//! Timer template store.
//!
//! Built-in templates are compiled in; user templates live in
//! `timers.json` next to `config.toml`. The sequencer never reads this
//! store directly: callers look a configuration up and `bind` it.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::data_dir;
use crate::error::{Result, StorageError};
use crate::timer::TimerConfiguration;

/// Supplies timer configurations by id.
pub trait ConfigurationSource {
    fn configuration(&self, id: &str) -> Result<Option<TimerConfiguration>>;
    fn configurations(&self) -> Result<Vec<TimerConfiguration>>;
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    /// Open the store in the application data directory.
    pub fn open() -> Result<Self> {
        Ok(Self::at(data_dir()?.join("timers.json")))
    }

    /// Use an explicit file, e.g. in tests.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Built-in templates first, then custom ones in insertion order.
    pub fn list(&self) -> Result<Vec<TimerConfiguration>> {
        let mut all = TimerConfiguration::builtin_templates();
        all.extend(self.read_custom()?);
        Ok(all)
    }

    pub fn get(&self, id: &str) -> Result<TimerConfiguration> {
        self.list()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()).into())
    }

    /// Validate and store a custom template.
    ///
    /// An empty id gets a fresh UUID; an existing custom id is replaced.
    pub fn save(&self, mut configuration: TimerConfiguration) -> Result<TimerConfiguration> {
        configuration.validate()?;
        if configuration.id.trim().is_empty() {
            configuration.id = Uuid::new_v4().to_string();
        }
        if TimerConfiguration::builtin(&configuration.id).is_some() {
            return Err(StorageError::BuiltinReadOnly(configuration.id).into());
        }
        configuration.is_custom = Some(true);

        let mut custom = self.read_custom()?;
        match custom.iter_mut().find(|t| t.id == configuration.id) {
            Some(existing) => *existing = configuration.clone(),
            None => custom.push(configuration.clone()),
        }
        self.write_custom(&custom)?;
        tracing::info!(id = %configuration.id, "saved timer template");
        Ok(configuration)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        if TimerConfiguration::builtin(id).is_some() {
            return Err(StorageError::BuiltinReadOnly(id.to_string()).into());
        }
        let mut custom = self.read_custom()?;
        let before = custom.len();
        custom.retain(|t| t.id != id);
        if custom.len() == before {
            return Err(StorageError::NotFound(id.to_string()).into());
        }
        self.write_custom(&custom)
    }

    fn read_custom(&self) -> Result<Vec<TimerConfiguration>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&content).map_err(|e| {
            StorageError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn write_custom(&self, custom: &[TimerConfiguration]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(custom)?)?;
        Ok(())
    }
}

impl ConfigurationSource for TemplateStore {
    fn configuration(&self, id: &str) -> Result<Option<TimerConfiguration>> {
        Ok(self.list()?.into_iter().find(|t| t.id == id))
    }

    fn configurations(&self) -> Result<Vec<TimerConfiguration>> {
        self.list()
    }
}
