use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Cosmetic display preferences, persisted between sessions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cute_mode: bool,
}

/// Storage seam for [`SettingsService`], so the toggle logic is testable
/// without touching the filesystem.
pub trait SettingsBackend: Send + Sync {
    /// Returns the stored payload, or `None` when nothing was ever saved.
    fn load(&self) -> Result<Option<String>>;
    fn store(&self, payload: &str) -> Result<()>;
}

/// JSON-file backend, the real storage used by the CLI and server.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SettingsBackend for FileBackend {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let payload = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;
        Ok(Some(payload))
    }

    fn store(&self, payload: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory: {}", parent.display()))?;
        }
        fs::write(&self.path, payload)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))
    }
}

/// In-memory backend for tests.
#[derive(Default)]
pub struct MemoryBackend {
    payload: Mutex<Option<String>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .payload
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn store(&self, payload: &str) -> Result<()> {
        let mut slot = self
            .payload
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = Some(payload.to_string());
        Ok(())
    }
}

/// Settings with read-once, write-through persistence.
///
/// Loading tolerates a missing or corrupt payload (defaults apply);
/// writes are immediate and their failures surface, with the in-memory
/// value rolled back so state never drifts from storage silently.
pub struct SettingsService {
    backend: Box<dyn SettingsBackend>,
    settings: Settings,
}

impl SettingsService {
    pub fn load(backend: Box<dyn SettingsBackend>) -> Self {
        let settings = match backend.load() {
            Ok(Some(payload)) => serde_json::from_str(&payload).unwrap_or_default(),
            Ok(None) | Err(_) => Settings::default(),
        };
        Self { backend, settings }
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings
    }

    #[must_use]
    pub fn cute_mode(&self) -> bool {
        self.settings.cute_mode
    }

    pub fn set_cute_mode(&mut self, on: bool) -> Result<()> {
        let previous = self.settings;
        self.settings.cute_mode = on;
        if let Err(e) = self.persist() {
            self.settings = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Flip cute mode, returning the new value.
    pub fn toggle_cute_mode(&mut self) -> Result<bool> {
        self.set_cute_mode(!self.settings.cute_mode)?;
        Ok(self.settings.cute_mode)
    }

    fn persist(&self) -> Result<()> {
        let payload =
            serde_json::to_string_pretty(&self.settings).context("Failed to serialize settings")?;
        self.backend.store(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    impl SettingsBackend for FailingBackend {
        fn load(&self) -> Result<Option<String>> {
            anyhow::bail!("backend unreadable")
        }

        fn store(&self, _payload: &str) -> Result<()> {
            anyhow::bail!("backend unwritable")
        }
    }

    #[test]
    fn test_load_defaults_when_nothing_stored() {
        let service = SettingsService::load(Box::new(MemoryBackend::new()));
        assert!(!service.cute_mode());
    }

    #[test]
    fn test_toggle_writes_through() {
        let backend = Box::new(MemoryBackend::new());
        let mut service = SettingsService::load(backend);
        assert!(service.toggle_cute_mode().unwrap());
        assert!(service.cute_mode());
        assert!(!service.toggle_cute_mode().unwrap());
    }

    #[test]
    fn test_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut service = SettingsService::load(Box::new(FileBackend::new(path.clone())));
        service.set_cute_mode(true).unwrap();

        let reloaded = SettingsService::load(Box::new(FileBackend::new(path)));
        assert!(reloaded.cute_mode());
    }

    #[test]
    fn test_corrupt_payload_falls_back_to_defaults() {
        let backend = MemoryBackend::new();
        backend.store("{not json").unwrap();
        let service = SettingsService::load(Box::new(backend));
        assert!(!service.cute_mode());
    }

    #[test]
    fn test_unreadable_backend_falls_back_to_defaults() {
        let service = SettingsService::load(Box::new(FailingBackend));
        assert!(!service.cute_mode());
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let mut service = SettingsService::load(Box::new(FailingBackend));
        assert!(service.set_cute_mode(true).is_err());
        assert!(!service.cute_mode());
    }

    #[test]
    fn test_older_payload_without_fields_parses() {
        let backend = MemoryBackend::new();
        backend.store("{}").unwrap();
        let service = SettingsService::load(Box::new(backend));
        assert!(!service.cute_mode());
    }
}
