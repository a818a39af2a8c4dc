use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How a finished rest countdown announces itself
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompletionMode {
    Sound,
    Vibrate,
    Both,
    Banner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    pub completion_duration_sec: f64,
    pub completion_mode: CompletionMode,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            completion_duration_sec: 2.0,
            completion_mode: CompletionMode::Both,
        }
    }
}

impl NotificationSettings {
    /// Duration clamped to a usable value; `None` means notifications are off
    pub fn completion_duration_ms(&self) -> Option<u64> {
        let secs = self.completion_duration_sec;
        if secs.is_finite() && secs > 0.0 {
            Some((secs * 1000.0).round() as u64)
        } else {
            None
        }
    }
}

pub trait SettingsStore {
    fn load(&self) -> NotificationSettings;
    fn save(&self, settings: &NotificationSettings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "liftlog") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("liftlog_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> NotificationSettings {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<NotificationSettings>(&bytes) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "ignoring unreadable settings: {e}");
                    NotificationSettings::default()
                }
            },
            Err(_) => NotificationSettings::default(),
        }
    }

    fn save(&self, settings: &NotificationSettings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)?;
        tracing::info!(mode = %settings.completion_mode, secs = settings.completion_duration_sec, "notification settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("config.json"));
        let settings = NotificationSettings::default();
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("nested/deeper/config.json"));
        let settings = NotificationSettings {
            completion_duration_sec: 0.5,
            completion_mode: CompletionMode::Banner,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_or_corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileSettingsStore::with_path(&path);
        assert_eq!(store.load(), NotificationSettings::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), NotificationSettings::default());
    }

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_string(&CompletionMode::Vibrate).unwrap();
        assert_eq!(json, "\"vibrate\"");
        assert_eq!(CompletionMode::Both.to_string(), "both");
    }

    #[test]
    fn completion_duration_ms_rejects_non_positive() {
        let mut settings = NotificationSettings::default();
        assert_eq!(settings.completion_duration_ms(), Some(2_000));

        settings.completion_duration_sec = 0.0;
        assert_eq!(settings.completion_duration_ms(), None);

        settings.completion_duration_sec = f64::NAN;
        assert_eq!(settings.completion_duration_ms(), None);
    }
}
