use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("liftlog"))
        } else {
            ProjectDirs::from("", "", "liftlog").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("liftlog.db"))
    }

    /// Local safety copy refreshed after every change to the session log
    pub fn backup_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("backup.json"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_state_dir() {
        let Some(state) = AppDirs::state_dir() else {
            return;
        };
        assert!(state.ends_with("liftlog"));
        assert_eq!(AppDirs::db_path().unwrap(), state.join("liftlog.db"));
        assert_eq!(AppDirs::backup_path().unwrap(), state.join("backup.json"));
        assert_eq!(AppDirs::log_dir().unwrap(), state.join("logs"));
    }
}
