//! JSON export/import of the whole store plus the local safety backup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::plan::PlanRow;
use crate::session::SessionRecord;
use crate::store::{Store, StoreError};
use crate::util::new_id;

pub const SCHEMA_VERSION: u32 = 3;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("invalid JSON file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing config/sessions in import")]
    MissingSections,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub schema: u32,
    pub exported_at: String,
    pub config: Vec<PlanRow>,
    pub sessions: Vec<SessionRecord>,
}

impl ExportPayload {
    pub fn from_store(store: &Store) -> Result<Self, BackupError> {
        Ok(Self {
            schema: SCHEMA_VERSION,
            exported_at: Utc::now().to_rfc3339(),
            config: store.plan_rows()?,
            sessions: store.sessions()?,
        })
    }

    /// Parse an import file. Both sections must be present; blank ids are
    /// replaced with fresh ones.
    pub fn parse(text: &str) -> Result<Self, BackupError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let has = |key: &str| value.get(key).is_some_and(|v| !v.is_null());
        if !has("config") || !has("sessions") {
            return Err(BackupError::MissingSections);
        }

        let mut payload = Self {
            schema: value
                .get("schema")
                .and_then(|v| v.as_u64())
                .map_or(SCHEMA_VERSION, |v| v as u32),
            exported_at: value
                .get("exportedAt")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            config: serde_json::from_value(value["config"].clone())?,
            sessions: serde_json::from_value(value["sessions"].clone())?,
        };
        for row in payload.config.iter_mut().filter(|r| r.id.is_empty()) {
            row.id = new_id();
        }
        for session in payload.sessions.iter_mut().filter(|s| s.id.is_empty()) {
            session.id = new_id();
        }
        Ok(payload)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), BackupError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Write the whole store to `path`
pub fn export_to(store: &Store, path: &Path) -> Result<ExportPayload, BackupError> {
    let payload = ExportPayload::from_store(store)?;
    payload.write_to(path)?;
    info!(path = %path.display(), sessions = payload.sessions.len(), "exported");
    Ok(payload)
}

/// Overwrite plan and sessions with the contents of `path`
pub fn import_from(store: &mut Store, path: &Path) -> Result<ExportPayload, BackupError> {
    let payload = ExportPayload::parse(&fs::read_to_string(path)?)?;
    store.replace_all(&payload.config, &payload.sessions)?;
    info!(
        path = %path.display(),
        plan_rows = payload.config.len(),
        sessions = payload.sessions.len(),
        "imported"
    );
    Ok(payload)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStatus {
    Missing,
    Corrupt,
    SavedAt(Option<DateTime<Utc>>),
}

/// Safety copy of the store kept next to the database
#[derive(Debug, Clone)]
pub struct LocalBackup {
    path: PathBuf,
}

impl LocalBackup {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Option<Self> {
        AppDirs::backup_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the backup from the store. Failures are logged, never fatal.
    pub fn refresh(&self, store: &Store) -> bool {
        match ExportPayload::from_store(store).and_then(|p| p.write_to(&self.path)) {
            Ok(()) => true,
            Err(e) => {
                warn!("local backup failed: {e}");
                false
            }
        }
    }

    pub fn status(&self) -> BackupStatus {
        let Ok(text) = fs::read_to_string(&self.path) else {
            return BackupStatus::Missing;
        };
        match serde_json::from_str::<ExportPayload>(&text) {
            Ok(payload) => BackupStatus::SavedAt(
                DateTime::parse_from_rfc3339(&payload.exported_at)
                    .ok()
                    .map(|t| t.with_timezone(&Utc)),
            ),
            Err(_) => BackupStatus::Corrupt,
        }
    }

    /// Copy the latest backup to `dest`
    pub fn copy_to(&self, dest: &Path) -> Result<(), BackupError> {
        let payload = ExportPayload::parse(&fs::read_to_string(&self.path)?)?;
        payload.write_to(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn store_with_session() -> Store {
        let mut store = Store::open_in_memory().unwrap();
        store.ensure_default_plan().unwrap();
        store
            .put_session(&SessionRecord {
                id: "s1".into(),
                date_iso: "2024-05-01".into(),
                workout: "Workout 1 – Full Body".into(),
                comment: "ok".into(),
                items: Vec::new(),
                created_at: "2024-05-01T10:00:00Z".into(),
                total_time_ms: Some(6_000),
            })
            .unwrap();
        store
    }

    #[test]
    fn test_parse_requires_both_sections() {
        assert_matches!(ExportPayload::parse(r#"{"config":[]}"#), Err(BackupError::MissingSections));
        assert_matches!(
            ExportPayload::parse(r#"{"config":null,"sessions":[]}"#),
            Err(BackupError::MissingSections)
        );
        assert_matches!(ExportPayload::parse("not json"), Err(BackupError::Json(_)));
    }

    #[test]
    fn test_parse_fills_blank_ids() {
        let payload = ExportPayload::parse(
            r#"{"config":[{"id":"","exercise":"Plank","workout":"Core","sets":3,"type":"Other","restMin":1}],
                "sessions":[{"dateISO":"2024-01-01","workout":"Core"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.config[0].id.len(), 32);
        assert_eq!(payload.sessions[0].id.len(), 32);
        assert_eq!(payload.schema, SCHEMA_VERSION);
    }

    #[test]
    fn test_export_then_import_into_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let source = store_with_session();

        let exported = export_to(&source, &path).unwrap();
        assert_eq!(exported.schema, 3);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"exportedAt\""));
        assert!(text.contains("\"totalTimeMs\": 6000"));

        let mut target = Store::open_in_memory().unwrap();
        import_from(&mut target, &path).unwrap();
        assert_eq!(target.plan_rows().unwrap().len(), 17);
        assert_eq!(target.sessions().unwrap()[0].comment, "ok");
    }

    #[test]
    fn test_local_backup_status() {
        let dir = tempfile::tempdir().unwrap();
        let backup = LocalBackup::new(dir.path().join("backup.json"));
        assert_eq!(backup.status(), BackupStatus::Missing);

        assert!(backup.refresh(&store_with_session()));
        assert_matches!(backup.status(), BackupStatus::SavedAt(Some(_)));

        fs::write(backup.path(), "{").unwrap();
        assert_eq!(backup.status(), BackupStatus::Corrupt);
    }

    #[test]
    fn test_copy_backup_out() {
        let dir = tempfile::tempdir().unwrap();
        let backup = LocalBackup::new(dir.path().join("backup.json"));
        backup.refresh(&store_with_session());

        let dest = dir.path().join("copy.json");
        backup.copy_to(&dest).unwrap();
        let copied = ExportPayload::parse(&fs::read_to_string(dest).unwrap()).unwrap();
        assert_eq!(copied.sessions.len(), 1);
    }
}
