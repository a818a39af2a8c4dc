//! SQLite-backed storage for the workout plan and the session log.
//!
//! Rows are kept as JSON bodies next to the few columns we sort on, so the
//! stored shape matches the export format one to one.

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::app_dirs::AppDirs;
use crate::plan::{default_plan, renumber, PlanRow};
use crate::session::SessionRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no state directory available")]
    NoStateDir,
}

pub type Result<T> = std::result::Result<T, StoreError>;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS plan_rows (
        id TEXT PRIMARY KEY,
        workout TEXT NOT NULL,
        sort_order INTEGER,
        body TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        date_iso TEXT NOT NULL,
        workout TEXT NOT NULL,
        created_at TEXT NOT NULL,
        body TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_plan_rows_workout ON plan_rows(workout, sort_order);
    CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date_iso, created_at);
"#;

#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the database at the default state location
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().ok_or(StoreError::NoStateDir)?;
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "store opened");
        Ok(Store { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    /// Seed the default plan on first run. Returns true when seeded.
    pub fn ensure_default_plan(&mut self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM plan_rows", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(false);
        }
        self.replace_plan(&default_plan())?;
        info!("seeded default workout plan");
        Ok(true)
    }

    pub fn plan_rows(&self) -> Result<Vec<PlanRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT body FROM plan_rows ORDER BY workout, sort_order IS NULL, sort_order, rowid",
        )?;
        let bodies = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut rows = Vec::new();
        for body in bodies {
            rows.push(serde_json::from_str(&body?)?);
        }
        Ok(rows)
    }

    pub fn replace_plan(&mut self, rows: &[PlanRow]) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_plan(&tx, rows)?;
        tx.commit()?;
        Ok(())
    }

    pub fn reset_plan_to_defaults(&mut self) -> Result<()> {
        self.replace_plan(&default_plan())?;
        info!("workout plan reset to defaults");
        Ok(())
    }

    /// Insert or overwrite one session
    pub fn put_session(&self, session: &SessionRecord) -> Result<()> {
        insert_session(&self.conn, session)?;
        debug!(id = %session.id, "session stored");
        Ok(())
    }

    pub fn session(&self, id: &str) -> Result<Option<SessionRecord>> {
        let body: Option<String> = self
            .conn
            .query_row("SELECT body FROM sessions WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
    }

    /// All sessions, newest date first, then newest entry first
    pub fn sessions(&self) -> Result<Vec<SessionRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM sessions ORDER BY date_iso DESC, created_at DESC")?;
        let bodies = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut sessions = Vec::new();
        for body in bodies {
            sessions.push(serde_json::from_str(&body?)?);
        }
        Ok(sessions)
    }

    /// Returns false when no session had that id
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
        Ok(n > 0)
    }

    pub fn delete_all_sessions(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM sessions", [])?)
    }

    /// Overwrite both tables in one transaction
    pub fn replace_all(&mut self, plan: &[PlanRow], sessions: &[SessionRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_plan(&tx, plan)?;
        tx.execute("DELETE FROM sessions", [])?;
        for session in sessions {
            insert_session(&tx, session)?;
        }
        tx.commit()?;
        info!(plan_rows = plan.len(), sessions = sessions.len(), "store replaced");
        Ok(())
    }
}

fn write_plan(tx: &Transaction<'_>, rows: &[PlanRow]) -> Result<()> {
    tx.execute("DELETE FROM plan_rows", [])?;
    for row in renumber(rows.to_vec()) {
        tx.execute(
            "INSERT OR REPLACE INTO plan_rows (id, workout, sort_order, body) VALUES (?1, ?2, ?3, ?4)",
            params![row.id, row.workout, row.sort_order, serde_json::to_string(&row)?],
        )?;
    }
    Ok(())
}

fn insert_session(conn: &Connection, session: &SessionRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO sessions (id, date_iso, workout, created_at, body)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            session.id,
            session.date_iso,
            session.workout,
            session.created_at,
            serde_json::to_string(session)?,
        ],
    )?;
    Ok(())
}
