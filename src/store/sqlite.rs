use std::path::Path;

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Backend, SettingsStore, TaskRepository};
use crate::error::PlanResult;
use crate::model::{ListType, NewTask, Settings, Task, TaskId, TaskUpdate};

const TASK_COLUMNS: &str = "id, title, time, list_type, owner_id, created_at";

/// Durable backend on top of a SQLite journal file.
pub struct SqliteStore {
    db: Connection,
}

impl SqliteStore {
    /// Open the journal at `path`, creating the file and its tables if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> PlanResult<SqliteStore> {
        debug!("opening journal {}", path.as_ref().display());
        SqliteStore::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> PlanResult<SqliteStore> {
        SqliteStore::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(db: Connection) -> PlanResult<SqliteStore> {
        init_journal(&db)?;
        Ok(SqliteStore { db })
    }

    fn task_by_id(&self, id: TaskId) -> PlanResult<Option<Task>> {
        let task = self
            .db
            .query_row(
                &format!("SELECT {} FROM task WHERE id = ?1", TASK_COLUMNS),
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }
}

/// Create the journal tables. Safe to run on an existing journal.
pub fn init_journal(db: &Connection) -> rusqlite::Result<()> {
    db.execute_batch(
        "CREATE TABLE IF NOT EXISTS task (
                  id              INTEGER PRIMARY KEY AUTOINCREMENT,
                  title           TEXT NOT NULL,
                  time            INTEGER NOT NULL CHECK (time > 0),
                  list_type       TEXT NOT NULL CHECK (list_type IN ('today', 'backlog')),
                  owner_id        TEXT NOT NULL,
                  created_at      TEXT NOT NULL
                  );
         CREATE INDEX IF NOT EXISTS task_owner ON task (owner_id);
         CREATE TABLE IF NOT EXISTS settings (
                  id              INTEGER PRIMARY KEY AUTOINCREMENT,
                  owner_id        TEXT NOT NULL UNIQUE,
                  daily_limit     INTEGER NOT NULL DEFAULT 240 CHECK (daily_limit > 0)
                  );",
    )
}

/// Return a task from a row in this order: [id, title, time, list_type,
/// owner_id, created_at]
fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        time: row.get::<_, u32>(2)?,
        list_type: row.get::<_, ListType>(3)?,
        owner_id: row.get(4)?,
        created_at: row.get::<_, DateTime<Utc>>(5)?,
    })
}

fn settings_from_row(row: &Row) -> rusqlite::Result<Settings> {
    Ok(Settings {
        owner_id: row.get(0)?,
        daily_limit_minutes: row.get::<_, u32>(1)?,
    })
}

impl ToSql for ListType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ListType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

impl TaskRepository for SqliteStore {
    fn list(&self, owner_id: &str) -> PlanResult<Vec<Task>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM task WHERE owner_id = ?1 ORDER BY id",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map(params![owner_id], task_from_row)?
            .collect::<rusqlite::Result<Vec<Task>>>()?;
        Ok(tasks)
    }

    fn create(&mut self, task: NewTask) -> PlanResult<Task> {
        self.db.execute(
            "INSERT INTO task (title, time, list_type, owner_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![task.title, task.time, task.list_type, task.owner_id, Utc::now()],
        )?;
        let id = self.db.last_insert_rowid();
        self.task_by_id(id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
            .map_err(Into::into)
    }

    fn update(&mut self, id: TaskId, changes: &TaskUpdate) -> PlanResult<Option<Task>> {
        let changed = self.db.execute(
            "UPDATE task SET time = COALESCE(?1, time), list_type = COALESCE(?2, list_type) WHERE id = ?3",
            params![changes.time, changes.list_type, id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.task_by_id(id)
    }

    fn delete(&mut self, id: TaskId) -> PlanResult<bool> {
        let deleted = self
            .db
            .execute("DELETE FROM task WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn delete_all_for_owner(&mut self, owner_id: &str) -> PlanResult<usize> {
        let deleted = self
            .db
            .execute("DELETE FROM task WHERE owner_id = ?1", params![owner_id])?;
        Ok(deleted)
    }
}

impl SettingsStore for SqliteStore {
    fn get(&self, owner_id: &str) -> PlanResult<Option<Settings>> {
        let settings = self
            .db
            .query_row(
                "SELECT owner_id, daily_limit FROM settings WHERE owner_id = ?1",
                params![owner_id],
                settings_from_row,
            )
            .optional()?;
        Ok(settings)
    }

    fn get_or_create(&mut self, owner_id: &str, default_limit: u32) -> PlanResult<Settings> {
        self.db.execute(
            "INSERT OR IGNORE INTO settings (owner_id, daily_limit) VALUES (?1, ?2)",
            params![owner_id, default_limit],
        )?;
        self.get(owner_id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
            .map_err(Into::into)
    }

    fn update_limit(&mut self, owner_id: &str, daily_limit: u32) -> PlanResult<Option<Settings>> {
        let changed = self.db.execute(
            "UPDATE settings SET daily_limit = ?1 WHERE owner_id = ?2",
            params![daily_limit, owner_id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get(owner_id)
    }
}

impl Backend for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }
}
