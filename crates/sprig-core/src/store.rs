//! SQLite persistence adapter for the task ledger.
//!
//! The ledger treats this as an opaque record store with replace
//! semantics: a full-table read on load, a transactional full-table
//! replace on commit. Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while a writer runs
//! - `busy_timeout = 5s` to reduce transient lock failures
//! - `foreign_keys = ON` for relational integrity
//!
//! Rows that fail structural validation on load (malformed meta JSON,
//! unknown enum value, blank name, unparseable timestamp) are dropped,
//! never partially materialized; the drop count is reported to the
//! caller and logged.

use crate::ledger::LoadReport;
use crate::model::task::{Status, TaskId, TaskKind, TaskMeta, TaskRecord};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::{path::Path, time::Duration};
use tracing::{info, warn};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wraps the SQLite connection holding the `tasks` table.
pub struct TaskStore {
    conn: Connection,
}

impl TaskStore {
    /// Open (or create) the task store at `path`, apply runtime pragmas,
    /// and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns an error if opening or configuring the database fails.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open task store {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// In-memory store, used by tests and ephemeral sessions.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory().context("open in-memory task store")?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        configure_connection(&conn).context("configure sqlite pragmas")?;
        ensure_schema(&conn).context("create task store schema")?;
        Ok(Self { conn })
    }

    /// Full-table read. Invalid rows are dropped with a diagnostic count.
    ///
    /// # Errors
    ///
    /// Returns an error only when the table itself cannot be read;
    /// per-row damage is reported, not fatal.
    pub fn load_all(&self) -> Result<(Vec<TaskRecord>, LoadReport)> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, status, kind, meta, created_at FROM tasks")
            .context("prepare task load query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RawRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    status: row.get(2)?,
                    kind: row.get(3)?,
                    meta: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .context("execute task load query")?;

        let mut records = Vec::new();
        let mut report = LoadReport::default();
        for row in rows {
            let raw = row.context("read task row")?;
            match parse_row(raw) {
                Ok(record) => {
                    records.push(record);
                    report.loaded += 1;
                }
                Err(err) => {
                    warn!(error = %err, "dropping malformed task row");
                    report.dropped += 1;
                }
            }
        }

        Ok((records, report))
    }

    /// Replace the whole table with `records` in one transaction. This is
    /// the only commit path; last writer wins at full-table granularity.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; on failure the previous
    /// contents remain intact.
    pub fn replace_all<'a, I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a TaskRecord>,
    {
        let tx = self.conn.transaction().context("begin replace transaction")?;
        tx.execute("DELETE FROM tasks", [])
            .context("clear tasks table")?;

        let mut written = 0usize;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO tasks (id, name, status, kind, meta, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .context("prepare task insert")?;
            for record in records {
                let meta_json =
                    serde_json::to_string(&record.meta).context("serialize task meta")?;
                stmt.execute(params![
                    record.id.as_str(),
                    record.name,
                    i64::from(record.status.is_done()),
                    record.kind.to_string(),
                    meta_json,
                    record.created_at.to_rfc3339(),
                ])
                .with_context(|| format!("insert task {}", record.id))?;
                written += 1;
            }
        }

        tx.commit().context("commit replace transaction")?;
        info!(written, "replaced task table");
        Ok(written)
    }

    /// Copy the live table into the backup snapshot, replacing any
    /// previous snapshot.
    pub fn backup(&mut self) -> Result<usize> {
        let tx = self.conn.transaction().context("begin backup transaction")?;
        tx.execute("DELETE FROM tasks_backup", [])
            .context("clear backup table")?;
        let copied = tx
            .execute("INSERT INTO tasks_backup SELECT * FROM tasks", [])
            .context("copy tasks into backup")?;
        tx.commit().context("commit backup transaction")?;
        info!(copied, "backed up task table");
        Ok(copied)
    }

    /// Replace the live table with the backup snapshot.
    ///
    /// # Errors
    ///
    /// Fails if no backup snapshot exists.
    pub fn restore(&mut self) -> Result<usize> {
        let snapshot_rows: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks_backup", [], |row| row.get(0))
            .context("count backup rows")?;
        if snapshot_rows == 0 {
            return Err(anyhow!("no backup snapshot exists"));
        }

        let tx = self
            .conn
            .transaction()
            .context("begin restore transaction")?;
        tx.execute("DELETE FROM tasks", [])
            .context("clear tasks table")?;
        let restored = tx
            .execute("INSERT INTO tasks SELECT * FROM tasks_backup", [])
            .context("copy backup into tasks")?;
        tx.commit().context("commit restore transaction")?;
        info!(restored, "restored task table from backup");
        Ok(restored)
    }
}

struct RawRow {
    id: String,
    name: String,
    status: i64,
    kind: String,
    meta: String,
    created_at: String,
}

fn parse_row(raw: RawRow) -> Result<TaskRecord> {
    let status = match raw.status {
        0 => Status::Open,
        1 => Status::Done,
        other => return Err(anyhow!("invalid status flag {other}")),
    };
    let kind: TaskKind = raw
        .kind
        .parse()
        .map_err(|err| anyhow!("{err}"))
        .context("parse task kind")?;
    let meta: TaskMeta = serde_json::from_str(&raw.meta).context("parse task meta JSON")?;
    let created_at = DateTime::parse_from_rfc3339(&raw.created_at)
        .context("parse created_at timestamp")?
        .with_timezone(&Utc);

    let record = TaskRecord {
        id: TaskId::from(raw.id),
        name: raw.name,
        status,
        kind,
        meta,
        created_at,
    };
    record.validate().map_err(|err| anyhow!("{err}"))?;
    Ok(record)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            status INTEGER NOT NULL DEFAULT 0,
            kind TEXT NOT NULL,
            meta TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks_backup (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            status INTEGER NOT NULL DEFAULT 0,
            kind TEXT NOT NULL,
            meta TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        ",
    )
}
