//! CRUD operations for [`Task`] records and per-account completions.

use chrono::{DateTime, Utc};
use hoard_core::Task;
use rusqlite::params;
use uuid::Uuid;

use crate::convert::{parse_datetime, parse_uuid};
use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Insert a new task.
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.conn().execute(
            "INSERT INTO tasks (id, title, points, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                task.id.to_string(),
                task.title,
                task.points,
                task.is_active,
                task.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a single task by UUID.
    pub fn get_task(&self, id: Uuid) -> Result<Task> {
        self.conn()
            .query_row(
                "SELECT id, title, points, is_active, created_at
                 FROM tasks
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_task,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Persist a task's mutable fields.
    pub fn update_task(&self, task: &Task) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE tasks SET title = ?2, points = ?3, is_active = ?4 WHERE id = ?1",
            params![
                task.id.to_string(),
                task.title,
                task.points,
                task.is_active,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// All active tasks, oldest first.
    pub fn list_active_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, title, points, is_active, created_at
             FROM tasks
             WHERE is_active = 1
             ORDER BY created_at ASC",
        )?;
        self.collect_tasks(&mut stmt, [])
    }

    /// Active tasks the account has not completed yet, oldest first.
    pub fn list_open_tasks_for(&self, account_id: Uuid) -> Result<Vec<Task>> {
        let mut stmt = self.conn().prepare(
            "SELECT t.id, t.title, t.points, t.is_active, t.created_at
             FROM tasks t
             WHERE t.is_active = 1
               AND NOT EXISTS (
                   SELECT 1 FROM task_completions c
                   WHERE c.task_id = t.id AND c.account_id = ?1
               )
             ORDER BY t.created_at ASC",
        )?;
        self.collect_tasks(&mut stmt, params![account_id.to_string()])
    }

    /// Tasks the account has completed, in completion order.
    pub fn list_completed_tasks(&self, account_id: Uuid) -> Result<Vec<Task>> {
        let mut stmt = self.conn().prepare(
            "SELECT t.id, t.title, t.points, t.is_active, t.created_at
             FROM tasks t
             JOIN task_completions c ON c.task_id = t.id
             WHERE c.account_id = ?1
             ORDER BY c.completed_at ASC",
        )?;
        self.collect_tasks(&mut stmt, params![account_id.to_string()])
    }

    fn collect_tasks(
        &self,
        stmt: &mut rusqlite::Statement<'_>,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Task>> {
        let rows = stmt.query_map(params, row_to_task)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Whether the account has completed the task.
    pub fn has_completed_task(&self, account_id: Uuid, task_id: Uuid) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM task_completions WHERE account_id = ?1 AND task_id = ?2",
            params![account_id.to_string(), task_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record a completion.
    pub fn insert_task_completion(
        &self,
        account_id: Uuid,
        task_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO task_completions (account_id, task_id, completed_at)
             VALUES (?1, ?2, ?3)",
            params![
                account_id.to_string(),
                task_id.to_string(),
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// How many active tasks the account has completed.
    pub fn count_completed_active_tasks(&self, account_id: Uuid) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM task_completions c
             JOIN tasks t ON t.id = c.task_id
             WHERE c.account_id = ?1 AND t.is_active = 1",
            params![account_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Total number of active tasks.
    pub fn count_active_tasks(&self) -> Result<i64> {
        let count =
            self.conn()
                .query_row("SELECT COUNT(*) FROM tasks WHERE is_active = 1", [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }
}

/// Map a `rusqlite::Row` to a [`Task`].
fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(4)?;

    Ok(Task {
        id: parse_uuid(0, &id)?,
        title: row.get(1)?,
        points: row.get(2)?,
        is_active: row.get(3)?,
        created_at: parse_datetime(4, &created_at)?,
    })
}
