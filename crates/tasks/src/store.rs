use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use sqlx::{FromRow, SqlitePool};
use tasklane_auth::UserIdentity;
use tracing::{debug, info};

use crate::{NewTask, Task, TaskError, TaskPatch};

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    public_id: String,
    owner_id: String,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    due_date: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = TaskError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let due_date = row
            .due_date
            .as_deref()
            .map(|value| NaiveDate::parse_from_str(value, DUE_DATE_FORMAT))
            .transpose()
            .map_err(|error| TaskError::Corrupt(format!("task {}: due_date: {error}", row.id)))?;

        Ok(Task {
            status: row.status.parse().map_err(TaskError::Corrupt)?,
            priority: row.priority.parse().map_err(TaskError::Corrupt)?,
            created_at: parse_timestamp(row.id, &row.created_at)?,
            updated_at: parse_timestamp(row.id, &row.updated_at)?,
            id: row.public_id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            due_date,
        })
    }
}

fn parse_timestamp(row_id: i64, value: &str) -> Result<DateTime<Utc>, TaskError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|error| TaskError::Corrupt(format!("task {row_id}: timestamp: {error}")))
}

fn timestamp(at: DateTime<Utc>) -> String {
    // Fixed precision keeps lexical order equal to chronological order.
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn validate_title(title: &str) -> Result<String, TaskError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::Validation("title is required".to_string()));
    }
    Ok(title.to_string())
}

/// Task persistence. Every query is scoped to the caller's identity.
#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner: &UserIdentity, new_task: NewTask) -> Result<Task, TaskError> {
        let title = validate_title(&new_task.title)?;
        let now = Utc::now().trunc_subsecs(6);

        let task = Task {
            id: cuid2::create_id(),
            owner_id: owner.user_id.clone(),
            title,
            description: new_task.description,
            status: new_task.status.unwrap_or_default(),
            priority: new_task.priority.unwrap_or_default(),
            due_date: new_task.due_date,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO tasks (public_id, owner_id, title, description, status, priority, due_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.owner_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date.map(|date| date.format(DUE_DATE_FORMAT).to_string()))
        .bind(timestamp(task.created_at))
        .bind(timestamp(task.updated_at))
        .execute(&self.pool)
        .await?;

        info!(task = %task.id, owner = %task.owner_id, "created task");
        Ok(task)
    }

    /// All tasks owned by `owner`, newest first.
    pub async fn list(&self, owner: &UserIdentity) -> Result<Vec<Task>, TaskError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, public_id, owner_id, title, description, status, priority, due_date, created_at, updated_at
            FROM tasks
            WHERE owner_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(&owner.user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    /// Apply `patch` in one owner-scoped statement. Concurrent updates to
    /// the same task are last-write-wins per field.
    pub async fn update(
        &self,
        owner: &UserIdentity,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<Task, TaskError> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let (set_description, description) = match patch.description {
            Some(description) => (true, description),
            None => (false, None),
        };
        let (set_due_date, due_date) = match patch.due_date {
            Some(due_date) => (true, due_date.map(|date| date.format(DUE_DATE_FORMAT).to_string())),
            None => (false, None),
        };
        let now = timestamp(Utc::now().trunc_subsecs(6));

        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
            SET title = COALESCE(?, title),
                description = CASE WHEN ? THEN ? ELSE description END,
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                due_date = CASE WHEN ? THEN ? ELSE due_date END,
                updated_at = MAX(?, created_at)
            WHERE public_id = ? AND owner_id = ?
            RETURNING id, public_id, owner_id, title, description, status, priority, due_date, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(set_description)
        .bind(description)
        .bind(patch.status.map(|status| status.as_str()))
        .bind(patch.priority.map(|priority| priority.as_str()))
        .bind(set_due_date)
        .bind(due_date)
        .bind(now)
        .bind(task_id)
        .bind(&owner.user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!(task = %task_id, owner = %owner.user_id, "update target not found");
            return Err(TaskError::NotFound);
        };

        let task = Task::try_from(row)?;
        info!(task = %task.id, owner = %task.owner_id, "updated task");
        Ok(task)
    }

    pub async fn delete(&self, owner: &UserIdentity, task_id: &str) -> Result<(), TaskError> {
        let result = sqlx::query("DELETE FROM tasks WHERE public_id = ? AND owner_id = ?")
            .bind(task_id)
            .bind(&owner.user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaskError::NotFound);
        }

        info!(task = %task_id, owner = %owner.user_id, "deleted task");
        Ok(())
    }
}
