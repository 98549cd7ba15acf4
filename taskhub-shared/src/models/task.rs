/// Task model and database operations
///
/// Every query in this module is keyed by the owner (`created_by`) as well as the id.
/// There is deliberately no lookup by id alone.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date DATE,
///     project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::OwnedRecord;

/// Task progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,

    #[serde(rename = "in progress", alias = "in-progress", alias = "in_progress")]
    InProgress,

    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Task owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Due date (YYYY-MM-DD)
    pub due_date: Option<NaiveDate>,

    /// Project this task belongs to. Always a project owned by `created_by`.
    pub project_id: Option<Uuid>,

    /// Owner, taken from the authenticated identity and never from the client
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// Has no owner field. A `createdBy` sent by the client is ignored on deserialization.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    pub due_date: Option<NaiveDate>,

    pub project_id: Option<Uuid>,
}

impl NewTask {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: None,
            project_id: None,
        }
    }
}

/// Partial update for a task. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<NaiveDate>,

    pub project_id: Option<Uuid>,
}

impl TaskChanges {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn priority(priority: TaskPriority) -> Self {
        Self {
            priority: Some(priority),
            ..Default::default()
        }
    }
}

/// List filter for tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl OwnedRecord for Task {
    type Draft = NewTask;
    type Changes = TaskChanges;
    type Filter = TaskFilter;

    const KIND: &'static str = "Task";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.created_by
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_draft(id: Uuid, owner_id: Uuid, draft: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            due_date: draft.due_date,
            project_id: draft.project_id,
            created_by: owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, changes: TaskChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(project_id) = changes.project_id {
            self.project_id = Some(project_id);
        }
        self.updated_at = now;
    }

    fn matches(&self, filter: &TaskFilter) -> bool {
        filter.status.map_or(true, |s| s == self.status)
            && filter.priority.map_or(true, |p| p == self.priority)
    }
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, project_id, \
                            created_by, created_at, updated_at";

impl Task {
    /// Inserts a fully built task
    pub async fn insert(pool: &PgPool, task: &Task) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {cols}
            "#,
            cols = TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.due_date)
            .bind(task.project_id)
            .bind(task.created_by)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID within the owner's records
    pub async fn find_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND created_by = $2",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists the owner's tasks, newest first
    pub async fn list_owned(
        pool: &PgPool,
        owner: Uuid,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE created_by = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::task_priority IS NULL OR priority = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
            TASK_COLUMNS
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(owner)
            .bind(filter.status)
            .bind(filter.priority)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Counts the owner's tasks matching the filter
    pub async fn count_owned(pool: &PgPool, owner: Uuid, filter: &TaskFilter) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE created_by = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::task_priority IS NULL OR priority = $3)
            "#,
        )
        .bind(owner)
        .bind(filter.status)
        .bind(filter.priority)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Applies a partial update to one of the owner's tasks
    ///
    /// Returns `None` if the task does not exist or belongs to someone else.
    pub async fn update_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        data: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.project_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", project_id = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND created_by = $2 RETURNING {}",
            TASK_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(project_id) = data.project_id {
            q = q.bind(project_id);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes one of the owner's tasks
    pub async fn delete_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(owner: Uuid) -> Task {
        Task::from_draft(Uuid::new_v4(), owner, NewTask::titled("Write report"), Utc::now())
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), json!("in progress"));
        assert_eq!(TaskStatus::InProgress.as_str(), "in progress");

        for raw in ["in progress", "in-progress", "in_progress"] {
            let status: TaskStatus = serde_json::from_value(json!(raw)).unwrap();
            assert_eq!(status, TaskStatus::InProgress);
        }
        assert!(serde_json::from_value::<TaskStatus>(json!("done")).is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_new_task_ignores_client_owner() {
        let spoofed = Uuid::new_v4();
        let draft: NewTask = serde_json::from_value(json!({
            "title": "Pay rent",
            "priority": "high",
            "createdBy": spoofed,
        }))
        .unwrap();

        let owner = Uuid::new_v4();
        let task = Task::from_draft(Uuid::new_v4(), owner, draft, Utc::now());
        assert_eq!(task.created_by, owner);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_new_task_validation() {
        assert!(NewTask::titled("ok").validate().is_ok());
        assert!(NewTask::titled("").validate().is_err());
        assert!(NewTask::titled(&"x".repeat(201)).validate().is_err());
    }

    #[test]
    fn test_apply_merges_changes() {
        let mut task = sample(Uuid::new_v4());
        let before = task.clone();
        let later = before.updated_at + chrono::Duration::seconds(5);

        task.apply(TaskChanges::status(TaskStatus::Completed), later);

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.title, before.title);
        assert_eq!(task.priority, before.priority);
        assert_eq!(task.created_by, before.created_by);
        assert_eq!(task.updated_at, later);
    }

    #[test]
    fn test_filter_matching() {
        let task = sample(Uuid::new_v4());

        assert!(task.matches(&TaskFilter::default()));
        assert!(task.matches(&TaskFilter {
            status: Some(TaskStatus::Pending),
            priority: Some(TaskPriority::Medium),
        }));
        assert!(!task.matches(&TaskFilter {
            status: Some(TaskStatus::Completed),
            priority: None,
        }));
    }

    #[test]
    fn test_serializes_camel_case() {
        let task = sample(Uuid::new_v4());
        let json = serde_json::to_value(&task).unwrap();

        assert!(json.get("createdBy").is_some());
        assert!(json.get("dueDate").is_some());
        assert!(json.get("projectId").is_some());
        assert_eq!(json["status"], "pending");
        assert_eq!(json["priority"], "medium");
    }
}
