/// Project model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('active', 'completed');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     description TEXT,
///     status project_status NOT NULL DEFAULT 'active',
///     due_date DATE NOT NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::OwnedRecord;

/// Project lifecycle status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
}

/// Project owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub status: ProjectStatus,

    pub due_date: NaiveDate,

    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Past due and not yet completed
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date < today && self.status != ProjectStatus::Completed
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: ProjectStatus,

    pub due_date: NaiveDate,
}

/// Partial update for a project
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectChanges {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<ProjectStatus>,

    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
}

/// Per-status totals over one owner's projects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProjectStatistic {
    pub status: ProjectStatus,
    pub count: i64,
    pub overdue: i64,
}

impl ProjectStatistic {
    /// Groups projects by status, ordered by status
    pub fn tally<'a>(projects: impl IntoIterator<Item = &'a Project>, today: NaiveDate) -> Vec<Self> {
        let mut groups: BTreeMap<ProjectStatus, (i64, i64)> = BTreeMap::new();

        for project in projects {
            let entry = groups.entry(project.status).or_default();
            entry.0 += 1;
            if project.is_overdue(today) {
                entry.1 += 1;
            }
        }

        groups
            .into_iter()
            .map(|(status, (count, overdue))| Self { status, count, overdue })
            .collect()
    }
}

impl OwnedRecord for Project {
    type Draft = NewProject;
    type Changes = ProjectChanges;
    type Filter = ProjectFilter;

    const KIND: &'static str = "Project";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.created_by
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_draft(id: Uuid, owner_id: Uuid, draft: NewProject, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            status: draft.status,
            due_date: draft.due_date,
            created_by: owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, changes: ProjectChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = due_date;
        }
        self.updated_at = now;
    }

    fn matches(&self, filter: &ProjectFilter) -> bool {
        filter.status.map_or(true, |s| s == self.status)
    }
}

const PROJECT_COLUMNS: &str =
    "id, name, description, status, due_date, created_by, created_at, updated_at";

impl Project {
    /// Inserts a fully built project
    pub async fn insert(pool: &PgPool, project: &Project) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO projects ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {cols}
            "#,
            cols = PROJECT_COLUMNS
        );

        let project = sqlx::query_as::<_, Project>(&query)
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.status)
            .bind(project.due_date)
            .bind(project.created_by)
            .bind(project.created_at)
            .bind(project.updated_at)
            .fetch_one(pool)
            .await?;

        Ok(project)
    }

    pub async fn find_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM projects WHERE id = $1 AND created_by = $2",
            PROJECT_COLUMNS
        );

        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await?;

        Ok(project)
    }

    pub async fn list_owned(
        pool: &PgPool,
        owner: Uuid,
        filter: &ProjectFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM projects
            WHERE created_by = $1
              AND ($2::project_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            PROJECT_COLUMNS
        );

        let projects = sqlx::query_as::<_, Project>(&query)
            .bind(owner)
            .bind(filter.status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(projects)
    }

    pub async fn count_owned(pool: &PgPool, owner: Uuid, filter: &ProjectFilter) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM projects
            WHERE created_by = $1
              AND ($2::project_status IS NULL OR status = $2)
            "#,
        )
        .bind(owner)
        .bind(filter.status)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn update_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        data: ProjectChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND created_by = $2 RETURNING {}",
            PROJECT_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id).bind(owner);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        let project = q.fetch_optional(pool).await?;

        Ok(project)
    }

    /// Deletes one of the owner's projects. Tasks referencing it are detached.
    pub async fn delete_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Per-status totals over the owner's projects
    pub async fn statistics_owned(
        pool: &PgPool,
        owner: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<ProjectStatistic>, sqlx::Error> {
        let stats = sqlx::query_as::<_, ProjectStatistic>(
            r#"
            SELECT status,
                   COUNT(*) AS count,
                   COUNT(*) FILTER (WHERE due_date < $2 AND status <> 'completed') AS overdue
            FROM projects
            WHERE created_by = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(owner)
        .bind(today)
        .fetch_all(pool)
        .await?;

        Ok(stats)
    }
}
