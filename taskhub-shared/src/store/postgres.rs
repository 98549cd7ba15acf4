//! PostgreSQL-backed stores.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, ProjectStore, RecordStore, StoreError};
use crate::db::pool::health_check;
use crate::models::project::{Project, ProjectChanges, ProjectFilter, ProjectStatistic};
use crate::models::task::{Task, TaskChanges, TaskFilter};
use crate::models::user::{CreateUser, User};
use crate::models::OwnedRecord;

/// Store backed by a PostgreSQL pool
///
/// Cloning is cheap; all clones share the pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn create(&self, data: CreateUser) -> Result<User, StoreError> {
        User::create(&self.pool, data).await.map_err(StoreError::from_insert)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait]
impl RecordStore<Task> for PgStore {
    async fn insert(&self, owner: Uuid, draft: <Task as OwnedRecord>::Draft) -> Result<Task, StoreError> {
        let task = Task::from_draft(Uuid::new_v4(), owner, draft, Utc::now());
        Ok(Task::insert(&self.pool, &task).await?)
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_owned(&self.pool, id, owner).await?)
    }

    async fn list_owned(
        &self,
        owner: Uuid,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_owned(&self.pool, owner, filter, limit, offset).await?)
    }

    async fn count_owned(&self, owner: Uuid, filter: &TaskFilter) -> Result<i64, StoreError> {
        Ok(Task::count_owned(&self.pool, owner, filter).await?)
    }

    async fn update_owned(&self, id: Uuid, owner: Uuid, changes: TaskChanges) -> Result<Option<Task>, StoreError> {
        Ok(Task::update_owned(&self.pool, id, owner, changes).await?)
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete_owned(&self.pool, id, owner).await?)
    }
}

#[async_trait]
impl RecordStore<Project> for PgStore {
    async fn insert(&self, owner: Uuid, draft: <Project as OwnedRecord>::Draft) -> Result<Project, StoreError> {
        let project = Project::from_draft(Uuid::new_v4(), owner, draft, Utc::now());
        Ok(Project::insert(&self.pool, &project).await?)
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(Project::find_owned(&self.pool, id, owner).await?)
    }

    async fn list_owned(
        &self,
        owner: Uuid,
        filter: &ProjectFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, StoreError> {
        Ok(Project::list_owned(&self.pool, owner, filter, limit, offset).await?)
    }

    async fn count_owned(&self, owner: Uuid, filter: &ProjectFilter) -> Result<i64, StoreError> {
        Ok(Project::count_owned(&self.pool, owner, filter).await?)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Project>, StoreError> {
        Ok(Project::update_owned(&self.pool, id, owner, changes).await?)
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        Ok(Project::delete_owned(&self.pool, id, owner).await?)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn statistics_owned(&self, owner: Uuid, today: NaiveDate) -> Result<Vec<ProjectStatistic>, StoreError> {
        Ok(Project::statistics_owned(&self.pool, owner, today).await?)
    }
}
