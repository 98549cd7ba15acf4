/// Owner-scoped access to records
///
/// [`OwnerScope`] binds the authenticated identity to a record store. It is the only
/// path from a route handler to task and project storage, and it passes the caller's id
/// as the owner key on every call. Records owned by someone else behave exactly like
/// records that do not exist: both yield `AuthzError::NotFound`.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::authorization::{AuthzError, TaskScope};
/// use taskhub_shared::auth::middleware::AuthContext;
/// use taskhub_shared::models::task::{NewTask, TaskChanges, TaskStatus};
/// use taskhub_shared::store::RecordStore;
/// use taskhub_shared::models::task::Task;
///
/// async fn finish_first_task(
///     auth: &AuthContext,
///     store: &dyn RecordStore<Task>,
/// ) -> Result<(), AuthzError> {
///     let scope = TaskScope::new(auth, store);
///     let task = scope.create(NewTask::titled("Write report")).await?;
///     scope.update(task.id, TaskChanges::status(TaskStatus::Completed)).await?;
///     Ok(())
/// }
/// ```

use std::marker::PhantomData;

use chrono::NaiveDate;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::page::{Page, PageRequest};
use crate::models::project::{Project, ProjectStatistic};
use crate::models::task::Task;
use crate::models::OwnedRecord;
use crate::store::{ProjectStore, RecordStore, StoreError};

/// Error type for owner-scoped operations
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Record is missing or belongs to another principal
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Record operations constrained to one owner
pub struct OwnerScope<'a, R, S: ?Sized> {
    owner: Uuid,
    store: &'a S,
    _record: PhantomData<fn() -> R>,
}

/// Owner scope over task storage
pub type TaskScope<'a> = OwnerScope<'a, Task, dyn RecordStore<Task> + 'a>;

/// Owner scope over project storage
pub type ProjectScope<'a> = OwnerScope<'a, Project, dyn ProjectStore + 'a>;

impl<'a, R, S> OwnerScope<'a, R, S>
where
    R: OwnedRecord,
    S: RecordStore<R> + ?Sized,
{
    pub fn new(auth: &AuthContext, store: &'a S) -> Self {
        Self {
            owner: auth.user_id,
            store,
            _record: PhantomData,
        }
    }

    /// Id every operation is keyed by
    pub fn owner(&self) -> Uuid {
        self.owner
    }

    fn not_found(&self, operation: &'static str, id: Uuid) -> AuthzError {
        tracing::debug!(
            user_id = %self.owner,
            record_id = %id,
            kind = R::KIND,
            operation,
            "Record not found in owner scope"
        );
        AuthzError::NotFound(R::KIND)
    }

    /// Creates a record owned by the caller
    pub async fn create(&self, draft: R::Draft) -> Result<R, AuthzError> {
        let record = self.store.insert(self.owner, draft).await?;
        tracing::info!(user_id = %self.owner, record_id = %record.id(), kind = R::KIND, "Record created");
        Ok(record)
    }

    /// Fetches one of the caller's records
    ///
    /// # Errors
    ///
    /// `AuthzError::NotFound` if the record does not exist or has another owner
    pub async fn get(&self, id: Uuid) -> Result<R, AuthzError> {
        self.store
            .find_owned(id, self.owner)
            .await?
            .ok_or_else(|| self.not_found("get", id))
    }

    /// One page of the caller's records plus totals over the whole filtered set
    pub async fn list(&self, filter: R::Filter, request: PageRequest) -> Result<Page<R>, AuthzError> {
        let total = self.store.count_owned(self.owner, &filter).await?;
        let items = self
            .store
            .list_owned(self.owner, &filter, request.limit(), request.offset())
            .await?;

        Ok(Page::new(items, total, request))
    }

    /// Applies a partial update to one of the caller's records
    pub async fn update(&self, id: Uuid, changes: R::Changes) -> Result<R, AuthzError> {
        let record = self
            .store
            .update_owned(id, self.owner, changes)
            .await?
            .ok_or_else(|| self.not_found("update", id))?;

        tracing::info!(user_id = %self.owner, record_id = %id, kind = R::KIND, "Record updated");
        Ok(record)
    }

    /// Deletes one of the caller's records
    pub async fn delete(&self, id: Uuid) -> Result<(), AuthzError> {
        if !self.store.delete_owned(id, self.owner).await? {
            return Err(self.not_found("delete", id));
        }

        tracing::info!(user_id = %self.owner, record_id = %id, kind = R::KIND, "Record deleted");
        Ok(())
    }
}

impl<'a, S> OwnerScope<'a, Project, S>
where
    S: ProjectStore + ?Sized,
{
    /// Per-status counts over the caller's projects only
    pub async fn statistics(&self, today: NaiveDate) -> Result<Vec<ProjectStatistic>, AuthzError> {
        Ok(self.store.statistics_owned(self.owner, today).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::{NewProject, ProjectFilter, ProjectStatus};
    use crate::models::task::{NewTask, TaskChanges, TaskFilter, TaskPriority, TaskStatus};
    use crate::store::memory::MemoryRecordStore;
    use std::sync::Arc;

    fn principal(email: &str) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_stamps_caller_as_owner() {
        let store = MemoryRecordStore::<Task>::new();
        let ann = principal("ann@x.com");
        let scope: OwnerScope<'_, Task, _> = OwnerScope::new(&ann, &store);

        let task = scope.create(NewTask::titled("Buy milk")).await.unwrap();
        assert_eq!(task.created_by, ann.user_id);
        assert_eq!(scope.owner(), ann.user_id);
    }

    #[tokio::test]
    async fn test_other_owner_sees_not_found() {
        let store = MemoryRecordStore::<Task>::new();
        let ann = principal("ann@x.com");
        let bob = principal("bob@x.com");
        let ann_scope: OwnerScope<'_, Task, _> = OwnerScope::new(&ann, &store);
        let bob_scope: OwnerScope<'_, Task, _> = OwnerScope::new(&bob, &store);

        let task = ann_scope.create(NewTask::titled("Ann's")).await.unwrap();

        assert!(matches!(bob_scope.get(task.id).await, Err(AuthzError::NotFound("Task"))));
        assert!(matches!(
            bob_scope.update(task.id, TaskChanges::priority(TaskPriority::High)).await,
            Err(AuthzError::NotFound("Task"))
        ));
        assert!(matches!(bob_scope.delete(task.id).await, Err(AuthzError::NotFound("Task"))));

        // Same outcome as an id that never existed
        let missing = bob_scope.get(Uuid::new_v4()).await.unwrap_err();
        let foreign = bob_scope.get(task.id).await.unwrap_err();
        assert_eq!(missing.to_string(), foreign.to_string());

        assert_eq!(ann_scope.get(task.id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_list_only_returns_own_records() {
        let store = MemoryRecordStore::<Task>::new();
        let ann = principal("ann@x.com");
        let bob = principal("bob@x.com");
        let ann_scope: OwnerScope<'_, Task, _> = OwnerScope::new(&ann, &store);
        let bob_scope: OwnerScope<'_, Task, _> = OwnerScope::new(&bob, &store);

        for i in 0..3 {
            ann_scope.create(NewTask::titled(&format!("ann {}", i))).await.unwrap();
        }
        bob_scope.create(NewTask::titled("bob")).await.unwrap();

        let page = ann_scope
            .list(TaskFilter::default(), PageRequest::new(Some(1), Some(2)).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|t| t.created_by == ann.user_id));

        let empty = principal("new@x.com");
        let page = OwnerScope::<Task, _>::new(&empty, &store)
            .list(TaskFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_concurrent_updates_stay_in_scope() {
        let store = Arc::new(MemoryRecordStore::<Task>::new());
        let ann = principal("ann@x.com");
        let bob = principal("bob@x.com");

        let task = OwnerScope::<Task, _>::new(&ann, store.as_ref())
            .create(NewTask::titled("shared id"))
            .await
            .unwrap();
        let task_id = task.id;

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            let (who, status) = if i % 2 == 0 {
                (ann.clone(), TaskStatus::InProgress)
            } else {
                (bob.clone(), TaskStatus::Completed)
            };
            handles.push(tokio::spawn(async move {
                OwnerScope::<Task, _>::new(&who, store.as_ref())
                    .update(task_id, TaskChanges::status(status))
                    .await
                    .is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 5);

        let after = OwnerScope::<Task, _>::new(&ann, store.as_ref()).get(task_id).await.unwrap();
        assert_eq!(after.status, TaskStatus::InProgress);
        assert_eq!(after.created_by, ann.user_id);
    }

    #[tokio::test]
    async fn test_statistics_cover_caller_only() {
        let store = MemoryRecordStore::<Project>::new();
        let ann = principal("ann@x.com");
        let bob = principal("bob@x.com");
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        let draft = |status, due: NaiveDate| NewProject {
            name: "Launch".to_string(),
            description: None,
            status,
            due_date: due,
        };

        let ann_scope: OwnerScope<'_, Project, _> = OwnerScope::new(&ann, &store);
        ann_scope
            .create(draft(ProjectStatus::Active, today.pred_opt().unwrap()))
            .await
            .unwrap();
        OwnerScope::<Project, _>::new(&bob, &store)
            .create(draft(ProjectStatus::Completed, today))
            .await
            .unwrap();

        let stats = ann_scope.statistics(today).await.unwrap();
        assert_eq!(
            stats,
            vec![ProjectStatistic {
                status: ProjectStatus::Active,
                count: 1,
                overdue: 1
            }]
        );

        let page = ann_scope
            .list(ProjectFilter { status: Some(ProjectStatus::Completed) }, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_dyn_scopes() {
        let tasks: Arc<dyn RecordStore<Task>> = Arc::new(MemoryRecordStore::<Task>::new());
        let projects: Arc<dyn ProjectStore> = Arc::new(MemoryRecordStore::<Project>::new());
        let ann = principal("ann@x.com");

        let task = TaskScope::new(&ann, tasks.as_ref())
            .create(NewTask::titled("via trait object"))
            .await
            .unwrap();
        assert_eq!(task.created_by, ann.user_id);

        let stats = ProjectScope::new(&ann, projects.as_ref())
            .statistics(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .await
            .unwrap();
        assert!(stats.is_empty());
    }
}
