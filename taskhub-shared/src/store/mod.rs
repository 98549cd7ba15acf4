/// Persistence interfaces for credentials and owned records
///
/// Route handlers never talk to a database directly. Credentials go through
/// [`CredentialStore`]; tasks and projects go through [`RecordStore`], reached only via
/// `auth::authorization::OwnerScope`. Every record operation takes the owner as part of
/// its key, so there is no way to read or modify a record without naming its owner.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: PostgreSQL via `sqlx`
/// - [`memory::MemoryStore`] / [`memory::MemoryRecordStore`]: in-process maps, used in
///   development without `DATABASE_URL` and in tests

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::project::{Project, ProjectStatistic};
use crate::models::user::{CreateUser, User};
use crate::models::OwnedRecord;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique key (the user email) is already taken. Nothing was written.
    #[error("Duplicate record")]
    Duplicate,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Maps unique-constraint violations to `Duplicate`
    pub fn from_insert(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Database(err),
        }
    }
}

/// Principal records and their credential hashes
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Creates a user
    ///
    /// # Errors
    ///
    /// `StoreError::Duplicate` if the (normalized) email is already registered
    async fn create(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Backend name reported by the health endpoint
    fn backend(&self) -> &'static str;
}

/// Owner-keyed storage for one record type
#[async_trait]
pub trait RecordStore<R: OwnedRecord>: Send + Sync {
    /// Stores a new record with a fresh id, owned by `owner`
    async fn insert(&self, owner: Uuid, draft: R::Draft) -> Result<R, StoreError>;

    /// Returns the record only if it exists and belongs to `owner`
    async fn find_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<R>, StoreError>;

    /// Owner's records matching the filter, newest first
    async fn list_owned(
        &self,
        owner: Uuid,
        filter: &R::Filter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<R>, StoreError>;

    async fn count_owned(&self, owner: Uuid, filter: &R::Filter) -> Result<i64, StoreError>;

    /// Applies changes if the record belongs to `owner`; `None` otherwise
    async fn update_owned(&self, id: Uuid, owner: Uuid, changes: R::Changes) -> Result<Option<R>, StoreError>;

    /// Deletes the record if it belongs to `owner`; returns whether anything was deleted
    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;
}

/// Project storage with per-owner aggregates
#[async_trait]
pub trait ProjectStore: RecordStore<Project> {
    async fn statistics_owned(&self, owner: Uuid, today: NaiveDate) -> Result<Vec<ProjectStatistic>, StoreError>;
}
