//! In-process stores.
//!
//! Each operation takes the lock once, so check-then-write sequences (duplicate email,
//! ownership check before update) cannot interleave with other writers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, ProjectStore, RecordStore, StoreError};
use crate::models::project::{Project, ProjectStatistic};
use crate::models::user::{normalize_email, CreateUser, User};
use crate::models::OwnedRecord;

/// Credential store kept in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        let email = normalize_email(&data.email);
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Duplicate);
        }

        let user = User::from_create(CreateUser { email, ..data }, Utc::now());
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Owned-record store kept in memory
#[derive(Debug)]
pub struct MemoryRecordStore<R> {
    records: RwLock<HashMap<Uuid, R>>,
}

impl<R> Default for MemoryRecordStore<R> {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<R> MemoryRecordStore<R> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: OwnedRecord> MemoryRecordStore<R> {
    /// Owner's matching records, newest first
    fn owned_sorted<'a>(records: &'a HashMap<Uuid, R>, owner: Uuid, filter: &R::Filter) -> Vec<&'a R> {
        let mut owned: Vec<&R> = records
            .values()
            .filter(|r| r.owner_id() == owner && r.matches(filter))
            .collect();
        owned.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        owned
    }
}

#[async_trait]
impl<R: OwnedRecord> RecordStore<R> for MemoryRecordStore<R> {
    async fn insert(&self, owner: Uuid, draft: R::Draft) -> Result<R, StoreError> {
        let record = R::from_draft(Uuid::new_v4(), owner, draft, Utc::now());
        self.records.write().await.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<R>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(&id).filter(|r| r.owner_id() == owner).cloned())
    }

    async fn list_owned(
        &self,
        owner: Uuid,
        filter: &R::Filter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<R>, StoreError> {
        let limit = usize::try_from(limit).map_err(|_| StoreError::Internal("negative limit".to_string()))?;
        let offset = usize::try_from(offset).map_err(|_| StoreError::Internal("negative offset".to_string()))?;

        let records = self.records.read().await;
        Ok(Self::owned_sorted(&records, owner, filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_owned(&self, owner: Uuid, filter: &R::Filter) -> Result<i64, StoreError> {
        let records = self.records.read().await;
        let count = records
            .values()
            .filter(|r| r.owner_id() == owner && r.matches(filter))
            .count();
        Ok(count as i64)
    }

    async fn update_owned(&self, id: Uuid, owner: Uuid, changes: R::Changes) -> Result<Option<R>, StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) if record.owner_id() == owner => {
                record.apply(changes, Utc::now());
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        match records.get(&id) {
            Some(record) if record.owner_id() == owner => {
                records.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ProjectStore for MemoryRecordStore<Project> {
    async fn statistics_owned(&self, owner: Uuid, today: NaiveDate) -> Result<Vec<ProjectStatistic>, StoreError> {
        let records = self.records.read().await;
        let owned = records.values().filter(|p| p.owner_id() == owner);
        Ok(ProjectStatistic::tally(owned, today))
    }
}
