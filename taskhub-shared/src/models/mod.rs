/// Domain models for TaskHub
///
/// # Models
///
/// - `user`: Registered principals and their credential hashes
/// - `task`: Tasks owned by a principal
/// - `project`: Projects owned by a principal
/// - `page`: Pagination request/response types
///
/// Tasks and projects implement [`OwnedRecord`]. Their drafts and change sets carry no
/// owner field: the owner is supplied by the authorization layer, never by the client.

pub mod page;
pub mod project;
pub mod task;
pub mod user;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A record that belongs to exactly one principal
pub trait OwnedRecord: Clone + Send + Sync + 'static {
    /// Client input for creating a record
    type Draft: Send + Sync + 'static;

    /// Client input for a partial update
    type Changes: Send + Sync + 'static;

    /// List filter applied on top of the ownership filter
    type Filter: Default + Send + Sync + 'static;

    /// Human-readable record kind, used in "not found" messages
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    fn owner_id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    /// Builds a new record stamped with the given owner
    fn from_draft(id: Uuid, owner_id: Uuid, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Applies a partial update and bumps `updated_at`
    fn apply(&mut self, changes: Self::Changes, now: DateTime<Utc>);

    fn matches(&self, filter: &Self::Filter) -> bool;
}
