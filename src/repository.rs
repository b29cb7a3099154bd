//! Lookup and persistence interfaces consumed by the access core.
//!
//! The SQLite implementations live in [`crate::db`]; tests use in-memory
//! fakes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{AccessGrantEntry, Document, DocumentUid, UserProfile, UserUid};

/// Errors raised by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Pending grants keyed by owning user, in ascending user order.
pub type PendingGrants = BTreeMap<UserUid, Vec<AccessGrantEntry>>;

#[allow(async_fn_in_trait)]
pub trait DocumentRepository {
    async fn find_by_id(&self, uid: DocumentUid) -> Result<Option<Document>, RepositoryError>;
}

#[allow(async_fn_in_trait)]
pub trait UserRepository {
    async fn find_by_id(&self, uid: UserUid) -> Result<Option<UserProfile>, RepositoryError>;
}

#[allow(async_fn_in_trait)]
pub trait GrantRepository {
    /// All grants with `inform_user_pending = true`, grouped by user.
    async fn find_pending_grouped_by_user(&self) -> Result<PendingGrants, RepositoryError>;

    /// Marks the given entries notified at `at` in a single transaction.
    ///
    /// Returns the number of entries that were still pending and got marked.
    async fn mark_notified(
        &self,
        entries: &[AccessGrantEntry],
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
}
