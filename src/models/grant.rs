use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserUid;

/// An approved access request for one user and one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrantEntry {
    pub uid: i64,
    pub user_id: UserUid,
    pub record_id: String,
    /// Title of the referenced document, when it could be resolved.
    pub document_title: Option<String>,
    /// Approved, but the user has not been told yet.
    pub inform_user_pending: bool,
    pub notified_at: Option<DateTime<Utc>>,
}

impl AccessGrantEntry {
    /// Creates an approved grant that still needs a notification.
    pub fn pending(uid: i64, user_id: UserUid, record_id: impl Into<String>) -> Self {
        Self {
            uid,
            user_id,
            record_id: record_id.into(),
            document_title: None,
            inform_user_pending: true,
            notified_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = Some(title.into());
        self
    }

    /// Records the notification. Both fields always change together.
    pub fn mark_notified(&mut self, at: DateTime<Utc>) {
        self.notified_at = Some(at);
        self.inform_user_pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.inform_user_pending && self.notified_at.is_none()
    }

    /// Title for display, falling back to the record id.
    pub fn display_title(&self) -> &str {
        self.document_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.record_id)
    }
}
