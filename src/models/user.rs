use serde::{Deserialize, Serialize};

/// Numeric frontend user id.
pub type UserUid = i64;

/// A frontend user as loaded from the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserUid,
    pub email: String,
    pub full_name: String,
    /// Preferred language, e.g. `de` or `en-GB`.
    pub locale: Option<String>,
    /// Group ids the user belongs to.
    pub groups: Vec<String>,
    /// Record ids from the user's explicit access list, as stored.
    pub document_access: Vec<String>,
}

impl UserProfile {
    pub fn new(uid: UserUid, email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            uid,
            email: email.into(),
            full_name: full_name.into(),
            locale: None,
            groups: Vec::new(),
            document_access: Vec::new(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_document_access(mut self, record_ids: Vec<String>) -> Self {
        self.document_access = record_ids;
        self
    }
}

/// Splits a comma separated id list, dropping empty segments.
///
/// Segments are otherwise kept verbatim; group ids compare exactly.
pub fn split_id_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .collect()
}
