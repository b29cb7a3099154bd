use std::collections::BTreeSet;

use super::user::{UserProfile, UserUid};

/// An authenticated frontend user, reduced to what access checks need.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthenticatedUser {
    pub user_id: UserUid,
    pub groups: BTreeSet<String>,
    /// Trimmed record ids from the user's explicit access list.
    pub granted_record_ids: BTreeSet<String>,
}

impl AuthenticatedUser {
    pub fn new<G, R>(user_id: UserUid, groups: G, granted: R) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        Self {
            user_id,
            groups: groups.into_iter().map(Into::into).collect(),
            granted_record_ids: granted
                .into_iter()
                .map(|id| id.as_ref().trim().to_string())
                .collect(),
        }
    }

    pub fn has_grant_for(&self, record_id: &str) -> bool {
        self.granted_record_ids.contains(record_id)
    }
}

/// Who is asking for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    Authenticated(AuthenticatedUser),
}

impl Requester {
    pub fn authenticated<G, R>(user_id: UserUid, groups: G, granted: R) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        Requester::Authenticated(AuthenticatedUser::new(user_id, groups, granted))
    }

    pub fn from_profile(profile: &UserProfile) -> Self {
        Self::authenticated(
            profile.uid,
            profile.groups.iter().cloned(),
            &profile.document_access,
        )
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Requester::Anonymous => None,
            Requester::Authenticated(user) => Some(user),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Requester::Anonymous)
    }
}
