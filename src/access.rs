//! Document access decisions.
//!
//! A requester may view a document when, in this order:
//!
//! 1. they belong to a group on the configured allowlist,
//! 2. the document is unrestricted, or
//! 3. they are logged in and the document's record id is on their explicit
//!    access list.
//!
//! The group rule is checked before the document is even looked up, so an
//! allowlisted group sees every document regardless of its restrictions.

use std::collections::BTreeSet;

use crate::models::{Document, DocumentUid, Requester, UserUid};
use crate::repository::{DocumentRepository, UserRepository};

/// Groups whose members may view every document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupAllowlist {
    groups: BTreeSet<String>,
}

impl GroupAllowlist {
    /// Builds an allowlist, ignoring blank entries so an unset value never
    /// matches anything.
    pub fn new<I>(groups: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            groups: groups
                .into_iter()
                .map(Into::into)
                .filter(|g: &String| !g.trim().is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// True if the requester shares at least one group with the allowlist.
    pub fn admits(&self, requester: &Requester) -> bool {
        match requester.user() {
            Some(user) => !self.is_empty() && user.groups.iter().any(|g| self.contains(g)),
            None => false,
        }
    }
}

/// Stateless access decision over the current data.
#[derive(Debug, Clone, Default)]
pub struct AccessEvaluator {
    allowlist: GroupAllowlist,
}

impl AccessEvaluator {
    pub fn new(allowlist: GroupAllowlist) -> Self {
        Self { allowlist }
    }

    pub fn allowlist(&self) -> &GroupAllowlist {
        &self.allowlist
    }

    /// Decides access for an already fetched document.
    ///
    /// `None` means the document lookup failed; only the group rule can
    /// still grant in that case.
    pub fn evaluate(&self, requester: &Requester, document: Option<&Document>) -> bool {
        if self.allowlist.admits(requester) {
            tracing::debug!("Access granted by group allowlist");
            return true;
        }

        let Some(document) = document else {
            return false;
        };

        Self::evaluate_document(requester, document)
    }

    /// Restriction and explicit-grant rules.
    fn evaluate_document(requester: &Requester, document: &Document) -> bool {
        if document.is_public() {
            tracing::debug!(document = document.uid, "Access granted, document is public");
            return true;
        }

        match requester.user() {
            Some(user) => {
                let granted = user.has_grant_for(&document.record_id);
                tracing::debug!(
                    document = document.uid,
                    user = user.user_id,
                    granted,
                    "Checked explicit access list"
                );
                granted
            }
            None => false,
        }
    }

    /// Decides access for a raw document id, fetching the document as needed.
    ///
    /// A missing id denies. The group rule runs before the lookup; a
    /// malformed id, an unknown document or a failing repository deny.
    pub async fn check<D>(&self, requester: &Requester, documents: &D, id: Option<&str>) -> bool
    where
        D: DocumentRepository,
    {
        let Some(raw_id) = id else {
            return false;
        };

        if self.allowlist.admits(requester) {
            tracing::debug!("Access granted by group allowlist");
            return true;
        }

        let uid = match raw_id.trim().parse::<DocumentUid>() {
            Ok(uid) => uid,
            Err(_) => {
                tracing::debug!("Malformed document id '{}'", raw_id);
                return false;
            }
        };

        let document = match documents.find_by_id(uid).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                tracing::debug!(document = uid, "Document not found");
                return false;
            }
            Err(e) => {
                tracing::warn!(document = uid, "Document lookup failed: {}", e);
                return false;
            }
        };

        Self::evaluate_document(requester, &document)
    }
}

/// Resolves an explicit user id into a requester.
///
/// No id, an unknown user or a failing lookup all yield an anonymous
/// requester.
pub async fn requester_for<U>(users: &U, user_id: Option<UserUid>) -> Requester
where
    U: UserRepository,
{
    let Some(uid) = user_id else {
        return Requester::Anonymous;
    };

    match users.find_by_id(uid).await {
        Ok(Some(profile)) => Requester::from_profile(&profile),
        Ok(None) => {
            tracing::warn!(user = uid, "User not found, treating as anonymous");
            Requester::Anonymous
        }
        Err(e) => {
            tracing::warn!(user = uid, "User lookup failed, treating as anonymous: {}", e);
            Requester::Anonymous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RestrictionState, UserProfile};
    use crate::repository::RepositoryError;
    use std::collections::HashMap;

    struct FakeDocuments {
        documents: HashMap<DocumentUid, Document>,
        fail: bool,
    }

    impl FakeDocuments {
        fn with(documents: Vec<Document>) -> Self {
            Self {
                documents: documents.into_iter().map(|d| (d.uid, d)).collect(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                documents: HashMap::new(),
                fail: true,
            }
        }
    }

    impl DocumentRepository for FakeDocuments {
        async fn find_by_id(&self, uid: DocumentUid) -> Result<Option<Document>, RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Unavailable("offline".into()));
            }
            Ok(self.documents.get(&uid).cloned())
        }
    }

    struct FakeUsers(HashMap<UserUid, UserProfile>);

    impl UserRepository for FakeUsers {
        async fn find_by_id(&self, uid: UserUid) -> Result<Option<UserProfile>, RepositoryError> {
            Ok(self.0.get(&uid).cloned())
        }
    }

    fn evaluator(groups: &[&str]) -> AccessEvaluator {
        AccessEvaluator::new(GroupAllowlist::new(groups.iter().copied()))
    }

    fn doc42() -> Document {
        Document::new(42, "rec-42", RestrictionState::Restricted)
    }

    fn public_doc() -> Document {
        Document::new(7, "rec-7", RestrictionState::Unrestricted)
    }

    fn user(groups: &[&str], granted: &[&str]) -> Requester {
        Requester::authenticated(1, groups.iter().copied(), granted.iter().copied())
    }

    #[test]
    fn test_group_member_granted_restricted_document() {
        let eval = evaluator(&["5", "9"]);
        let requester = user(&["1", "9"], &[]);

        assert!(eval.evaluate(&requester, Some(&doc42())));
        assert!(eval.evaluate(&requester, Some(&public_doc())));
    }

    #[test]
    fn test_group_member_granted_without_document() {
        let eval = evaluator(&["5"]);
        let requester = user(&["5"], &[]);

        assert!(eval.evaluate(&requester, None));
    }

    #[test]
    fn test_empty_allowlist_never_grants_by_group() {
        let eval = evaluator(&[]);
        let requester = user(&["5"], &[]);

        assert!(eval.allowlist().is_empty());
        assert!(!eval.evaluate(&requester, Some(&doc42())));
        assert!(!eval.evaluate(&requester, None));
    }

    #[test]
    fn test_blank_allowlist_entries_do_not_match_blank_groups() {
        let eval = evaluator(&["", " "]);
        let requester = user(&[""], &[]);

        assert!(eval.allowlist().is_empty());
        assert!(!eval.evaluate(&requester, Some(&doc42())));
    }

    #[test]
    fn test_group_ids_compare_exactly() {
        let eval = evaluator(&["Editors"]);

        assert!(!eval.evaluate(&user(&["editors"], &[]), Some(&doc42())));
        assert!(!eval.evaluate(&user(&[" Editors"], &[]), Some(&doc42())));
    }

    #[test]
    fn test_anonymous_granted_public_document() {
        let eval = evaluator(&["5"]);

        assert!(eval.evaluate(&Requester::Anonymous, Some(&public_doc())));
    }

    #[test]
    fn test_anonymous_denied_restricted_document() {
        let eval = evaluator(&["5"]);

        assert!(!eval.evaluate(&Requester::Anonymous, Some(&doc42())));
    }

    #[test]
    fn test_missing_document_denies_non_members() {
        let eval = evaluator(&["5"]);

        assert!(!eval.evaluate(&user(&[], &["rec-42"]), None));
        assert!(!eval.evaluate(&Requester::Anonymous, None));
    }

    #[test]
    fn test_explicit_grant_scenario() {
        let eval = evaluator(&["5"]);
        let u1 = user(&[], &["rec-42"]);
        let u2 = user(&[], &[]);

        assert!(eval.evaluate(&u1, Some(&doc42())));
        assert!(!eval.evaluate(&u2, Some(&doc42())));
    }

    #[test]
    fn test_explicit_grant_for_other_document_denies() {
        let eval = evaluator(&[]);
        let requester = user(&["1"], &["rec-41", "rec-43"]);

        assert!(!eval.evaluate(&requester, Some(&doc42())));
    }

    #[test]
    fn test_whitespace_in_grant_entry_matches() {
        let eval = evaluator(&[]);
        let requester = user(&[], &[" abc123 "]);
        let document = Document::new(1, "abc123", RestrictionState::Restricted);

        assert!(eval.evaluate(&requester, Some(&document)));
    }

    #[test]
    fn test_record_id_is_not_trimmed() {
        let eval = evaluator(&[]);
        let requester = user(&[], &["abc123"]);
        let document = Document::new(1, " abc123", RestrictionState::Restricted);

        assert!(!eval.evaluate(&requester, Some(&document)));
    }

    #[test]
    fn test_record_id_case_sensitive() {
        let eval = evaluator(&[]);
        let requester = user(&[], &["REC-42"]);

        assert!(!eval.evaluate(&requester, Some(&doc42())));
    }

    #[tokio::test]
    async fn test_check_missing_id_denies_even_group_members() {
        let eval = evaluator(&["5"]);
        let docs = FakeDocuments::with(vec![doc42()]);

        assert!(!eval.check(&user(&["5"], &[]), &docs, None).await);
    }

    #[tokio::test]
    async fn test_check_group_rule_skips_lookup() {
        let eval = evaluator(&["5"]);
        let docs = FakeDocuments::failing();

        assert!(eval.check(&user(&["5"], &[]), &docs, Some("42")).await);
        assert!(eval.check(&user(&["5"], &[]), &docs, Some("not-a-number")).await);
    }

    #[tokio::test]
    async fn test_check_malformed_id_denies() {
        let eval = evaluator(&["5"]);
        let docs = FakeDocuments::with(vec![public_doc()]);

        assert!(!eval.check(&Requester::Anonymous, &docs, Some("abc")).await);
        assert!(!eval.check(&Requester::Anonymous, &docs, Some("")).await);
    }

    #[tokio::test]
    async fn test_check_unknown_document_denies() {
        let eval = evaluator(&[]);
        let docs = FakeDocuments::with(vec![doc42()]);

        assert!(!eval.check(&user(&[], &["rec-42"]), &docs, Some("43")).await);
    }

    #[tokio::test]
    async fn test_check_lookup_failure_denies() {
        let eval = evaluator(&[]);
        let docs = FakeDocuments::failing();

        assert!(!eval.check(&Requester::Anonymous, &docs, Some("7")).await);
    }

    #[tokio::test]
    async fn test_check_fetches_and_applies_rules() {
        let eval = evaluator(&["5"]);
        let docs = FakeDocuments::with(vec![doc42(), public_doc()]);

        assert!(eval.check(&Requester::Anonymous, &docs, Some("7")).await);
        assert!(eval.check(&user(&[], &["rec-42"]), &docs, Some("42")).await);
        assert!(eval.check(&user(&[], &["rec-42"]), &docs, Some(" 42 ")).await);
        assert!(!eval.check(&user(&[], &[]), &docs, Some("42")).await);
    }

    #[tokio::test]
    async fn test_requester_for() {
        let profile = UserProfile::new(3, "a@example.org", "A")
            .with_document_access(vec!["rec-42 ".into()]);
        let users = FakeUsers(HashMap::from([(3, profile)]));

        assert!(requester_for(&users, None).await.is_anonymous());
        assert!(requester_for(&users, Some(99)).await.is_anonymous());

        let requester = requester_for(&users, Some(3)).await;
        assert!(requester.user().unwrap().has_grant_for("rec-42"));
    }
}
