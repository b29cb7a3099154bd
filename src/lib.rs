//! Kitodo Access
//!
//! Decides whether a frontend user may view a digitized document and emails
//! users once their access requests have been approved.

pub mod access;
pub mod config;
pub mod db;
pub mod email;
pub mod models;
pub mod notify;
pub mod repository;

pub use access::{requester_for, AccessEvaluator, GroupAllowlist};
pub use models::{AccessGrantEntry, Document, Requester, RestrictionState, UserProfile};
pub use notify::{BatchResult, GrantNotifier, NotifierSettings, NotifyError};
pub use repository::RepositoryError;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
