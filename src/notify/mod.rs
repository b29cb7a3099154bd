//! Notification batch for approved access requests.
//!
//! Each run picks up every grant that is approved but not yet communicated,
//! sends one email per user listing all of that user's grants and then marks
//! those grants as notified. A user is only marked after the email went out;
//! failures are isolated per user and retried on the next run.

pub mod i18n;
pub mod message;

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;

use crate::email::{validate_address, MailError, MailSender, Recipient, SenderIdentity};
use crate::models::{AccessGrantEntry, UserUid};
use crate::repository::{GrantRepository, RepositoryError, UserRepository};

use i18n::Translator;
pub use message::NotificationMessage;

/// Why a user could not be notified.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The owning user could not be loaded.
    #[error("User {user_id} could not be loaded: {reason}")]
    Lookup { user_id: UserUid, reason: String },

    /// The user's email address is unusable.
    #[error("User {user_id} has no valid email address ('{email}')")]
    Validation { user_id: UserUid, email: String },

    /// The mail could not be sent.
    #[error("Dispatch to user {user_id} failed: {source}")]
    Dispatch {
        user_id: UserUid,
        #[source]
        source: MailError,
    },

    /// The mail went out but the grants could not be marked.
    #[error("Marking grants of user {user_id} as notified failed: {source}")]
    Persistence {
        user_id: UserUid,
        #[source]
        source: RepositoryError,
    },
}

/// Tunables for a notification run.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub sender: SenderIdentity,
    /// Locale for users without a preference.
    pub default_locale: String,
    /// Users processed at the same time.
    pub concurrency: usize,
    /// Upper bound for one mail dispatch.
    pub dispatch_timeout: Duration,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            sender: SenderIdentity::default(),
            default_locale: "en".to_string(),
            concurrency: 1,
            dispatch_timeout: Duration::from_secs(60),
        }
    }
}

/// Summary of one notification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Users whose email was sent and whose grants were marked.
    pub users_notified: usize,
    /// Grants switched from pending to notified.
    pub grants_marked: usize,
    /// Users whose email could not be sent.
    pub email_failures: usize,
    /// Users skipped because they could not be loaded or had a bad address.
    pub users_skipped: usize,
    /// Users whose email went out but whose grants stayed pending.
    pub persistence_failures: usize,
    /// The pending grants could not be read at all.
    pub scan_failed: bool,
}

impl BatchResult {
    fn record(&mut self, outcome: &Result<u64, NotifyError>) {
        match outcome {
            Ok(marked) => {
                self.users_notified += 1;
                self.grants_marked += *marked as usize;
            }
            Err(NotifyError::Lookup { .. }) | Err(NotifyError::Validation { .. }) => {
                self.users_skipped += 1;
            }
            Err(NotifyError::Dispatch { .. }) => self.email_failures += 1,
            Err(NotifyError::Persistence { .. }) => self.persistence_failures += 1,
        }
    }
}

/// Sends "access granted" notifications and marks grants as notified.
pub struct GrantNotifier<G, U, M, T> {
    grants: G,
    users: U,
    mailer: M,
    translator: T,
    settings: NotifierSettings,
}

impl<G, U, M, T> GrantNotifier<G, U, M, T>
where
    G: GrantRepository,
    U: UserRepository,
    M: MailSender,
    T: Translator,
{
    pub fn new(grants: G, users: U, mailer: M, translator: T, settings: NotifierSettings) -> Self {
        Self {
            grants,
            users,
            mailer,
            translator,
            settings,
        }
    }

    pub fn grants(&self) -> &G {
        &self.grants
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Runs one notification batch.
    ///
    /// Must not overlap with another run against the same data.
    pub async fn run_batch(&self) -> BatchResult {
        let pending = match self.grants.find_pending_grouped_by_user().await {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!("Failed to load pending grants: {}", e);
                return BatchResult {
                    scan_failed: true,
                    ..BatchResult::default()
                };
            }
        };

        tracing::info!("{} user(s) with pending grant notifications", pending.len());

        let concurrency = self.settings.concurrency.max(1);
        let outcomes: Vec<Result<u64, NotifyError>> = stream::iter(pending)
            .filter(|(_, entries)| futures::future::ready(!entries.is_empty()))
            .map(|(user_id, entries)| async move {
                tracing::info!(
                    "Notify user {} about {} granted document(s)",
                    user_id,
                    entries.len()
                );
                self.notify_user(user_id, &entries).await
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut result = BatchResult::default();
        for outcome in &outcomes {
            match outcome {
                Ok(_) => {}
                Err(e @ NotifyError::Lookup { .. }) | Err(e @ NotifyError::Validation { .. }) => {
                    tracing::warn!("Skipping notification: {}", e)
                }
                Err(e @ NotifyError::Dispatch { .. }) => {
                    tracing::warn!("Notification not sent, will retry next run: {}", e)
                }
                Err(e @ NotifyError::Persistence { .. }) => tracing::error!("{}", e),
            }
            result.record(outcome);
        }

        tracing::info!(
            users_notified = result.users_notified,
            grants_marked = result.grants_marked,
            email_failures = result.email_failures,
            users_skipped = result.users_skipped,
            persistence_failures = result.persistence_failures,
            "Notification run finished"
        );

        result
    }

    /// Notifies one user and marks their grants.
    ///
    /// Grants are marked only after the mail was accepted by the sender.
    pub async fn notify_user(
        &self,
        user_id: UserUid,
        entries: &[AccessGrantEntry],
    ) -> Result<u64, NotifyError> {
        let profile = match self.users.find_by_id(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                return Err(NotifyError::Lookup {
                    user_id,
                    reason: "not found".to_string(),
                })
            }
            Err(e) => {
                return Err(NotifyError::Lookup {
                    user_id,
                    reason: e.to_string(),
                })
            }
        };

        let address =
            validate_address(&profile.email).map_err(|_| NotifyError::Validation {
                user_id,
                email: profile.email.clone(),
            })?;

        let locale = profile
            .locale
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.settings.default_locale);

        let message = message::render(
            &self.translator,
            locale,
            &profile.full_name,
            &self.settings.sender,
            entries,
        );
        let recipient = Recipient::new(address, profile.full_name.clone());

        let timeout = self.settings.dispatch_timeout;
        let sent = tokio::time::timeout(
            timeout,
            self.mailer
                .send(&recipient, &message.subject, &message.text, &message.html),
        )
        .await
        .unwrap_or(Err(MailError::Timeout(timeout)));

        if let Err(source) = sent {
            return Err(NotifyError::Dispatch { user_id, source });
        }

        self.grants
            .mark_notified(entries, Utc::now())
            .await
            .map_err(|source| NotifyError::Persistence { user_id, source })
    }
}
