use clap::Args;

use kitodo_access::email::MailSender;
use kitodo_access::notify::i18n::Translator;
use kitodo_access::notify::{BatchResult, GrantNotifier};
use kitodo_access::repository::{GrantRepository, PendingGrants, UserRepository};

use super::OutputFormat;

#[derive(Args)]
pub struct NotifyCommand {
    /// List pending notifications without sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl NotifyCommand {
    pub async fn run<G, U, M, T>(
        &self,
        notifier: &GrantNotifier<G, U, M, T>,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        G: GrantRepository,
        U: UserRepository,
        M: MailSender,
        T: Translator,
    {
        if self.dry_run {
            let pending = notifier.grants().find_pending_grouped_by_user().await?;
            match self.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pending)?),
                OutputFormat::Text => print!("{}", format_pending(&pending)),
            }
            return Ok(());
        }

        let result = notifier.run_batch().await;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Text => print!("{}", format_summary(&result)),
        }

        if result.scan_failed {
            return Err("could not read pending grants".into());
        }
        Ok(())
    }
}

fn format_pending(pending: &PendingGrants) -> String {
    if pending.is_empty() {
        return "No pending notifications.\n".to_string();
    }

    let mut out = String::new();
    for (user_id, entries) in pending {
        out.push_str(&format!("User {} ({} document(s))\n", user_id, entries.len()));
        for entry in entries {
            out.push_str(&format!("  - {} ({})\n", entry.display_title(), entry.record_id));
        }
    }
    out
}

fn format_summary(result: &BatchResult) -> String {
    let mut out = format!(
        "Users notified:  {}\nGrants marked:   {}\nEmail failures:  {}\nUsers skipped:   {}\n",
        result.users_notified, result.grants_marked, result.email_failures, result.users_skipped
    );
    if result.persistence_failures > 0 {
        out.push_str(&format!(
            "Not persisted:   {} (will be notified again)\n",
            result.persistence_failures
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitodo_access::models::AccessGrantEntry;

    #[test]
    fn test_format_pending_empty() {
        assert_eq!(format_pending(&PendingGrants::new()), "No pending notifications.\n");
    }

    #[test]
    fn test_format_pending() {
        let mut pending = PendingGrants::new();
        pending.insert(
            3,
            vec![
                AccessGrantEntry::pending(1, 3, "rec-1").with_title("Chronik"),
                AccessGrantEntry::pending(2, 3, "rec-2"),
            ],
        );

        let out = format_pending(&pending);
        assert!(out.starts_with("User 3 (2 document(s))"));
        assert!(out.contains("  - Chronik (rec-1)"));
        assert!(out.contains("  - rec-2 (rec-2)"));
    }

    #[test]
    fn test_format_summary() {
        let result = BatchResult {
            users_notified: 1,
            grants_marked: 1,
            email_failures: 1,
            ..BatchResult::default()
        };

        let out = format_summary(&result);
        assert!(out.contains("Users notified:  1"));
        assert!(out.contains("Email failures:  1"));
        assert!(!out.contains("Not persisted"));
    }

    #[test]
    fn test_format_summary_persistence_failures() {
        let result = BatchResult {
            users_notified: 1,
            persistence_failures: 1,
            ..BatchResult::default()
        };

        assert!(format_summary(&result).contains("Not persisted:   1"));
    }
}
