use clap::Args;
use serde::Serialize;

use kitodo_access::access::{requester_for, AccessEvaluator};
use kitodo_access::models::UserUid;
use kitodo_access::repository::{DocumentRepository, UserRepository};

use super::OutputFormat;

#[derive(Args)]
pub struct CheckCommand {
    /// Document id to check
    #[arg(long, short)]
    pub document: Option<String>,

    /// Frontend user id (anonymous if omitted)
    #[arg(long, short)]
    pub user: Option<UserUid>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Decision<'a> {
    document: Option<&'a str>,
    user: Option<UserUid>,
    granted: bool,
}

impl CheckCommand {
    pub async fn run<D, U>(
        &self,
        evaluator: &AccessEvaluator,
        documents: &D,
        users: &U,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        D: DocumentRepository,
        U: UserRepository,
    {
        let requester = requester_for(users, self.user).await;
        let granted = evaluator
            .check(&requester, documents, self.document.as_deref())
            .await;

        match self.format {
            OutputFormat::Json => {
                let decision = Decision {
                    document: self.document.as_deref(),
                    user: self.user,
                    granted,
                };
                println!("{}", serde_json::to_string_pretty(&decision)?);
            }
            OutputFormat::Text => println!("{}", decision_label(granted)),
        }

        Ok(())
    }
}

fn decision_label(granted: bool) -> &'static str {
    if granted {
        "granted"
    } else {
        "denied"
    }
}
