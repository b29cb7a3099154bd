//! Kitodo Access CLI
//!
//! Checks document access for frontend users and sends "access granted"
//! notifications.
//!
//! # Usage
//!
//! ```bash
//! kitodo-access check --document 42 --user 7
//! kitodo-access notify
//! kitodo-access notify --dry-run
//! kitodo-access config show
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: kitodo_access=info)
//! - `KITODO_ACCESS_DATABASE_PATH`: SQLite database path
//! - `KITODO_ACCESS_GROUPS`: Comma separated group ids with access to all documents
//! - `KITODO_ACCESS_SMTP_HOST`, `KITODO_ACCESS_SMTP_PORT`,
//!   `KITODO_ACCESS_SMTP_USER`, `KITODO_ACCESS_SMTP_PASS`: SMTP settings

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CheckCommand, ConfigCommand, NotifyCommand};
use kitodo_access::access::AccessEvaluator;
use kitodo_access::config::Config;
use kitodo_access::db::{
    init_db, SqliteDocumentRepository, SqliteGrantRepository, SqliteUserRepository,
};
use kitodo_access::email::SmtpMailer;
use kitodo_access::notify::i18n::Catalog;
use kitodo_access::notify::GrantNotifier;

#[derive(Parser)]
#[command(name = "kitodo-access")]
#[command(version)]
#[command(about = "Document access checks and grant notifications", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a user may view a document
    Check(CheckCommand),

    /// Email users about newly granted documents
    Notify(NotifyCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kitodo_access=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::default_config_path);

    // Load configuration
    let config = Config::load(Some(config_path.clone()))?;

    match cli.command {
        Some(Commands::Check(cmd)) => {
            let pool = init_db(&config.database_path).await?;
            let documents = SqliteDocumentRepository::new(pool.clone());
            let users = SqliteUserRepository::new(pool);
            let evaluator = AccessEvaluator::new(config.allowlist());
            cmd.run(&evaluator, &documents, &users).await?;
        }
        Some(Commands::Notify(cmd)) => {
            let pool = init_db(&config.database_path).await?;
            let catalog = match &config.translations_path {
                Some(path) => Catalog::load(&config.default_locale, path)?,
                None => Catalog::builtin(&config.default_locale),
            };
            let mailer = SmtpMailer::new(config.smtp.clone(), config.sender.clone());
            let notifier = GrantNotifier::new(
                SqliteGrantRepository::new(pool.clone()),
                SqliteUserRepository::new(pool),
                mailer,
                catalog,
                config.notifier_settings(),
            );
            cmd.run(&notifier).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config, &config_path)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
