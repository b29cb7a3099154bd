use clap::{Args, Subcommand};
use std::path::Path;

use kitodo_access::config::Config;

use super::OutputFormat;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        config_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => print!("{}", render_text(config, config_path)),
                }
                Ok(())
            }
        }
    }
}

fn render_text(config: &Config, config_path: &Path) -> String {
    let mut out = String::new();
    out.push_str("Configuration\n");
    out.push_str("=============\n\n");

    if config_path.exists() {
        out.push_str(&format!("Config file: {}\n\n", config_path.display()));
    } else {
        out.push_str(&format!(
            "Config file: {} (not found)\n\n",
            config_path.display()
        ));
    }

    out.push_str(&format!(
        "database_path: {}\n",
        config.database_path.display()
    ));
    if config.access_groups.is_empty() {
        out.push_str("access_groups: (none)\n");
    } else {
        out.push_str(&format!(
            "access_groups: {}\n",
            config.access_groups.join(",")
        ));
    }
    out.push_str(&format!("default_locale: {}\n", config.default_locale));
    if let Some(path) = &config.translations_path {
        out.push_str(&format!("translations_path: {}\n", path.display()));
    }
    out.push_str(&format!(
        "sender: {} <{}>\n",
        config.sender.name, config.sender.email
    ));
    out.push_str(&format!(
        "smtp: {}:{} (tls: {}, user: {}, password: {})\n",
        config.smtp.host,
        config.smtp.port,
        config.smtp.tls,
        config.smtp.user.as_deref().unwrap_or("-"),
        if config.smtp.pass.is_some() { "set" } else { "unset" }
    ));
    out.push_str(&format!(
        "notify.concurrency: {}\n",
        config.notify.concurrency
    ));
    out
}
