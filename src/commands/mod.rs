mod check;
mod config_cmd;
mod notify;

use clap::ValueEnum;

pub use check::CheckCommand;
pub use config_cmd::ConfigCommand;
pub use notify::NotifyCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
