//! Message catalog for notification texts.
//!
//! # File Format
//!
//! ```text
//! de:
//!   access_granted.email.subject: "Zugriff freigegeben"
//! en:
//!   access_granted.email.subject: "Access granted"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const KEY_SUBJECT: &str = "access_granted.email.subject";
pub const KEY_GREETING: &str = "access_granted.email.greeting";
pub const KEY_INTRO: &str = "access_granted.email.intro";
pub const KEY_CLOSING: &str = "access_granted.email.closing";
pub const KEY_SIGNATURE: &str = "access_granted.email.signature";

/// Resolves translation keys for a locale.
pub trait Translator {
    fn translate(&self, key: &str, locale: &str) -> String;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read translations '{}': {}", .0.display(), .1)]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse translations '{}': {}", .0.display(), .1)]
    Parse(PathBuf, serde_yaml::Error),
}

/// In-memory catalog: locale -> key -> message.
#[derive(Debug, Clone)]
pub struct Catalog {
    default_locale: String,
    messages: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    /// Catalog holding the built-in English and German messages.
    pub fn builtin(default_locale: impl Into<String>) -> Self {
        let mut messages = HashMap::new();
        messages.insert("en".to_string(), to_map(BUILTIN_EN));
        messages.insert("de".to_string(), to_map(BUILTIN_DE));

        Self {
            default_locale: default_locale.into(),
            messages,
        }
    }

    /// Built-in messages overlaid with the entries from a YAML file.
    pub fn load(default_locale: impl Into<String>, path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Read(path.to_path_buf(), e))?;
        let overrides: HashMap<String, HashMap<String, String>> = serde_yaml::from_str(&contents)
            .map_err(|e| CatalogError::Parse(path.to_path_buf(), e))?;

        let mut catalog = Self::builtin(default_locale);
        for (locale, entries) in overrides {
            catalog.messages.entry(locale).or_default().extend(entries);
        }
        Ok(catalog)
    }

    fn lookup(&self, key: &str, locale: &str) -> Option<&str> {
        self.messages
            .get(locale)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }
}

impl Translator for Catalog {
    /// Falls back from `de-DE` to `de`, then to the default locale, then to
    /// the key itself.
    fn translate(&self, key: &str, locale: &str) -> String {
        let primary = locale.split(['-', '_']).next().unwrap_or(locale);

        self.lookup(key, locale)
            .or_else(|| self.lookup(key, primary))
            .or_else(|| self.lookup(key, &self.default_locale))
            .map(str::to_string)
            .unwrap_or_else(|| {
                tracing::warn!("Missing translation for '{}' ({})", key, locale);
                key.to_string()
            })
    }
}

fn to_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const BUILTIN_EN: &[(&str, &str)] = &[
    (KEY_SUBJECT, "Access to requested documents granted"),
    (KEY_GREETING, "Dear {name},"),
    (
        KEY_INTRO,
        "your request for access has been approved. You can now view the following documents:",
    ),
    (KEY_CLOSING, "Please sign in to the digital collections to view them."),
    (KEY_SIGNATURE, "Kind regards"),
];

const BUILTIN_DE: &[(&str, &str)] = &[
    (KEY_SUBJECT, "Zugriff auf angefragte Dokumente freigegeben"),
    (KEY_GREETING, "Guten Tag {name},"),
    (
        KEY_INTRO,
        "Ihre Zugriffsanfrage wurde bewilligt. Sie können nun folgende Dokumente einsehen:",
    ),
    (
        KEY_CLOSING,
        "Bitte melden Sie sich in den Digitalen Sammlungen an, um sie aufzurufen.",
    ),
    (KEY_SIGNATURE, "Mit freundlichen Grüßen"),
];
