use core::fmt;

use anyhow::{Context, Result, bail};

use blogsync_infra::DEFAULT_PAGE_SIZE;
use blogsync_observability::LogFormat;

pub const DATABASE_URL_VAR: &str = "BLOGSYNC_DATABASE_URL";
pub const LOG_VAR: &str = "BLOGSYNC_LOG";
pub const LOG_FORMAT_VAR: &str = "BLOGSYNC_LOG_FORMAT";
pub const DEFAULT_PAGE_SIZE_VAR: &str = "BLOGSYNC_DEFAULT_PAGE_SIZE";

const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db?mode=rwc";

/// Where the authoritative copy of posts lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Process-local table; nothing survives a restart.
    Memory,
    /// SQLite database at the given connection URL.
    Sqlite(String),
}

impl Storage {
    fn from_url(url: &str) -> Self {
        match url.trim() {
            "memory" => Self::Memory,
            other => Self::Sqlite(other.to_string()),
        }
    }
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite(url) => f.write_str(url),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: Storage,
    pub log_filter: String,
    pub log_format: LogFormat,
    /// Page size the query service uses when a caller passes `limit <= 0`.
    pub default_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: Storage::from_url(DEFAULT_DATABASE_URL),
            log_filter: "info".to_string(),
            log_format: LogFormat::Pretty,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup` instead of the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let storage = lookup(DATABASE_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(|v| Storage::from_url(&v))
            .unwrap_or(defaults.storage);

        let log_filter = lookup(LOG_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let log_format = match lookup(LOG_FORMAT_VAR) {
            Some(raw) => raw
                .parse::<LogFormat>()
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?,
            None => defaults.log_format,
        };

        let default_page_size = match lookup(DEFAULT_PAGE_SIZE_VAR) {
            Some(raw) => {
                let size: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid {DEFAULT_PAGE_SIZE_VAR} '{raw}'"))?;
                if size == 0 {
                    bail!("{DEFAULT_PAGE_SIZE_VAR} must be greater than zero");
                }
                size
            }
            None => defaults.default_page_size,
        };

        Ok(Self {
            storage,
            log_filter,
            log_format,
            default_page_size,
        })
    }

    /// Logs the effective configuration. Call once, after logging is initialised.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  {DATABASE_URL_VAR}: {}", self.storage);
        tracing::info!("  {LOG_VAR}: {}", self.log_filter);
        tracing::info!("  {LOG_FORMAT_VAR}: {}", self.log_format);
        tracing::info!("  {DEFAULT_PAGE_SIZE_VAR}: {}", self.default_page_size);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.storage, Storage::Sqlite(DEFAULT_DATABASE_URL.into()));
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn memory_url_selects_in_memory_storage() {
        let config = AppConfig::from_lookup(lookup_from(&[(DATABASE_URL_VAR, "memory")])).unwrap();
        assert_eq!(config.storage, Storage::Memory);
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_VAR, "sqlite::memory:"),
            (LOG_VAR, "blogsync=debug"),
            (LOG_FORMAT_VAR, "json"),
            (DEFAULT_PAGE_SIZE_VAR, "25"),
        ]))
        .unwrap();

        assert_eq!(config.storage, Storage::Sqlite("sqlite::memory:".into()));
        assert_eq!(config.log_filter, "blogsync=debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.default_page_size, 25);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup_from(&[(LOG_FORMAT_VAR, "xml")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[(DEFAULT_PAGE_SIZE_VAR, "ten")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[(DEFAULT_PAGE_SIZE_VAR, "0")])).is_err());
    }
}
