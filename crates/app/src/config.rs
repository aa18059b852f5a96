use std::path::{Path, PathBuf};

use training_core::model::LearnerId;

/// Settings read from the environment (and `.env`) before flags are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub learner: Option<LearnerId>,
    pub log_filter: Option<String>,
}

impl Config {
    pub const DEFAULT_DB_URL: &'static str = "sqlite://training.sqlite3";

    /// Load `.env` if present, then read `TRAINING_*` variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_url = lookup("TRAINING_DB_URL")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| Self::DEFAULT_DB_URL.to_owned(), normalize_sqlite_url);
        let learner = lookup("TRAINING_LEARNER_ID").and_then(|v| v.parse::<LearnerId>().ok());
        let log_filter = lookup("TRAINING_LOG").filter(|v| !v.trim().is_empty());
        Self {
            db_url,
            learner,
            log_filter,
        }
    }
}

/// Turn `sqlite:relative.db` style URLs into absolute `sqlite://` URLs.
pub fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:"
        || trimmed.starts_with("sqlite://")
        || trimmed.starts_with("sqlite:file:")
    {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and parent directories) for a file-backed URL.
pub fn prepare_sqlite_file(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Ok(());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}
