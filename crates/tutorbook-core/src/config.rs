use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Environment variable overriding `[attendance] purge_stale`.
pub const PURGE_STALE_ENV: &str = "TUTORBOOK_PURGE_STALE_ATTENDANCE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookConfig {
    #[serde(default)]
    pub attendance: AttendanceConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceConfig {
    /// Drop attendance entries of students no longer on the roster when a
    /// session is synchronized. Off by default: entries are kept as history.
    #[serde(default)]
    pub purge_stale: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cap on the number of sessions returned by upcoming-session views.
    #[serde(default)]
    pub upcoming_limit: Option<usize>,
}

/// Load `.tutorbook/config.toml` under `project_root`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_book_config(project_root: &Path) -> Result<BookConfig> {
    let path = project_root.join(".tutorbook/config.toml");
    if !path.exists() {
        return Ok(BookConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<BookConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Project config with environment overrides applied.
///
/// # Errors
///
/// Returns an error if the project config cannot be loaded or an override
/// value is not a recognizable boolean.
pub fn resolve_config(project_root: &Path) -> Result<BookConfig> {
    resolve_with_override(project_root, env::var(PURGE_STALE_ENV).ok())
}

fn resolve_with_override(project_root: &Path, purge_env: Option<String>) -> Result<BookConfig> {
    let mut config = load_book_config(project_root)?;
    if let Some(purge) = parse_flag(purge_env)? {
        tracing::debug!(purge, "attendance purge overridden from environment");
        config.attendance.purge_stale = purge;
    }
    Ok(config)
}

fn parse_flag(raw: Option<String>) -> Result<Option<bool>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => bail!("{PURGE_STALE_ENV} must be a boolean, got '{other}'"),
    }
}
