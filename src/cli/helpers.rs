//! Shared helper functions for CLI commands
//!
//! Store/config resolution, output-format selection and small string
//! utilities used across the command modules.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::ValueEnum;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Store, Workspace};

/// Everything a command needs to talk to the register
pub struct Session {
    pub store: Store,
    pub config: Config,
}

impl Session {
    /// Resolve the document and open the store.
    ///
    /// Precedence: `--data`, then `data_file` from config/environment, then
    /// the discovered workspace's `.riskreg/db.json`.
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let workspace = match global.project {
            Some(ref root) => Workspace::discover_from(root),
            None => Workspace::discover(),
        };
        let config = Config::load(workspace.as_ref().ok());

        let path = match (global.data.clone(), config.data_file.clone(), workspace) {
            (Some(path), _, _) => path,
            (None, Some(path), _) => path,
            (None, None, Ok(workspace)) => workspace.document_path(),
            (None, None, Err(e)) => return Err(miette::miette!("{}", e)),
        };

        tracing::debug!(path = %path.display(), "opening register");
        Ok(Self {
            store: Store::open(path),
            config,
        })
    }

    /// Output format for this invocation; `Auto` resolves through the
    /// configured default and then `fallback`
    pub fn format(&self, global: &GlobalOpts, fallback: OutputFormat) -> OutputFormat {
        resolve_format(global.format, self.config.default_format.as_deref(), fallback)
    }
}

fn resolve_format(
    requested: OutputFormat,
    configured: Option<&str>,
    fallback: OutputFormat,
) -> OutputFormat {
    if requested != OutputFormat::Auto {
        return requested;
    }
    configured
        .and_then(|name| OutputFormat::from_str(name, true).ok())
        .filter(|f| *f != OutputFormat::Auto)
        .unwrap_or(fallback)
}

/// Ask before a destructive action; `--yes` skips the prompt
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Print a single record as JSON or YAML
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Error for an identifier that matched nothing
pub fn not_found(kind: &str, id: &str) -> miette::Report {
    miette::miette!("No {} found matching '{}'", kind, id)
}

/// Parse a `YYYY-MM-DD` date into midnight UTC
pub fn parse_date(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {} (expected YYYY-MM-DD)", s, e))?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::default())))
}

/// Format a string ID for display, truncating if too long
///
/// ULID-based ids are 30 characters; they are cut to 13 chars plus "...".
pub fn format_short_id_str(id: &str) -> String {
    if id.chars().count() > 16 {
        format!("{}...", id.chars().take(13).collect::<String>())
    } else {
        id.to_string()
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}
