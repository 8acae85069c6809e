//! `riskreg config` command - Configuration management
//!
//! CLI preferences live in YAML files (global and per-workspace); register
//! settings such as the archive delay live in the document itself.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::{print_structured, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Workspace};
use crate::entities::SettingsPatch;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a CLI configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., author, project_archive_minutes)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

/// Keys kept in the YAML config files
const FILE_KEYS: &[(&str, &str)] = &[
    ("author", "Responsible recorded on occurrences reported without one"),
    (
        "default_format",
        "Default output format (yaml, json, tsv, csv, md, id)",
    ),
    ("data_file", "Register document to open instead of .riskreg/db.json"),
];

/// Keys kept in the register document
const REGISTER_KEYS: &[(&str, &str)] = &[(
    "project_archive_minutes",
    "Minutes a done project stays visible before archive-sweep archives it",
)];

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn workspace(global: &GlobalOpts) -> Option<Workspace> {
    match global.project {
        Some(ref root) => Workspace::discover_from(root).ok(),
        None => Workspace::discover().ok(),
    }
}

fn is_register_key(key: &str) -> bool {
    REGISTER_KEYS.iter().any(|(k, _)| *k == key)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    if let Some(ref key) = args.key {
        let value = if is_register_key(key) {
            let session = Session::open(global)?;
            Some(session.store.settings()?.project_archive_minutes.to_string())
        } else {
            let config = Config::load(workspace(global).as_ref());
            get_config_value(&config, key)
        };
        return match value {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    let config = Config::load(workspace(global).as_ref());
    // Register settings need a document; show the CLI layer regardless
    let settings = Session::open(global)
        .ok()
        .and_then(|session| session.store.settings().ok());

    if matches!(global.format, OutputFormat::Json | OutputFormat::Yaml) {
        let value = serde_json::json!({
            "author": config.author,
            "defaultFormat": config.default_format,
            "dataFile": config.data_file,
            "register": settings,
        });
        return print_structured(&value, global.format);
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    print_config_value("author", config.author.as_deref());
    print_config_value("default_format", config.default_format.as_deref());
    let data_file = config.data_file.as_ref().map(|p| p.display().to_string());
    print_config_value("data_file", data_file.as_deref());

    println!();
    println!("{}", style("Register Settings").bold().underlined());
    println!();
    let minutes = settings.map(|s| s.project_archive_minutes.to_string());
    print_config_value("project_archive_minutes", minutes.as_deref());

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (RISKREG_AUTHOR, RISKREG_DATA)");
    println!("  2. Workspace config (.riskreg/config.yaml)");
    println!("  3. Global config (~/.config/riskreg/config.yaml)");
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    if is_register_key(&args.key) {
        let minutes: u32 = args.value.parse().map_err(|_| {
            miette::miette!(
                "project_archive_minutes must be a whole number of minutes, got '{}'",
                args.value
            )
        })?;
        let session = Session::open(global)?;
        session.store.update_settings(SettingsPatch {
            project_archive_minutes: Some(minutes),
        })?;
        if !global.quiet {
            println!(
                "{} Set {} {} {} in register",
                style("✓").green(),
                style(&args.key).cyan(),
                style("→").dim(),
                style(minutes).yellow()
            );
        }
        return Ok(());
    }

    if !FILE_KEYS.iter().any(|(k, _)| *k == args.key) {
        return Err(miette::miette!(
            help = "run 'riskreg config keys' to list valid keys",
            "Unknown configuration key '{}'",
            args.key
        ));
    }

    let config_path = config_path(args.global, global)?;
    let mut config_map = read_mapping(&config_path)?;
    config_map.insert(
        serde_yml::Value::String(args.key.clone()),
        serde_yml::Value::String(args.value.clone()),
    );
    write_mapping(&config_path, config_map)?;

    if !global.quiet {
        let scope = if args.global { "global" } else { "workspace" };
        println!(
            "{} Set {} {} {} in {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            style("→").dim(),
            style(&args.value).yellow(),
            scope
        );
    }
    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    if is_register_key(&args.key) {
        return Err(miette::miette!(
            help = "use 'riskreg config set' to change it",
            "'{}' is a register setting and cannot be unset",
            args.key
        ));
    }

    let config_path = config_path(args.global, global)?;
    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    if config_map
        .remove(serde_yml::Value::String(args.key.clone()))
        .is_none()
    {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }
    write_mapping(&config_path, config_map)?;

    if !global.quiet {
        let scope = if args.global { "global" } else { "workspace" };
        println!(
            "{} Removed {} from {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            scope
        );
    }
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();

    match Config::global_config_path() {
        Some(path) => print_path("Global:", &path),
        None => println!("  {} {}", style("Global:").cyan(), style("(unavailable)").dim()),
    }

    match workspace(global) {
        Some(ws) => {
            print_path("Workspace:", &ws.config_path());
            print_path("Register:", &ws.document_path());
        }
        None => println!(
            "  {} {}",
            style("Workspace:").cyan(),
            style("(not in a riskreg workspace)").dim()
        ),
    }
    Ok(())
}

fn print_path(label: &str, path: &std::path::Path) {
    let state = if path.exists() {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("  {:<11} {} {}", style(label).cyan(), path.display(), state);
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in FILE_KEYS.iter().chain(REGISTER_KEYS) {
        println!("  {:<24} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'riskreg config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

fn config_path(global_scope: bool, global: &GlobalOpts) -> Result<PathBuf> {
    if global_scope {
        Config::global_config_path()
            .ok_or_else(|| miette::miette!("Could not determine global config directory"))
    } else {
        workspace(global)
            .map(|ws| ws.config_path())
            .ok_or_else(|| {
                miette::miette!(
                    help = "pass --global, or run 'riskreg init' first",
                    "Not in a riskreg workspace"
                )
            })
    }
}

fn read_mapping(path: &std::path::Path) -> Result<serde_yml::Mapping> {
    if !path.exists() {
        return Ok(serde_yml::Mapping::new());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    match serde_yml::from_str::<serde_yml::Value>(&content) {
        Ok(serde_yml::Value::Mapping(map)) => Ok(map),
        // Comment-only template or empty file
        Ok(serde_yml::Value::Null) => Ok(serde_yml::Mapping::new()),
        Ok(_) => Err(miette::miette!(
            "Config file is not a YAML mapping: {}",
            path.display()
        )),
        Err(e) => Err(miette::miette!("Invalid config file {}: {}", path.display(), e)),
    }
}

fn write_mapping(path: &std::path::Path, map: serde_yml::Mapping) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&serde_yml::Value::Mapping(map)).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()?;
    tracing::debug!(path = %path.display(), "wrote config");
    Ok(())
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "author" => config.author.clone(),
        "default_format" => config.default_format.clone(),
        "data_file" => config.data_file.as_ref().map(|p| p.display().to_string()),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_mapping_accepts_comment_only_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "# author: someone\n").unwrap();
        assert!(read_mapping(&path).unwrap().is_empty());
    }

    #[test]
    fn test_write_then_read_mapping() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.yaml");
        let mut map = serde_yml::Mapping::new();
        map.insert("author".into(), "Ana".into());
        write_mapping(&path, map).unwrap();

        let config: Config = serde_yml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.author.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_register_keys_are_separate() {
        assert!(is_register_key("project_archive_minutes"));
        assert!(!is_register_key("author"));
    }
}
