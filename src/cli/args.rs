//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    category::CategoryCommands, company::CompanyCommands, completions::CompletionsArgs,
    config::ConfigCommands, dashboard::DashboardArgs, demo::DemoArgs, group::GroupCommands,
    init::InitArgs, project::ProjectCommands, risk::RiskCommands, staff::StaffCommands,
    stakeholder::StakeholderCommands,
};

#[derive(Parser)]
#[command(name = "riskreg")]
#[command(author, version, about = "Risk register and remediation tracking")]
#[command(long_about = "Record risks, follow their lifecycle, spawn remediation projects and keep an audit trail of every change, all in a single JSON document.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Register document to use, bypassing workspace discovery
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Workspace root (default: auto-detect by finding .riskreg/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new register workspace
    Init(InitArgs),

    /// Company management
    #[command(subcommand)]
    Company(CompanyCommands),

    /// Internal staff management
    #[command(subcommand)]
    Staff(StaffCommands),

    /// Stakeholder group management
    #[command(subcommand)]
    Group(GroupCommands),

    /// External stakeholder management
    #[command(subcommand)]
    Stakeholder(StakeholderCommands),

    /// Category and risk category management
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Risk management
    #[command(subcommand)]
    Risk(RiskCommands),

    /// Remediation project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show aggregate counts
    Dashboard(DashboardArgs),

    /// Merge the extended demo dataset into the register
    Demo(DemoArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
