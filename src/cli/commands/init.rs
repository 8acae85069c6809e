//! `riskreg init` command - Initialize a new register workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::workspace::{Workspace, WorkspaceError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Start with an empty register instead of the demo dataset
    #[arg(long)]
    pub empty: bool,

    /// Overwrite an existing workspace (replaces its document)
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path, args.empty)
    } else {
        Workspace::init(&path, args.empty)
    };

    match workspace {
        Ok(workspace) => {
            println!(
                "{} Initialized risk register at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!(
                "  {} {}",
                style(".riskreg/config.yaml").dim(),
                style("workspace configuration").dim()
            );
            println!(
                "  {} {}",
                style(".riskreg/db.json").dim(),
                if args.empty {
                    style("empty register").dim()
                } else {
                    style("register seeded with demo data").dim()
                }
            );
            println!();
            println!("Next steps:");
            println!("  {} Record a risk", style("riskreg risk new").yellow());
            println!("  {} List open risks", style("riskreg risk list --status open").yellow());
            println!("  {} See the summary", style("riskreg dashboard").yellow());
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} Risk register already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("riskreg init --force").yellow());
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
