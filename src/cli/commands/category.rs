//! `riskreg category` command - Category and risk category management
//!
//! Both taxonomies share one command; `--risk` switches to risk categories.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, or_dash, Session};
use crate::cli::table::{print_list, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::{Category, RiskCategory};

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories
    List(KindArgs),

    /// Add a category
    Add(AddArgs),

    /// Delete a category
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct KindArgs {
    /// Operate on risk categories instead of general categories
    #[arg(long)]
    pub risk: bool,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Category name
    pub name: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[command(flatten)]
    pub kind: KindArgs,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Category ID
    pub id: String,

    #[command(flatten)]
    pub kind: KindArgs,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: CategoryCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    match cmd {
        CategoryCommands::List(args) => run_list(args, &session, global),
        CategoryCommands::Add(args) => run_add(args, &session, global),
        CategoryCommands::Rm(args) => run_rm(args, &session, global),
    }
}

fn noun(kind: &KindArgs) -> &'static str {
    if kind.risk {
        "risk category"
    } else {
        "category"
    }
}

fn run_list(args: KindArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let format = session.format(global, OutputFormat::Tsv);
    let mut table = Table::new(&["ID", "Name", "Description"]);

    if args.risk {
        let categories = session.store.risk_categories()?;
        for category in &categories {
            table.row(
                &category.id,
                vec![
                    category.id.clone(),
                    category.name.clone(),
                    or_dash(category.description.as_deref()),
                ],
            );
        }
        print_list(&categories, &table, format, noun(&args), global.quiet)
    } else {
        let categories = session.store.categories()?;
        for category in &categories {
            table.row(
                &category.id,
                vec![
                    category.id.clone(),
                    category.name.clone(),
                    or_dash(category.description.as_deref()),
                ],
            );
        }
        print_list(&categories, &table, format, noun(&args), global.quiet)
    }
}

fn run_add(args: AddArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let (id, name) = if args.kind.risk {
        let category = session
            .store
            .add_risk_category(RiskCategory::new(args.name, args.description))?;
        (category.id, category.name)
    } else {
        let category = session
            .store
            .add_category(Category::new(args.name, args.description))?;
        (category.id, category.name)
    };

    if global.format == OutputFormat::Id || global.quiet {
        println!("{}", id);
    } else {
        println!(
            "{} Added {} {} {}",
            style("✓").green(),
            noun(&args.kind),
            style(&id).cyan(),
            name
        );
    }
    Ok(())
}

fn run_rm(args: RmArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let noun = noun(&args.kind);
    if !confirm(&format!("Delete {} {}?", noun, args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let removed = if args.kind.risk {
        session.store.delete_risk_category(&args.id)?
    } else {
        session.store.delete_category(&args.id)?
    };

    if removed {
        if !global.quiet {
            println!("{} Deleted {} {}", style("✓").green(), noun, style(&args.id).cyan());
        }
    } else if !global.quiet {
        println!("{} No {} with id {}", style("!").yellow(), noun, args.id);
    }
    Ok(())
}
