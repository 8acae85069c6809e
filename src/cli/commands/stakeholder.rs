//! `riskreg stakeholder` command - External stakeholder management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{confirm, not_found, or_dash, Session};
use crate::cli::table::{print_list, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::{ExternalStakeholder, ExternalStakeholderPatch};

#[derive(Subcommand, Debug)]
pub enum StakeholderCommands {
    /// List external stakeholders
    List,

    /// Add an external stakeholder (assigned the next STK### code)
    Add(AddArgs),

    /// Change an external stakeholder's details
    Edit(EditArgs),

    /// Delete an external stakeholder
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Name or role (e.g. "Quality Manager")
    pub name: String,

    #[arg(long, short = 's')]
    pub sector: Option<String>,

    #[arg(long, short = 'e')]
    pub email: Option<String>,

    #[arg(long, short = 'p')]
    pub phone: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Stakeholder ID
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    /// Sector (empty to clear)
    #[arg(long, short = 's')]
    pub sector: Option<String>,

    /// Email (empty to clear)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Phone (empty to clear)
    #[arg(long, short = 'p')]
    pub phone: Option<String>,

    /// Patch as a JSON object
    #[arg(long, conflicts_with_all = ["name", "sector", "email", "phone"])]
    pub json: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Stakeholder ID
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: StakeholderCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    match cmd {
        StakeholderCommands::List => run_list(&session, global),
        StakeholderCommands::Add(args) => run_add(args, &session, global),
        StakeholderCommands::Edit(args) => run_edit(args, &session, global),
        StakeholderCommands::Rm(args) => run_rm(args, &session, global),
    }
}

fn run_list(session: &Session, global: &GlobalOpts) -> Result<()> {
    let stakeholders = session.store.external_stakeholders()?;

    let mut table = Table::new(&["ID", "Name", "Sector", "Email", "Phone"]);
    for person in &stakeholders {
        table.row(
            &person.id,
            vec![
                person.id.clone(),
                person.name.clone(),
                or_dash(person.sector.as_deref()),
                or_dash(person.email.as_deref()),
                or_dash(person.phone.as_deref()),
            ],
        );
    }

    let format = session.format(global, OutputFormat::Tsv);
    print_list(&stakeholders, &table, format, "stakeholder", global.quiet)
}

fn run_add(args: AddArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let mut person = ExternalStakeholder::new(args.name);
    person.sector = args.sector;
    person.email = args.email;
    person.phone = args.phone;
    let person = session.store.add_external_stakeholder(person)?;

    if global.format == OutputFormat::Id || global.quiet {
        println!("{}", person.id);
    } else {
        println!(
            "{} Added stakeholder {} {}",
            style("✓").green(),
            style(&person.id).cyan(),
            person.name
        );
    }
    Ok(())
}

fn run_edit(args: EditArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let patch = match args.json {
        Some(ref json) => serde_json::from_str::<ExternalStakeholderPatch>(json).into_diagnostic()?,
        None => ExternalStakeholderPatch {
            name: args.name,
            sector: args.sector,
            email: args.email,
            phone: args.phone,
        },
    };

    let person = session
        .store
        .update_external_stakeholder(&args.id, patch)?
        .ok_or_else(|| not_found("stakeholder", &args.id))?;

    if !global.quiet {
        println!(
            "{} Updated stakeholder {} {}",
            style("✓").green(),
            style(&person.id).cyan(),
            person.name
        );
    }
    Ok(())
}

fn run_rm(args: RmArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    if !confirm(&format!("Delete stakeholder {}?", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    if session.store.delete_external_stakeholder(&args.id)? {
        if !global.quiet {
            println!("{} Deleted stakeholder {}", style("✓").green(), style(&args.id).cyan());
        }
    } else if !global.quiet {
        println!("{} No stakeholder with id {}", style("!").yellow(), args.id);
    }
    Ok(())
}
