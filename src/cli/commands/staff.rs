//! `riskreg staff` command - Internal staff management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{confirm, not_found, or_dash, Session};
use crate::cli::table::{print_list, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Lookup, NameLookup};
use crate::entities::{Staff, StaffPatch};

#[derive(Subcommand, Debug)]
pub enum StaffCommands {
    /// List staff members
    List(ListArgs),

    /// Add a staff member (assigned the next COL### code)
    Add(AddArgs),

    /// Change a staff member's details
    Edit(EditArgs),

    /// Delete a staff member
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only staff of this company
    #[arg(long, short = 'c')]
    pub company: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Full name
    pub name: String,

    #[arg(long, short = 'e', default_value = "")]
    pub email: String,

    /// Company ID
    #[arg(long, short = 'c', default_value = "")]
    pub company: String,

    #[arg(long, short = 'd')]
    pub department: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Staff ID
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, short = 'e')]
    pub email: Option<String>,

    #[arg(long, short = 'c')]
    pub company: Option<String>,

    /// Department (empty to clear)
    #[arg(long, short = 'd')]
    pub department: Option<String>,

    /// Patch as a JSON object (e.g. '{"department": "IT"}')
    #[arg(long, conflicts_with_all = ["name", "email", "company", "department"])]
    pub json: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Staff ID
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: StaffCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    match cmd {
        StaffCommands::List(args) => run_list(args, &session, global),
        StaffCommands::Add(args) => run_add(args, &session, global),
        StaffCommands::Edit(args) => run_edit(args, &session, global),
        StaffCommands::Rm(args) => run_rm(args, &session, global),
    }
}

fn run_list(args: ListArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let doc = session.store.document()?;
    let staff: Vec<Staff> = doc
        .staff
        .iter()
        .filter(|s| args.company.as_ref().map_or(true, |c| &s.company_id == c))
        .cloned()
        .collect();

    let mut table = Table::new(&["ID", "Name", "Email", "Company", "Department"]);
    for person in &staff {
        let company = doc
            .name_of(Lookup::Company, &person.company_id)
            .unwrap_or(&person.company_id);
        table.row(
            &person.id,
            vec![
                person.id.clone(),
                person.name.clone(),
                or_dash(Some(person.email.as_str())),
                or_dash(Some(company)),
                or_dash(person.department.as_deref()),
            ],
        );
    }

    let format = session.format(global, OutputFormat::Tsv);
    print_list(&staff, &table, format, "staff member", global.quiet)
}

fn run_add(args: AddArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let mut person = Staff::new(args.name, args.email, args.company);
    person.department = args.department;
    let person = session.store.add_staff(person)?;

    if global.format == OutputFormat::Id || global.quiet {
        println!("{}", person.id);
    } else {
        println!(
            "{} Added staff member {} {}",
            style("✓").green(),
            style(&person.id).cyan(),
            person.name
        );
    }
    Ok(())
}

fn run_edit(args: EditArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let patch = match args.json {
        Some(ref json) => serde_json::from_str::<StaffPatch>(json).into_diagnostic()?,
        None => StaffPatch {
            name: args.name,
            email: args.email,
            company_id: args.company,
            department: args.department,
        },
    };

    let person = session
        .store
        .update_staff(&args.id, patch)?
        .ok_or_else(|| not_found("staff member", &args.id))?;

    if !global.quiet {
        println!(
            "{} Updated staff member {} {}",
            style("✓").green(),
            style(&person.id).cyan(),
            person.name
        );
    }
    Ok(())
}

fn run_rm(args: RmArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    if !confirm(&format!("Delete staff member {}?", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    if session.store.delete_staff(&args.id)? {
        if !global.quiet {
            println!("{} Deleted staff member {}", style("✓").green(), style(&args.id).cyan());
        }
    } else if !global.quiet {
        println!("{} No staff member with id {}", style("!").yellow(), args.id);
    }
    Ok(())
}
