//! `riskreg company` command - Company management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, Session};
use crate::cli::table::{print_list, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::Company;

#[derive(Subcommand, Debug)]
pub enum CompanyCommands {
    /// List companies
    List,

    /// Add a company
    Add(AddArgs),

    /// Delete a company (references to it are left as-is)
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Company name
    pub name: String,

    /// Explicit identifier (default: next EMP### code)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Company ID
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: CompanyCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    match cmd {
        CompanyCommands::List => run_list(&session, global),
        CompanyCommands::Add(args) => run_add(args, &session, global),
        CompanyCommands::Rm(args) => run_rm(args, &session, global),
    }
}

fn run_list(session: &Session, global: &GlobalOpts) -> Result<()> {
    let companies = session.store.companies()?;
    let staff = session.store.staff()?;
    let risks = session.store.risks()?;

    let mut table = Table::new(&["ID", "Name", "Staff", "Risks"]);
    for company in &companies {
        let staff_count = staff.iter().filter(|s| s.company_id == company.id).count();
        let risk_count = risks.iter().filter(|r| r.company_id == company.id).count();
        table.row(
            &company.id,
            vec![
                company.id.clone(),
                company.name.clone(),
                staff_count.to_string(),
                risk_count.to_string(),
            ],
        );
    }

    let format = session.format(global, OutputFormat::Tsv);
    print_list(&companies, &table, format, "company", global.quiet)
}

fn run_add(args: AddArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let mut company = Company::new(args.name);
    if let Some(id) = args.id {
        company.id = id;
    }
    let company = session.store.add_company(company)?;

    if global.format == OutputFormat::Id || global.quiet {
        println!("{}", company.id);
    } else {
        println!(
            "{} Added company {} {}",
            style("✓").green(),
            style(&company.id).cyan(),
            company.name
        );
    }
    Ok(())
}

fn run_rm(args: RmArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    if !confirm(&format!("Delete company {}?", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    if session.store.delete_company(&args.id)? {
        if !global.quiet {
            println!("{} Deleted company {}", style("✓").green(), style(&args.id).cyan());
        }
    } else if !global.quiet {
        println!("{} No company with id {}", style("!").yellow(), args.id);
    }
    Ok(())
}
