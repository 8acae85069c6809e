//! `riskreg group` command - Stakeholder group management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, not_found, or_dash, print_structured, Session};
use crate::cli::table::{print_list, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Lookup, NameLookup};
use crate::entities::StakeholderGroup;

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// List stakeholder groups
    List,

    /// Show a group and its members
    Show(IdArgs),

    /// Create a group (assigned the next STKGRP### code)
    Add(AddArgs),

    /// Delete a group
    Rm(RmArgs),

    /// Add staff and external stakeholders to an open group
    AddMembers(AddMembersArgs),

    /// Close a group, freezing its membership
    Close(IdArgs),

    /// Reopen a closed group
    Open(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Group ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Group name
    pub name: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Staff member IDs (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub staff: Vec<String>,

    /// External stakeholder IDs (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub external: Vec<String>,

    /// Create the group already closed
    #[arg(long)]
    pub closed: bool,
}

#[derive(clap::Args, Debug)]
pub struct AddMembersArgs {
    /// Group ID
    pub id: String,

    /// Staff member IDs (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub staff: Vec<String>,

    /// External stakeholder IDs (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub external: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Group ID
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: GroupCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    match cmd {
        GroupCommands::List => run_list(&session, global),
        GroupCommands::Show(args) => run_show(args, &session, global),
        GroupCommands::Add(args) => run_add(args, &session, global),
        GroupCommands::Rm(args) => run_rm(args, &session, global),
        GroupCommands::AddMembers(args) => run_add_members(args, &session, global),
        GroupCommands::Close(args) => run_set_closed(args, true, &session, global),
        GroupCommands::Open(args) => run_set_closed(args, false, &session, global),
    }
}

fn run_list(session: &Session, global: &GlobalOpts) -> Result<()> {
    let groups = session.store.stakeholder_groups()?;

    let mut table = Table::new(&["ID", "Name", "Staff", "External", "State"]);
    for group in &groups {
        table.row(
            &group.id,
            vec![
                group.id.clone(),
                group.name.clone(),
                group.member_staff_ids.len().to_string(),
                group.member_external_ids.len().to_string(),
                state_label(group).to_string(),
            ],
        );
    }

    let format = session.format(global, OutputFormat::Tsv);
    print_list(&groups, &table, format, "group", global.quiet)
}

fn state_label(group: &StakeholderGroup) -> &'static str {
    if group.closed {
        "closed"
    } else {
        "open"
    }
}

fn run_show(args: IdArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let doc = session.store.document()?;
    let group = doc
        .find::<StakeholderGroup>(&args.id)
        .ok_or_else(|| not_found("stakeholder group", &args.id))?;

    let format = session.format(global, OutputFormat::Auto);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(group, format),
        OutputFormat::Id => {
            println!("{}", group.id);
            Ok(())
        }
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(&group.id).cyan());
            println!("{}: {}", style("Name").bold(), style(&group.name).yellow());
            println!("{}: {}", style("State").bold(), state_label(group));
            println!(
                "{}: {}",
                style("Description").bold(),
                or_dash(group.description.as_deref())
            );
            println!("{}", style("─".repeat(60)).dim());

            println!();
            println!("{}", style("Staff:").bold());
            for id in &group.member_staff_ids {
                let name = doc.name_of(Lookup::Staff, id).unwrap_or("(unknown)");
                println!("  {} {}", style(id).cyan(), name);
            }
            println!();
            println!("{}", style("External:").bold());
            for id in &group.member_external_ids {
                let name = doc
                    .name_of(Lookup::ExternalStakeholder, id)
                    .unwrap_or("(unknown)");
                println!("  {} {}", style(id).cyan(), name);
            }
            Ok(())
        }
    }
}

fn run_add(args: AddArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let mut group = StakeholderGroup::new(args.name, args.description);
    group.add_members(&args.staff, &args.external);
    group.closed = args.closed;
    let group = session.store.add_stakeholder_group(group)?;

    if global.format == OutputFormat::Id || global.quiet {
        println!("{}", group.id);
    } else {
        println!(
            "{} Created group {} {} ({} member(s))",
            style("✓").green(),
            style(&group.id).cyan(),
            group.name,
            group.member_count()
        );
    }
    Ok(())
}

fn run_rm(args: RmArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    if !confirm(&format!("Delete group {}?", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    if session.store.delete_stakeholder_group(&args.id)? {
        if !global.quiet {
            println!("{} Deleted group {}", style("✓").green(), style(&args.id).cyan());
        }
    } else if !global.quiet {
        println!("{} No group with id {}", style("!").yellow(), args.id);
    }
    Ok(())
}

fn run_add_members(args: AddMembersArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let group = session
        .store
        .stakeholder_group(&args.id)?
        .ok_or_else(|| not_found("stakeholder group", &args.id))?;

    if group.closed {
        return Err(miette::miette!(
            help = format!("reopen it first with 'riskreg group open {}'", group.id),
            "Group {} is closed; its membership cannot change",
            group.id
        ));
    }

    let before = group.member_count();
    let group = session
        .store
        .add_group_members(&args.id, &args.staff, &args.external)?
        .ok_or_else(|| not_found("stakeholder group", &args.id))?;

    if !global.quiet {
        println!(
            "{} Added {} member(s) to {}",
            style("✓").green(),
            group.member_count() - before,
            style(&group.id).cyan()
        );
    }
    Ok(())
}

fn run_set_closed(args: IdArgs, closed: bool, session: &Session, global: &GlobalOpts) -> Result<()> {
    let updated = if closed {
        session.store.close_group(&args.id)?
    } else {
        session.store.open_group(&args.id)?
    };
    let group = updated.ok_or_else(|| not_found("stakeholder group", &args.id))?;

    if !global.quiet {
        println!(
            "{} Group {} is now {}",
            style("✓").green(),
            style(&group.id).cyan(),
            state_label(&group)
        );
    }
    Ok(())
}
