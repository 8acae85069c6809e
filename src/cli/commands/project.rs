//! `riskreg project` command - Remediation project management

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::risk::{history_table, print_entry};
use crate::cli::helpers::{
    confirm, format_short_id_str, not_found, or_dash, parse_date, print_structured, truncate_str,
    Session,
};
use crate::cli::table::{print_list, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Document, Lookup, NameLookup};
use crate::entities::project::{ExecutionStage, Task};
use crate::entities::{Project, ProjectPatch, Scope, Stage};

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects
    List(ListArgs),

    /// Create a project
    New(NewArgs),

    /// Show a project's details
    Show(IdArgs),

    /// Change a project; tracked changes are written to its history
    Edit(EditArgs),

    /// Delete a project (soft delete unless --purge)
    Rm(RmArgs),

    /// Show a project's history
    History(IdArgs),

    /// Move a project to the next workflow stage
    Advance(IdArgs),

    /// Add a named execution stage
    AddStage(AddStageArgs),

    /// Add a task to an execution stage
    AddTask(AddTaskArgs),

    /// Mark a task complete (or incomplete again)
    ToggleTask(ToggleTaskArgs),

    /// Archive done projects closed longer than the configured delay
    ArchiveSweep,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by stage
    #[arg(long, short = 's')]
    pub stage: Option<Stage>,

    /// Hide archived projects
    #[arg(long)]
    pub active: bool,

    /// Include soft-deleted projects
    #[arg(long)]
    pub deleted: bool,

    /// Filter by originating risk ID
    #[arg(long, short = 'r')]
    pub risk: Option<String>,

    /// Filter by owner (staff ID)
    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    /// Show count only, not the items
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Project title
    #[arg(long, short = 't')]
    pub title: String,

    /// Originating risk ID
    #[arg(long, short = 'r')]
    pub risk: Option<String>,

    #[arg(long, short = 's', default_value = "backlog")]
    pub stage: Stage,

    /// Deadline (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub deadline: Option<chrono::DateTime<Utc>>,

    /// Owner (staff ID)
    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(clap::Args, Debug, Default)]
pub struct ScopeArgs {
    /// Scope: objective
    #[arg(long)]
    pub objective: Option<String>,

    /// Scope: expected deliverables
    #[arg(long)]
    pub deliverables: Option<String>,

    /// Scope: required resources
    #[arg(long)]
    pub resources: Option<String>,
}

impl ScopeArgs {
    fn is_empty(&self) -> bool {
        self.objective.is_none() && self.deliverables.is_none() && self.resources.is_none()
    }

    /// Overlay the given parts onto `base`; an empty value clears a part
    fn merge_into(self, base: &Scope) -> Scope {
        let pick = |arg: Option<String>, current: &Option<String>| match arg {
            Some(value) if value.is_empty() => None,
            Some(value) => Some(value),
            None => current.clone(),
        };
        Scope {
            objective: pick(self.objective, &base.objective),
            deliverables: pick(self.deliverables, &base.deliverables),
            resources: pick(self.resources, &base.resources),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Project ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Project ID
    pub id: String,

    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Originating risk ID (empty to clear)
    #[arg(long, short = 'r')]
    pub risk: Option<String>,

    #[arg(long, short = 's')]
    pub stage: Option<Stage>,

    /// Deadline (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub deadline: Option<chrono::DateTime<Utc>>,

    /// Remove the deadline
    #[arg(long, conflicts_with = "deadline")]
    pub clear_deadline: bool,

    /// Owner (staff ID, empty to clear)
    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Record whether the project charter is attached
    #[arg(long)]
    pub tap_attached: Option<bool>,

    #[arg(long)]
    pub archived: Option<bool>,

    /// Patch as a JSON object (e.g. '{"stage": "execution"}')
    #[arg(long)]
    pub json: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Project ID
    pub id: String,

    /// Remove the record instead of flagging it deleted
    #[arg(long)]
    pub purge: bool,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct AddStageArgs {
    /// Project ID
    pub id: String,

    /// Stage name
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct AddTaskArgs {
    /// Project ID
    pub id: String,

    /// Task title
    pub title: String,

    /// Execution stage name or 1-based index (default: last stage)
    #[arg(long)]
    pub stage: Option<String>,

    /// Staff ID or name responsible for the task
    #[arg(long)]
    pub responsible: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ToggleTaskArgs {
    /// Project ID
    pub id: String,

    /// Execution stage name or 1-based index
    pub stage: String,

    /// 1-based task index within the stage
    pub task: usize,
}

pub fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    match cmd {
        ProjectCommands::List(args) => run_list(args, &session, global),
        ProjectCommands::New(args) => run_new(args, &session, global),
        ProjectCommands::Show(args) => run_show(args, &session, global),
        ProjectCommands::Edit(args) => run_edit(args, &session, global),
        ProjectCommands::Rm(args) => run_rm(args, &session, global),
        ProjectCommands::History(args) => run_history(args, &session, global),
        ProjectCommands::Advance(args) => run_advance(args, &session, global),
        ProjectCommands::AddStage(args) => run_add_stage(args, &session, global),
        ProjectCommands::AddTask(args) => run_add_task(args, &session, global),
        ProjectCommands::ToggleTask(args) => run_toggle_task(args, &session, global),
        ProjectCommands::ArchiveSweep => run_archive_sweep(&session, global),
    }
}

fn load(session: &Session, id: &str) -> Result<Project> {
    session
        .store
        .project(id)?
        .ok_or_else(|| not_found("project", id))
}

/// Apply `patch` and report the history entry it produced
fn apply(session: &Session, global: &GlobalOpts, id: &str, patch: ProjectPatch) -> Result<Project> {
    let before = load(session, id)?;
    let project = session
        .store
        .update_project(id, patch)?
        .ok_or_else(|| not_found("project", id))?;

    if !global.quiet {
        match project.history.last() {
            Some(entry) if project.history.len() > before.history.len() => println!(
                "{} Updated project {}: {}",
                style("✓").green(),
                style(&project.id).cyan(),
                entry.event
            ),
            _ => println!(
                "{} Project {} unchanged",
                style("✓").green(),
                style(&project.id).cyan()
            ),
        }
    }
    Ok(project)
}

fn run_list(args: ListArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let doc = session.store.document()?;
    let projects: Vec<Project> = doc
        .projects
        .iter()
        .filter(|p| args.deleted || !p.deleted)
        .filter(|p| !(args.active && p.archived))
        .filter(|p| args.stage.map_or(true, |s| p.stage == s))
        .filter(|p| {
            args.risk
                .as_ref()
                .map_or(true, |r| p.risk_id.as_ref() == Some(r))
        })
        .filter(|p| {
            args.owner
                .as_ref()
                .map_or(true, |o| p.owner_id.as_ref() == Some(o))
        })
        .cloned()
        .collect();

    if args.count {
        println!("{}", projects.len());
        return Ok(());
    }

    let mut table = Table::new(&[
        "ID", "Title", "Stage", "Deadline", "Owner", "Risk", "Progress", "Flags",
    ]);
    for project in &projects {
        let owner = project
            .owner_id
            .as_deref()
            .map(|id| doc.name_of(Lookup::Staff, id).unwrap_or(id));
        let deadline = project.deadline.map(|d| d.format("%Y-%m-%d").to_string());
        let risk = project.risk_id.as_deref().map(format_short_id_str);

        let mut flags = Vec::new();
        if project.archived {
            flags.push("archived");
        }
        if project.deleted {
            flags.push("deleted");
        }
        if project.tap_attached {
            flags.push("tap");
        }

        table.row(
            &project.id,
            vec![
                format_short_id_str(&project.id),
                truncate_str(&project.title, 36),
                project.stage.label().to_string(),
                or_dash(deadline.as_deref()),
                or_dash(owner),
                or_dash(risk.as_deref()),
                format!("{}%", project.progress()),
                flags.join(","),
            ],
        );
    }

    let format = session.format(global, OutputFormat::Tsv);
    print_list(&projects, &table, format, "project", global.quiet)
}

fn run_new(args: NewArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    if let Some(ref risk_id) = args.risk {
        if session.store.risk(risk_id)?.is_none() {
            return Err(not_found("risk", risk_id));
        }
    }

    let mut project = Project::new(args.title);
    project.risk_id = args.risk;
    project.stage = args.stage;
    project.deadline = args.deadline;
    project.owner_id = args.owner;
    project.scope = args.scope.merge_into(&Scope::default());

    let project = session.store.add_project(project)?;

    if global.format == OutputFormat::Id || global.quiet {
        println!("{}", project.id);
    } else {
        println!(
            "{} Created project {} {} [{}]",
            style("✓").green(),
            style(&project.id).cyan(),
            project.title,
            project.stage
        );
    }
    Ok(())
}

fn run_show(args: IdArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let doc = session.store.document()?;
    let project = doc
        .find::<Project>(&args.id)
        .ok_or_else(|| not_found("project", &args.id))?;

    let format = session.format(global, OutputFormat::Auto);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(project, format),
        OutputFormat::Id => {
            println!("{}", project.id);
            Ok(())
        }
        _ => {
            print_project(project, &doc);
            Ok(())
        }
    }
}

fn print_project(project: &Project, doc: &Document) {
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&project.id).cyan());
    println!("{}: {}", style("Title").bold(), style(&project.title).yellow());
    println!("{}: {}", style("Stage").bold(), project.stage);
    if let Some(ref risk_id) = project.risk_id {
        let title = doc.name_of(Lookup::Risk, risk_id).unwrap_or("?");
        println!("{}: {} ({})", style("Risk").bold(), style(risk_id).cyan(), title);
    }
    println!(
        "{}: {}",
        style("Owner").bold(),
        or_dash(
            project
                .owner_id
                .as_deref()
                .map(|id| doc.name_of(Lookup::Staff, id).unwrap_or(id))
        )
    );
    println!(
        "{}: {}",
        style("Deadline").bold(),
        or_dash(
            project
                .deadline
                .map(|d| d.format("%Y-%m-%d").to_string())
                .as_deref()
        )
    );
    if let Some(closed) = project.closed_at {
        println!(
            "{}: {}",
            style("Closed").bold(),
            closed.format("%Y-%m-%d %H:%M")
        );
    }
    let mut flags = Vec::new();
    if project.tap_attached {
        flags.push("charter attached");
    }
    if project.archived {
        flags.push("archived");
    }
    if project.deleted {
        flags.push("deleted");
    }
    if !flags.is_empty() {
        println!("{}: {}", style("Flags").bold(), flags.join(", "));
    }
    println!("{}", style("─".repeat(60)).dim());

    println!();
    println!("{}", style("Scope:").bold());
    println!(
        "  {}: {}",
        style("Objective").dim(),
        or_dash(project.scope.objective.as_deref())
    );
    println!(
        "  {}: {}",
        style("Deliverables").dim(),
        or_dash(project.scope.deliverables.as_deref())
    );
    println!(
        "  {}: {}",
        style("Resources").dim(),
        or_dash(project.scope.resources.as_deref())
    );

    if !project.stages.is_empty() {
        println!();
        println!(
            "{} {}",
            style("Execution:").bold(),
            style(format!("{}% complete", project.progress())).dim()
        );
        for (i, stage) in project.stages.iter().enumerate() {
            println!("  {}. {} ({}%)", i + 1, stage.name, stage.progress());
            for (j, task) in stage.tasks.iter().enumerate() {
                let mark = if task.completed {
                    style("✓").green()
                } else {
                    style("○").dim()
                };
                let who = task
                    .responsible
                    .as_deref()
                    .map(|r| format!(" [{}]", doc.name_of(Lookup::Staff, r).unwrap_or(r)))
                    .unwrap_or_default();
                println!("     {} {}. {}{}", mark, j + 1, task.title, who);
            }
        }
    }

    println!();
    println!("{}", style("Recent history:").bold());
    let skip = project.history.len().saturating_sub(5);
    for entry in project.history.iter().skip(skip) {
        print_entry(entry);
    }
}

fn run_edit(args: EditArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let patch = match args.json {
        Some(ref json) => serde_json::from_str::<ProjectPatch>(json).into_diagnostic()?,
        None => {
            let scope = if args.scope.is_empty() {
                None
            } else {
                let current = load(session, &args.id)?;
                Some(args.scope.merge_into(&current.scope))
            };
            ProjectPatch {
                title: args.title,
                risk_id: args.risk,
                stage: args.stage,
                deadline: args.deadline,
                clear_deadline: args.clear_deadline,
                owner_id: args.owner,
                scope,
                archived: args.archived,
                tap_attached: args.tap_attached,
                stages: None,
            }
        }
    };

    if patch.is_empty() {
        return Err(miette::miette!(
            help = "pass at least one field, e.g. --stage execution",
            "Nothing to change"
        ));
    }

    apply(session, global, &args.id, patch)?;
    Ok(())
}

fn run_rm(args: RmArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let prompt = if args.purge {
        format!("Permanently remove project {}?", args.id)
    } else {
        format!("Delete project {}?", args.id)
    };
    if !confirm(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let removed = if args.purge {
        session.store.purge_project(&args.id)?
    } else {
        session.store.delete_project(&args.id)?
    };

    if global.quiet {
        return Ok(());
    }
    if removed {
        let verb = if args.purge { "Purged" } else { "Deleted" };
        println!(
            "{} {} project {}",
            style("✓").green(),
            verb,
            style(&args.id).cyan()
        );
    } else {
        println!(
            "{} No active project with id {}",
            style("!").yellow(),
            args.id
        );
    }
    Ok(())
}

fn run_history(args: IdArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let project = load(session, &args.id)?;
    let format = session.format(global, OutputFormat::Tsv);
    print_list(
        &project.history,
        &history_table(&project.history),
        format,
        "event",
        global.quiet,
    )
}

fn run_advance(args: IdArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let project = load(session, &args.id)?;
    let Some(next) = project.stage.next() else {
        return Err(miette::miette!(
            "Project {} is already {}",
            project.id,
            project.stage
        ));
    };

    apply(
        session,
        global,
        &args.id,
        ProjectPatch {
            stage: Some(next),
            ..Default::default()
        },
    )?;
    Ok(())
}

/// Resolve a stage reference: 1-based index or case-insensitive name
fn stage_index(stages: &[ExecutionStage], reference: &str) -> Option<usize> {
    if let Ok(n) = reference.parse::<usize>() {
        return (1..=stages.len()).contains(&n).then(|| n - 1);
    }
    stages
        .iter()
        .position(|s| s.name.eq_ignore_ascii_case(reference))
}

fn patch_stages(
    session: &Session,
    global: &GlobalOpts,
    id: &str,
    edit: impl FnOnce(&mut Vec<ExecutionStage>) -> Result<()>,
) -> Result<()> {
    let project = load(session, id)?;
    let mut stages = project.stages;
    edit(&mut stages)?;

    apply(
        session,
        global,
        id,
        ProjectPatch {
            stages: Some(stages),
            ..Default::default()
        },
    )?;
    Ok(())
}

fn run_add_stage(args: AddStageArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    patch_stages(session, global, &args.id, |stages| {
        if stages.iter().any(|s| s.name.eq_ignore_ascii_case(&args.name)) {
            return Err(miette::miette!("Stage '{}' already exists", args.name));
        }
        stages.push(ExecutionStage::new(args.name.clone()));
        Ok(())
    })
}

fn run_add_task(args: AddTaskArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    patch_stages(session, global, &args.id, |stages| {
        let index = match args.stage {
            Some(ref reference) => stage_index(stages, reference)
                .ok_or_else(|| miette::miette!("No execution stage matching '{}'", reference))?,
            None => stages.len().checked_sub(1).ok_or_else(|| {
                miette::miette!(
                    help = format!("add one first: riskreg project add-stage {} <NAME>", args.id),
                    "Project has no execution stages"
                )
            })?,
        };
        stages[index].tasks.push(Task {
            title: args.title.clone(),
            completed: false,
            responsible: args.responsible.clone(),
        });
        Ok(())
    })
}

fn run_toggle_task(args: ToggleTaskArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    patch_stages(session, global, &args.id, |stages| {
        let index = stage_index(stages, &args.stage)
            .ok_or_else(|| miette::miette!("No execution stage matching '{}'", args.stage))?;
        let position = args.task.checked_sub(1).unwrap_or(usize::MAX);
        let task = stages[index]
            .tasks
            .get_mut(position)
            .ok_or_else(|| miette::miette!("No task #{} in stage '{}'", args.task, args.stage))?;
        task.completed = !task.completed;
        Ok(())
    })
}

fn run_archive_sweep(session: &Session, global: &GlobalOpts) -> Result<()> {
    let archived = session.store.archive_sweep(Utc::now())?;

    if global.format == OutputFormat::Id {
        for project in &archived {
            println!("{}", project.id);
        }
        return Ok(());
    }
    if global.quiet {
        return Ok(());
    }
    if archived.is_empty() {
        println!("No projects due for archiving.");
    } else {
        for project in &archived {
            println!(
                "{} Archived {} {}",
                style("✓").green(),
                style(&project.id).cyan(),
                project.title
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stages() -> Vec<ExecutionStage> {
        vec![ExecutionStage::new("Procurement"), ExecutionStage::new("Install")]
    }

    #[test]
    fn test_stage_index_by_number_and_name() {
        let stages = stages();
        assert_eq!(stage_index(&stages, "1"), Some(0));
        assert_eq!(stage_index(&stages, "2"), Some(1));
        assert_eq!(stage_index(&stages, "install"), Some(1));
        assert_eq!(stage_index(&stages, "0"), None);
        assert_eq!(stage_index(&stages, "3"), None);
        assert_eq!(stage_index(&stages, "Testing"), None);
    }

    #[test]
    fn test_scope_merge_keeps_unset_parts() {
        let base = Scope {
            objective: Some("Keep vaccines cold".to_string()),
            deliverables: Some("Backup generator".to_string()),
            resources: None,
        };
        let args = ScopeArgs {
            objective: None,
            deliverables: Some(String::new()),
            resources: Some("Maintenance team".to_string()),
        };

        let merged = args.merge_into(&base);
        assert_eq!(merged.objective.as_deref(), Some("Keep vaccines cold"));
        assert_eq!(merged.deliverables, None);
        assert_eq!(merged.resources.as_deref(), Some("Maintenance team"));
    }

    #[test]
    fn test_scope_args_empty() {
        assert!(ScopeArgs::default().is_empty());
    }
}
