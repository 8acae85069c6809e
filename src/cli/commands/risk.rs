//! `riskreg risk` command - Risk management

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{
    confirm, format_short_id_str, not_found, or_dash, parse_date, print_structured, truncate_str,
    Session,
};
use crate::cli::table::{print_list, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Document, Lookup, NameLookup, Rating};
use crate::entities::occurrence::{InvestmentItem, ServiceCost};
use crate::entities::{HistoryEntry, Investment, Occurrence, Risk, RiskLevel, RiskPatch, RiskStatus};

#[derive(Subcommand, Debug)]
pub enum RiskCommands {
    /// List risks with filtering
    List(ListArgs),

    /// Record a new risk
    New(NewArgs),

    /// Show a risk's details
    Show(ShowArgs),

    /// Change a risk; tracked changes are written to its history
    Edit(EditArgs),

    /// Delete a risk
    Rm(RmArgs),

    /// Show a risk's history
    History(ShowArgs),

    /// Record that a risk has materialized
    Occurrence(OccurrenceArgs),

    /// Create a remediation project from a risk
    GenerateProject(ShowArgs),
}

/// Risk level filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelFilter {
    Low,
    Medium,
    High,
    All,
}

/// Sort key for `risk list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Document order
    None,
    Title,
    Level,
    Status,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<RiskStatus>,

    /// Filter by risk level
    #[arg(long, short = 'l', default_value = "all")]
    pub level: LevelFilter,

    /// Filter by company ID
    #[arg(long, short = 'c')]
    pub company: Option<String>,

    /// Filter by analyst (staff ID)
    #[arg(long, short = 'a')]
    pub analyst: Option<String>,

    /// Search in title and description (case-insensitive substring)
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by field
    #[arg(long, default_value = "none")]
    pub sort: SortKey,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit output to N items
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only, not the items
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Short title
    #[arg(long, short = 't')]
    pub title: String,

    /// Company ID
    #[arg(long, short = 'c')]
    pub company: String,

    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Probability (very_low, low, medium, high, very_high or 1-5)
    #[arg(long, short = 'p', default_value = "medium")]
    pub probability: Rating,

    /// Impact (very_low, low, medium, high, very_high or 1-5)
    #[arg(long, short = 'i', default_value = "medium")]
    pub impact: Rating,

    /// Analyst (staff ID)
    #[arg(long, short = 'a')]
    pub analyst: Option<String>,

    /// Category ID
    #[arg(long)]
    pub category: Option<String>,

    /// Risk category ID
    #[arg(long)]
    pub risk_category: Option<String>,

    /// Initial status
    #[arg(long, short = 's', default_value = "open")]
    pub status: RiskStatus,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Risk ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Risk ID
    pub id: String,

    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Company ID
    #[arg(long, short = 'c')]
    pub company: Option<String>,

    /// Analyst (staff ID, empty to clear)
    #[arg(long, short = 'a')]
    pub analyst: Option<String>,

    /// Category ID (empty to clear)
    #[arg(long)]
    pub category: Option<String>,

    /// Risk category ID (empty to clear)
    #[arg(long)]
    pub risk_category: Option<String>,

    #[arg(long, short = 'p')]
    pub probability: Option<Rating>,

    #[arg(long, short = 'i')]
    pub impact: Option<Rating>,

    #[arg(long, short = 's')]
    pub status: Option<RiskStatus>,

    /// Patch as a JSON object (e.g. '{"status": "mitigating"}')
    #[arg(long)]
    pub json: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Risk ID
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct OccurrenceArgs {
    /// Risk ID
    pub id: String,

    /// What went wrong
    #[arg(long, required_unless_present = "input")]
    pub impediment: Option<String>,

    /// Actions taken or planned
    #[arg(long, default_value = "")]
    pub actions: String,

    /// Staff ID or name of whoever owns the response (default: configured author)
    #[arg(long)]
    pub responsible: Option<String>,

    /// Day the risk materialized (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub on: Option<chrono::NaiveDate>,

    /// Expected delivery of the actions (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub delivery: Option<chrono::NaiveDate>,

    /// Stakeholder group IDs involved (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub group: Vec<String>,

    /// External stakeholder IDs involved (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub stakeholder: Vec<String>,

    /// Purchased item as DESCRIPTION:QUANTITY:UNIT_VALUE (repeatable)
    #[arg(long, value_parser = parse_item)]
    pub item: Vec<InvestmentItem>,

    /// Contracted service as DESCRIPTION:VALUE (repeatable)
    #[arg(long, value_parser = parse_service)]
    pub service: Vec<ServiceCost>,

    /// Approved budget (default: sum of items and services)
    #[arg(long)]
    pub budget: Option<f64>,

    /// Description of the investment
    #[arg(long)]
    pub investment_note: Option<String>,

    /// Read the whole occurrence from a JSON file instead ('-' for stdin)
    #[arg(long, conflicts_with_all = ["impediment", "item", "service", "budget"])]
    pub input: Option<PathBuf>,
}

fn parse_day(s: &str) -> std::result::Result<chrono::NaiveDate, String> {
    parse_date(s).map(|d| d.date_naive())
}

fn parse_item(s: &str) -> std::result::Result<InvestmentItem, String> {
    let mut parts = s.rsplitn(3, ':');
    let (unit, quantity, description) = match (parts.next(), parts.next(), parts.next()) {
        (Some(u), Some(q), Some(d)) => (u, q, d),
        _ => return Err(format!("expected DESCRIPTION:QUANTITY:UNIT_VALUE, got '{}'", s)),
    };
    Ok(InvestmentItem {
        description: description.trim().to_string(),
        quantity: quantity
            .trim()
            .parse()
            .map_err(|_| format!("invalid quantity '{}'", quantity))?,
        unit_value: unit
            .trim()
            .parse()
            .map_err(|_| format!("invalid unit value '{}'", unit))?,
    })
}

fn parse_service(s: &str) -> std::result::Result<ServiceCost, String> {
    let (description, value) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected DESCRIPTION:VALUE, got '{}'", s))?;
    Ok(ServiceCost {
        description: description.trim().to_string(),
        value: value
            .trim()
            .parse()
            .map_err(|_| format!("invalid value '{}'", value))?,
    })
}

pub fn run(cmd: RiskCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    match cmd {
        RiskCommands::List(args) => run_list(args, &session, global),
        RiskCommands::New(args) => run_new(args, &session, global),
        RiskCommands::Show(args) => run_show(args, &session, global),
        RiskCommands::Edit(args) => run_edit(args, &session, global),
        RiskCommands::Rm(args) => run_rm(args, &session, global),
        RiskCommands::History(args) => run_history(args, &session, global),
        RiskCommands::Occurrence(args) => run_occurrence(args, &session, global),
        RiskCommands::GenerateProject(args) => run_generate_project(args, &session, global),
    }
}

fn level_of(risk: &Risk) -> Option<RiskLevel> {
    match risk.risk_level.as_str() {
        "Low" => Some(RiskLevel::Low),
        "Medium" => Some(RiskLevel::Medium),
        "High" => Some(RiskLevel::High),
        _ => None,
    }
}

fn styled_level(level: &str) -> String {
    match level {
        "High" => style(level).red().to_string(),
        "Medium" => style(level).yellow().to_string(),
        "Low" => style(level).green().to_string(),
        other => other.to_string(),
    }
}

fn run_list(args: ListArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let doc = session.store.document()?;
    let mut risks: Vec<Risk> = doc.risks.clone();

    risks.retain(|r| {
        let status_match = args.status.map_or(true, |s| r.status == s);

        let level_match = match args.level {
            LevelFilter::All => true,
            LevelFilter::Low => level_of(r) == Some(RiskLevel::Low),
            LevelFilter::Medium => level_of(r) == Some(RiskLevel::Medium),
            LevelFilter::High => level_of(r) == Some(RiskLevel::High),
        };

        let company_match = args.company.as_ref().map_or(true, |c| &r.company_id == c);

        let analyst_match = args
            .analyst
            .as_ref()
            .map_or(true, |a| r.analyst_id.as_ref() == Some(a));

        let search_match = args.search.as_ref().map_or(true, |search| {
            let search_lower = search.to_lowercase();
            r.title.to_lowercase().contains(&search_lower)
                || r.description.to_lowercase().contains(&search_lower)
        });

        status_match && level_match && company_match && analyst_match && search_match
    });

    match args.sort {
        SortKey::None => {}
        SortKey::Title => risks.sort_by(|a, b| a.title.cmp(&b.title)),
        SortKey::Level => risks.sort_by(|a, b| level_of(b).cmp(&level_of(a))),
        SortKey::Status => risks.sort_by(|a, b| a.status.label().cmp(b.status.label())),
    }

    if args.reverse {
        risks.reverse();
    }

    if let Some(limit) = args.limit {
        risks.truncate(limit);
    }

    if args.count {
        println!("{}", risks.len());
        return Ok(());
    }

    let format = session.format(global, OutputFormat::Tsv);
    let mut table = Table::new(&[
        "ID", "Title", "Company", "Status", "Probability", "Impact", "Level", "Analyst",
    ]);
    for risk in &risks {
        let company = doc
            .name_of(Lookup::Company, &risk.company_id)
            .unwrap_or(&risk.company_id);
        let analyst = risk
            .analyst_id
            .as_deref()
            .map(|id| doc.name_of(Lookup::Staff, id).unwrap_or(id));
        let level = if format == OutputFormat::Tsv {
            styled_level(&risk.risk_level)
        } else {
            risk.risk_level.clone()
        };

        table.row(
            &risk.id,
            vec![
                format_short_id_str(&risk.id),
                truncate_str(&risk.title, 36),
                truncate_str(company, 24),
                risk.status.label().to_string(),
                risk.probability.label().to_string(),
                risk.impact.label().to_string(),
                level,
                or_dash(analyst),
            ],
        );
    }

    print_list(&risks, &table, format, "risk", global.quiet)
}

fn run_new(args: NewArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let mut risk = Risk::new(
        args.company,
        args.title,
        args.description,
        args.probability,
        args.impact,
    );
    risk.analyst_id = args.analyst;
    risk.category_id = args.category;
    risk.risk_category_id = args.risk_category;
    risk.status = args.status;

    let risk = session.store.add_risk(risk)?;

    if global.format == OutputFormat::Id || global.quiet {
        println!("{}", risk.id);
    } else {
        println!(
            "{} Created risk {} {} [{}]",
            style("✓").green(),
            style(&risk.id).cyan(),
            risk.title,
            styled_level(&risk.risk_level)
        );
    }
    Ok(())
}

fn run_show(args: ShowArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let doc = session.store.document()?;
    let risk = doc
        .find::<Risk>(&args.id)
        .ok_or_else(|| not_found("risk", &args.id))?;

    let format = session.format(global, OutputFormat::Auto);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(risk, format),
        OutputFormat::Id => {
            println!("{}", risk.id);
            Ok(())
        }
        _ => {
            print_risk(risk, &doc);
            Ok(())
        }
    }
}

fn print_risk(risk: &Risk, doc: &Document) {
    let name = |kind: Lookup, id: Option<&str>| -> String {
        or_dash(id.map(|id| doc.name_of(kind, id).unwrap_or(id)))
    };

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&risk.id).cyan());
    println!("{}: {}", style("Title").bold(), style(&risk.title).yellow());
    println!("{}: {}", style("Status").bold(), risk.status);
    println!(
        "{}: {}",
        style("Company").bold(),
        name(Lookup::Company, Some(risk.company_id.as_str()))
    );
    println!(
        "{}: {}",
        style("Analyst").bold(),
        name(Lookup::Staff, risk.analyst_id.as_deref())
    );
    println!(
        "{}: {}",
        style("Category").bold(),
        name(Lookup::Category, risk.category_id.as_deref())
    );
    println!(
        "{}: {}",
        style("Risk category").bold(),
        name(Lookup::RiskCategory, risk.risk_category_id.as_deref())
    );
    println!("{}", style("─".repeat(60)).dim());

    println!();
    println!("{}", style("Description:").bold());
    println!("{}", or_dash(Some(risk.description.as_str())));

    println!();
    println!("{}", style("Assessment:").bold());
    println!("  {}: {}", style("Probability").dim(), risk.probability);
    println!("  {}: {}", style("Impact").dim(), risk.impact);
    println!(
        "  {}: {}",
        style("Risk level").bold(),
        styled_level(&risk.risk_level)
    );
    if risk.assessed_level().as_str() != risk.risk_level {
        println!(
            "  {} ratings now assess as {}",
            style("!").yellow(),
            risk.assessed_level()
        );
    }

    let projects: Vec<_> = doc
        .projects
        .iter()
        .filter(|p| !p.deleted && p.risk_id.as_deref() == Some(risk.id.as_str()))
        .collect();
    if !projects.is_empty() {
        println!();
        println!("{}", style("Projects:").bold());
        for project in projects {
            println!(
                "  {} {} [{}]",
                style(&project.id).cyan(),
                project.title,
                project.stage
            );
        }
    }

    println!();
    println!("{}", style("Recent history:").bold());
    let skip = risk.history.len().saturating_sub(5);
    for entry in risk.history.iter().skip(skip) {
        print_entry(entry);
    }
}

pub(crate) fn print_entry(entry: &HistoryEntry) {
    println!(
        "  {} {} {}",
        style(entry.timestamp.format("%Y-%m-%d %H:%M")).dim(),
        style(format!("[{}]", entry.author)).dim(),
        entry.event
    );
}

pub(crate) fn history_table(history: &[HistoryEntry]) -> Table {
    let mut table = Table::new(&["Timestamp", "Author", "Event"]);
    for entry in history {
        table.row(
            entry.timestamp.to_rfc3339(),
            vec![
                entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.author.clone(),
                entry.event.clone(),
            ],
        );
    }
    table
}

fn run_edit(args: EditArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let current = session
        .store
        .risk(&args.id)?
        .ok_or_else(|| not_found("risk", &args.id))?;

    let mut patch = match args.json {
        Some(ref json) => serde_json::from_str::<RiskPatch>(json).into_diagnostic()?,
        None => RiskPatch {
            company_id: args.company,
            title: args.title,
            description: args.description,
            analyst_id: args.analyst,
            category_id: args.category,
            risk_category_id: args.risk_category,
            probability: args.probability,
            impact: args.impact,
            status: args.status,
            risk_level: None,
        },
    };

    if patch.is_empty() {
        return Err(miette::miette!(
            help = "pass at least one field, e.g. --status mitigating",
            "Nothing to change"
        ));
    }

    // Level is denormalized; recompute it whenever a rating changes
    if patch.risk_level.is_none() && (patch.probability.is_some() || patch.impact.is_some()) {
        let level = RiskLevel::assess(
            patch.probability.unwrap_or(current.probability),
            patch.impact.unwrap_or(current.impact),
        );
        patch.risk_level = Some(level.to_string());
    }

    let risk = session
        .store
        .update_risk(&args.id, patch)?
        .ok_or_else(|| not_found("risk", &args.id))?;

    if global.quiet {
        return Ok(());
    }
    if risk.history.len() > current.history.len() {
        let entry = &risk.history[risk.history.len() - 1];
        println!(
            "{} Updated risk {}: {}",
            style("✓").green(),
            style(&risk.id).cyan(),
            entry.event
        );
    } else {
        println!(
            "{} Risk {} unchanged",
            style("✓").green(),
            style(&risk.id).cyan()
        );
    }
    Ok(())
}

fn run_rm(args: RmArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    if !confirm(&format!("Delete risk {}?", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    if session.store.delete_risk(&args.id)? {
        if !global.quiet {
            println!("{} Deleted risk {}", style("✓").green(), style(&args.id).cyan());
        }
    } else if !global.quiet {
        println!("{} No risk with id {}", style("!").yellow(), args.id);
    }
    Ok(())
}

fn run_history(args: ShowArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let risk = session
        .store
        .risk(&args.id)?
        .ok_or_else(|| not_found("risk", &args.id))?;

    let format = session.format(global, OutputFormat::Tsv);
    print_list(
        &risk.history,
        &history_table(&risk.history),
        format,
        "event",
        global.quiet,
    )
}

fn run_occurrence(args: OccurrenceArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let mut occurrence = match args.input {
        Some(ref path) => {
            let content = if path.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin()).into_diagnostic()?
            } else {
                std::fs::read_to_string(path).into_diagnostic()?
            };
            serde_json::from_str::<Occurrence>(&content).into_diagnostic()?
        }
        None => {
            let investment = if args.item.is_empty() && args.service.is_empty() && args.budget.is_none() {
                None
            } else {
                Some(Investment {
                    description: args.investment_note,
                    items: args.item,
                    services: args.service,
                    budget: args.budget,
                })
            };
            Occurrence {
                occurred_on: args.on,
                delivery_date: args.delivery,
                responsible: args.responsible,
                impediment: args.impediment.unwrap_or_default(),
                actions: args.actions,
                stakeholder_group_ids: args.group,
                stakeholder_ids: args.stakeholder,
                investment,
            }
        }
    };

    if occurrence.responsible.is_none() {
        occurrence.responsible = session.config.author.clone();
    }

    let risk = session
        .store
        .record_occurrence(&args.id, occurrence)?
        .ok_or_else(|| not_found("risk", &args.id))?;

    if !global.quiet {
        if let Some(entry) = risk.history.last() {
            println!(
                "{} Recorded occurrence on {}",
                style("✓").green(),
                style(&risk.id).cyan()
            );
            print_entry(entry);
        }
    }
    Ok(())
}

fn run_generate_project(args: ShowArgs, session: &Session, global: &GlobalOpts) -> Result<()> {
    let project = session
        .store
        .generate_project_from_risk(&args.id)?
        .ok_or_else(|| not_found("risk", &args.id))?;

    if global.format == OutputFormat::Id || global.quiet {
        println!("{}", project.id);
    } else {
        println!(
            "{} Generated project {} from risk {}",
            style("✓").green(),
            style(&project.id).cyan(),
            style(&args.id).cyan()
        );
        println!(
            "   Plan it with {}",
            style(format!("riskreg project edit {} --stage planning", project.id)).yellow()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        let item = parse_item("Temperature sensor: 2 :150.5").unwrap();
        assert_eq!(item.description, "Temperature sensor");
        assert_eq!(item.quantity, 2.0);
        assert_eq!(item.unit_value, 150.5);

        // descriptions may contain colons
        let item = parse_item("Kit: rev B:1:10").unwrap();
        assert_eq!(item.description, "Kit: rev B");

        assert!(parse_item("Sensor:2").is_err());
        assert!(parse_item("Sensor:two:10").is_err());
    }

    #[test]
    fn test_parse_service() {
        let service = parse_service("Installation:200").unwrap();
        assert_eq!(service.description, "Installation");
        assert_eq!(service.value, 200.0);
        assert!(parse_service("Installation").is_err());
    }

    #[test]
    fn test_level_of() {
        let mut risk = Risk::new("EMP001", "t", "d", Rating::High, Rating::High);
        assert_eq!(level_of(&risk), Some(RiskLevel::High));
        risk.risk_level = "Critical".to_string();
        assert_eq!(level_of(&risk), None);
    }
}
