//! `riskreg dashboard` command - Headline counts for the register

use console::style;
use miette::Result;
use std::collections::BTreeMap;

use crate::cli::helpers::{print_structured, Session};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct DashboardArgs {
    /// Also break risks down by level and status
    #[arg(long, short = 'd')]
    pub detail: bool,
}

pub fn run(args: DashboardArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let dashboard = session.store.dashboard()?;

    let format = session.format(global, OutputFormat::Auto);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&dashboard, format);
    }

    println!("{}", style("Risk Register").bold().underlined());
    println!();
    println!(
        "  {:<22} {}",
        "Open risks",
        style(dashboard.open_risk_count).yellow().bold()
    );
    println!(
        "  {:<22} {}",
        "Projects in execution",
        style(dashboard.execution_project_count).cyan().bold()
    );
    println!("  {:<22} {}", "Companies", dashboard.company_count);
    println!("  {:<22} {}", "Staff", dashboard.staff_count);

    if args.detail {
        let doc = session.store.document()?;

        let mut by_level: BTreeMap<&str, usize> = BTreeMap::new();
        let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
        for risk in &doc.risks {
            *by_level.entry(risk.risk_level.as_str()).or_default() += 1;
            *by_status.entry(risk.status.label()).or_default() += 1;
        }

        println!();
        println!("{}", style("Risks by level:").bold());
        for (level, count) in &by_level {
            println!("  {:<22} {}", level, count);
        }
        println!();
        println!("{}", style("Risks by status:").bold());
        for (status, count) in &by_status {
            println!("  {:<22} {}", status, count);
        }
    }
    Ok(())
}
