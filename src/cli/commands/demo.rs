//! `riskreg demo` command - Load the extended demo dataset

use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, Session};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct DemoArgs {
    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: DemoArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;

    if !confirm("Add demo records to this register?", args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let added = session.store.add_demo_data()?;

    if global.quiet {
        return Ok(());
    }
    if added == 0 {
        println!(
            "{} Demo data already present, nothing added",
            style("!").yellow()
        );
    } else {
        println!(
            "{} Added {} demo record(s)",
            style("✓").green(),
            style(added).cyan()
        );
    }
    Ok(())
}
