use clap::Parser;
use miette::Result;
use riskreg::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior so piping into `head` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    init_tracing(global.verbose);

    match cli.command {
        Commands::Init(args) => riskreg::cli::commands::init::run(args),
        Commands::Company(cmd) => riskreg::cli::commands::company::run(cmd, &global),
        Commands::Staff(cmd) => riskreg::cli::commands::staff::run(cmd, &global),
        Commands::Group(cmd) => riskreg::cli::commands::group::run(cmd, &global),
        Commands::Stakeholder(cmd) => riskreg::cli::commands::stakeholder::run(cmd, &global),
        Commands::Category(cmd) => riskreg::cli::commands::category::run(cmd, &global),
        Commands::Risk(cmd) => riskreg::cli::commands::risk::run(cmd, &global),
        Commands::Project(cmd) => riskreg::cli::commands::project::run(cmd, &global),
        Commands::Config(cmd) => riskreg::cli::commands::config::run(cmd, &global),
        Commands::Dashboard(args) => riskreg::cli::commands::dashboard::run(args, &global),
        Commands::Demo(args) => riskreg::cli::commands::demo::run(args, &global),
        Commands::Completions(args) => riskreg::cli::commands::completions::run(args),
    }
}

/// Diagnostics go to stderr so stdout stays pipeable; `RUST_LOG` overrides
fn init_tracing(verbose: bool) {
    let default = if verbose { "riskreg=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
