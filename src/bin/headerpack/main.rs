//! headerpack CLI - packages header-only C/C++ libraries

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use headerpack::util::Shell;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let shell = Arc::new(Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    ));

    if let Err(e) = run(cli.command, &shell) {
        shell.error(format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    // RUST_LOG wins over the flag-derived default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("headerpack=debug")
        } else if cli.quiet {
            EnvFilter::new("headerpack=error")
        } else {
            EnvFilter::new("headerpack=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, shell: &Arc<Shell>) -> Result<()> {
    match command {
        Commands::Init(args) => commands::init::execute(args, shell),
        Commands::Copy(args) => commands::copy::execute(args, shell),
        Commands::Export(args) => commands::export::execute(args, shell),
        Commands::Package(args) => commands::package::execute(args, shell),
        Commands::Info(args) => commands::info::execute(args, shell),
        Commands::Verify(args) => commands::verify::execute(args, shell),
        Commands::Test(args) => commands::test::execute(args, shell),
        Commands::Publish(args) => commands::publish::execute(args, shell),
        Commands::List(args) => commands::list::execute(args, shell),
        Commands::Clean(args) => commands::clean::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
