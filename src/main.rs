use clap::Parser;
use miette::Result;
use pbs::cli::{Cli, Commands};
use pbs::output::Printer;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let printer = Printer::new();
    match cli.command {
        Commands::Compile(args) => pbs::cli::compile::run(args, &printer)?,
        Commands::Write(args) => pbs::cli::write::run(args, &printer)?,
        Commands::Validate(args) => pbs::cli::validate::run(args, &printer)?,
        Commands::Watch(args) => pbs::cli::watch::run(args, &printer)?,
        Commands::Completions(args) => pbs::cli::completions::run(args)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
