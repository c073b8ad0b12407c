//! shiftx CLI entry point.

use clap::Parser;
use shiftx::cli::commands;
use shiftx::cli::{Cli, Commands};
use shiftx::config::default_actor;
use shiftx::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let db = cli.db.as_ref();
    let export_dir = cli.export_dir.as_ref();
    let actor = || cli.actor.clone().unwrap_or_else(default_actor);

    match &cli.command {
        Commands::Init { force } => commands::init::execute(db, export_dir, *force, json),
        Commands::Version => commands::version::execute(json),

        Commands::Employee { command } => commands::employee::execute(command, db, json),
        Commands::Submission { command } => {
            commands::submission::execute(command, db, export_dir, &actor(), json)
        }

        Commands::Export { month, retry } => {
            commands::export::execute(month, *retry, db, export_dir, &actor(), json)
        }
        Commands::Status { month } => commands::status::execute(month.as_deref(), export_dir, json),
        Commands::Runs { command } => commands::runs::execute(command, db, json),

        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
