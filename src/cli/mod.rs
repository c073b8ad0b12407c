//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// shiftx - versioned CSV exports of monthly shift availability
#[derive(Parser, Debug)]
#[command(name = "shiftx", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.shiftx/data/shiftx.db)
    #[arg(long, global = true, env = "SHIFTX_DB")]
    pub db: Option<PathBuf>,

    /// Export root directory (default: ~/.shiftx/exports)
    #[arg(long, global = true, env = "SHIFTX_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// Actor name recorded on export runs
    #[arg(long, global = true, env = "SHIFTX_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and export root
    Init {
        /// Overwrite existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Employee roster management
    Employee {
        #[command(subcommand)]
        command: EmployeeCommands,
    },

    /// Availability submissions
    Submission {
        #[command(subcommand)]
        command: SubmissionCommands,
    },

    /// Export a month's submissions and the roster to versioned CSV
    Export {
        /// Month to export (YYYY-MM)
        #[arg(short, long)]
        month: String,

        /// Record this run as a retry of a failed run
        #[arg(long)]
        retry: bool,
    },

    /// Show the version index of each dataset
    Status {
        /// Month whose submissions dataset to show (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Inspect the export job ledger
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Employee Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum EmployeeCommands {
    /// Add an employee to the roster
    Add {
        /// Unique employee code (e.g., E001)
        code: String,

        /// Display name
        name: String,

        /// Department
        #[arg(short, long)]
        department: Option<String>,
    },

    /// List employees
    List {
        /// Include deactivated employees
        #[arg(long)]
        all: bool,
    },

    /// Deactivate an employee (kept in the roster export as inactive)
    Deactivate {
        /// Employee code or ID
        employee: String,
    },

    /// Reactivate an employee
    Activate {
        /// Employee code or ID
        employee: String,
    },
}

// ============================================================================
// Submission Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum SubmissionCommands {
    /// Store one employee's availability for a month
    Add {
        /// Month the submission covers (YYYY-MM)
        #[arg(short, long)]
        month: String,

        /// Employee code or ID
        #[arg(short, long)]
        employee: String,

        /// Day entry: DATE=AVAILABILITY[@TIME_RANGE] (repeatable)
        #[arg(long = "entry", required = true)]
        entries: Vec<String>,

        /// Skip the automatic export after storing
        #[arg(long)]
        no_export: bool,
    },

    /// List submissions for a month
    List {
        /// Month (YYYY-MM)
        #[arg(short, long)]
        month: String,
    },
}

// ============================================================================
// Runs Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum RunsCommands {
    /// List recent runs, newest first
    List {
        /// Only runs for this month's submissions dataset (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,

        /// Maximum runs to show
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Show one run with its items
    Show {
        /// Run ID
        id: String,
    },
}
