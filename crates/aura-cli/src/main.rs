mod commands;
mod config;
mod input;
mod output;
mod session;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;

use commands::audit::AuditArgs;
use commands::credit::{ApplicationArgs, RatiosArgs};
use commands::termsheet::TermSheetArgs;
use commands::workflow::{ApprovalsArgs, DecisionArgs, SubmitArgs, UploadArgs};
use config::Config;
use session::Session;

/// Loan origination: risk analysis, term sheets, approvals and audit trail
#[derive(Parser)]
#[command(
    name = "aura",
    version,
    about = "Loan origination: risk analysis, term sheets, approvals and audit trail",
    long_about = "A CLI for commercial loan origination with decimal precision. \
                  Scores loan applications, structures indicative terms, renders \
                  term sheets, runs the manager approval queue and keeps an \
                  append-only audit trail."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Path to aura.yaml (defaults to ./aura.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Username to act as
    #[arg(long, env = "AURA_USER", global = true)]
    user: Option<String>,

    /// Password for --user
    #[arg(long, env = "AURA_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and score a loan application
    Analyze(ApplicationArgs),
    /// Calculate DSCR, leverage and interest coverage
    Ratios(RatiosArgs),
    /// Generate a term sheet document (Manager or Admin)
    TermSheet(TermSheetArgs),
    /// Submit an application to the approval queue
    Submit(SubmitArgs),
    /// Approve a pending request (Manager or Admin)
    Approve(DecisionArgs),
    /// Reject a pending request (Manager or Admin)
    Reject(DecisionArgs),
    /// List the approval queue
    Approvals(ApprovalsArgs),
    /// Record a supporting document upload
    Upload(UploadArgs),
    /// Query the audit trail
    Audit(AuditArgs),
    /// Portfolio metrics: risk mix, loan volume by status, activity trend
    Dashboard,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("aura {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    config.logging.init();
    let session = Session::new(config, cli.user, cli.password);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::credit::run_analyze(args, &session),
        Commands::Ratios(args) => commands::credit::run_ratios(args),
        Commands::TermSheet(args) => commands::termsheet::run_term_sheet(args, &session),
        Commands::Submit(args) => commands::workflow::run_submit(args, &session),
        Commands::Approve(args) => commands::workflow::run_approve(args, &session),
        Commands::Reject(args) => commands::workflow::run_reject(args, &session),
        Commands::Approvals(args) => commands::workflow::run_approvals(args, &session),
        Commands::Upload(args) => commands::workflow::run_upload(args, &session),
        Commands::Audit(args) => commands::audit::run_audit(args, &session),
        Commands::Dashboard => commands::dashboard::run_dashboard(&session),
        Commands::Version => return,
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
