#![forbid(unsafe_code)]

mod cmd;
mod output;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cadence: capacity-aware sprint planning and retrospective consolidation",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Output format: pretty (TTY default), text (pipe default), or json.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Planning",
        about = "Assign a task table to the team across sprints",
        long_about = "Normalise a task CSV, distribute it over the team sprint by sprint \
                      with priority balancing and carry-forward, and report the result.",
        after_help = "EXAMPLES:\n    # Two people, three sprints\n    cad plan --tasks backlog.csv --member Alice=120 --member Bob=90 --sprints 3\n\n    # Roster file and CSV export\n    cad plan --tasks backlog.csv --team team.csv --out planned.csv\n\n    # Machine-readable output\n    cad plan --tasks backlog.csv --format json"
    )]
    Plan(cmd::plan::PlanArgs),

    #[command(
        next_help_heading = "Planning",
        about = "Summarise a task table before planning",
        after_help = "EXAMPLES:\n    # Counts per priority and total estimate\n    cad summary --tasks backlog.csv"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Retrospectives",
        about = "Consolidate feedback from retrospective exports",
        long_about = "Merge vote totals per feedback text across every export, keep items \
                      inside the vote range and rank them. Unreadable exports are reported \
                      and skipped.",
        after_help = "EXAMPLES:\n    # Merge two sprints of feedback\n    cad retro sprint-1.csv sprint-2.csv --min-votes 5\n\n    # Write CSV and Markdown reports\n    cad retro exports/*.csv --export-csv feedback.csv --export-md feedback.md"
    )]
    Retro(cmd::retro::RetroArgs),

    #[command(
        next_help_heading = "Retrospectives",
        about = "Join a sprint plan with retrospective feedback",
        after_help = "EXAMPLES:\n    # Plan, consolidate, and cross-reference\n    cad insights --tasks backlog.csv --member Alice=80 --retro sprint-1.csv --retro sprint-2.csv"
    )]
    Insights(cmd::insights::InsightsArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    cad completions bash > ~/.local/share/bash-completion/completions/cad"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if quiet {
            "error"
        } else if verbose || env::var("DEBUG").is_ok() {
            "cadence=debug,info"
        } else {
            "cadence=info,warn"
        })
    });

    let format = env::var("CADENCE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(command: Commands, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Plan(ref args) => cmd::plan::run_plan(args, output, project_root),
        Commands::Summary(ref args) => cmd::summary::run_summary(args, output),
        Commands::Retro(ref args) => cmd::retro::run_retro(args, output, project_root),
        Commands::Insights(ref args) => cmd::insights::run_insights(args, output, project_root),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let output = resolve_output_mode(cli.format, cli.json);
    let result = env::current_dir()
        .context("failed to resolve the working directory")
        .and_then(|root| {
            debug!(root = %root.display(), ?output, "starting command");
            run(cli.command, output, &root)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let rendered = CliError::from_anyhow(&err);
            if render_error(output, &rendered).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
