//! ccms - search local Claude Code JSONL conversation logs from the shell.

mod error;
mod output;

use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Parser;

use ccms_core::{Coordinator, FilterSet, MessageKind, Query};
use error::AppError;
use output::Format;

const DEFAULT_PATTERN: &str = "~/.claude/projects/**/*.jsonl";

#[derive(Parser)]
#[command(
    name = "ccms",
    version,
    about = "Search Claude Code JSONL conversation logs",
    long_about = "Searches local ~/.claude/projects session logs with a small boolean\n\
                  query language (AND/OR/NOT, quoted phrases, /regex/flags) and\n\
                  metadata filters, scanning files in parallel across a worker pool.\n\
                  \n\
                  Examples:\n\
                    ccms \"connection AND failed\"\n\
                    ccms --role user --session abc123 \"/^Error:\\s*\\d+/i\"\n\
                    ccms --project ~/code/myapp -n 20 -f json \"gem\""
)]
struct Cli {
    /// Query string; boolean expression over literals and /regex/flags (empty matches all)
    #[arg(default_value = "")]
    query: String,

    /// Glob pattern to search
    #[arg(short = 'p', long = "pattern", default_value = DEFAULT_PATTERN)]
    pattern: String,

    /// Restrict to one message role
    #[arg(short = 'r', long = "role")]
    role: Option<String>,

    /// Restrict to one session id
    #[arg(short = 's', long = "session")]
    session: Option<String>,

    /// Restrict to messages under this project path prefix
    #[arg(long)]
    project: Option<String>,

    /// Only messages before this RFC3339 timestamp
    #[arg(long)]
    before: Option<String>,

    /// Only messages after this RFC3339 timestamp
    #[arg(long)]
    after: Option<String>,

    /// Result cap, 0 = unlimited
    #[arg(short = 'n', long = "max", default_value_t = 50)]
    max: usize,

    /// Output format: text, json, or jsonl
    #[arg(short = 'f', long = "format", default_value = "text")]
    format: String,

    /// Emit the full searchable text instead of a trimmed snippet
    #[arg(long)]
    full_text: bool,

    /// Exclude Claude Code protocol plumbing (local commands, interruption
    /// markers) from results
    #[arg(long)]
    hide_noise: bool,

    /// Disable ANSI color escapes
    #[arg(long)]
    no_color: bool,

    /// Emit discovery and per-file diagnostics to stderr
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Hand off to the interactive TUI instead of printing once
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Worker thread count; defaults to the number of logical CPUs
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ccms: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, AppError> {
    // Validated eagerly even in interactive mode: a malformed positional
    // query is still a fatal usage error before any worker or TUI starts.
    let query = Query::parse(&cli.query)?;
    let filters = build_filters(&cli)?;

    if cli.interactive {
        ccms_tui::run(cli.pattern.clone(), cli.query.clone(), filters, cli.max)
            .map(|_| ExitCode::SUCCESS)
            .map_err(|e| AppError::Usage(format!("interactive session failed: {e}")))
    } else {
        run_once(cli, query, filters)
    }
}

fn run_once(cli: Cli, query: Query, filters: FilterSet) -> Result<ExitCode, AppError> {
    let format: Format = cli
        .format
        .parse()
        .map_err(AppError::Usage)?;

    let mut coordinator = Coordinator::new(query, filters, cli.max);
    if let Some(workers) = cli.workers {
        coordinator = coordinator.with_workers(workers);
    }

    let cancelled = coordinator.cancel_handle();
    let sigint_target = cancelled.clone();
    // Best-effort: a process that fails to install the handler still runs,
    // it simply can't be interrupted early (SPEC_FULL.md §C.3).
    let _ = ctrlc::set_handler(move || {
        sigint_target.store(true, Ordering::Relaxed);
    });

    let started = Instant::now();
    let outcome = coordinator.run(&cli.pattern)?;
    let elapsed = started.elapsed();

    if cli.verbose {
        for diagnostic in &outcome.diagnostics {
            eprintln!("{diagnostic}");
        }
        eprintln!(
            "scanned {} file(s), {} total match(es)",
            outcome.files_scanned, outcome.total_matches
        );
    }

    let color = output::color_enabled(cli.no_color);
    output::render(&outcome, format, cli.full_text, elapsed, cli.max, color);

    if cancelled.load(Ordering::Relaxed) {
        Ok(ExitCode::from(130))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// `RUST_LOG` wins when set; otherwise `-v/--verbose` raises the default
/// filter from `warn` to `debug`. Logs go to stderr so they never mix with
/// result output on stdout (`-f json`/`jsonl` in particular).
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_filters(cli: &Cli) -> Result<FilterSet, AppError> {
    let role = cli
        .role
        .as_deref()
        .map(|s| {
            MessageKind::parse(s)
                .ok_or_else(|| AppError::Usage(format!("invalid --role '{s}': expected user|assistant|system|summary")))
        })
        .transpose()?;

    let before = parse_timestamp(&cli.before, "--before")?;
    let after = parse_timestamp(&cli.after, "--after")?;

    Ok(FilterSet {
        role,
        session_id: cli.session.clone(),
        project_path_prefix: cli.project.clone(),
        before,
        after,
        hide_noise: cli.hide_noise,
    })
}

fn parse_timestamp(s: &Option<String>, flag: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    match s {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| AppError::Usage(format!("invalid {flag} '{s}': {e}"))),
    }
}
