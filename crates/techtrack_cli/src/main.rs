//! `techtrack` command-line front end.
//!
//! # Responsibility
//! - Map subcommands onto `techtrack_core` store and session operations.
//! - Resolve configuration from the environment, with flags taking priority.
//!
//! # Invariants
//! - The store is always closed (flushed) before the process exits.
//! - Persistence warnings are reported but never turn an applied change
//!   into a failure exit.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;
use techtrack_core::{
    export_file_name, init_logging, open_db, open_db_in_memory, AccessGuard, BulkOutcome,
    GatedOperation, LoadSource, Mutation, NewTechnology, PersistenceWarning, SessionGuard, SlotRepository,
    SnapshotPersistence, SqliteSlotRepository, Technology, TechnologyId, TechnologyPersistence,
    TechnologyStore, TrackerConfig,
};
use uuid::Uuid;

/// Track learning progress across technologies.
#[derive(Parser)]
#[command(name = "techtrack", version, about)]
struct Cli {
    /// SQLite database file; `:memory:` for a throwaway store.
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Absolute directory for rotated log files.
    #[arg(long, value_name = "DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List tracked technologies.
    List {
        /// Only show overdue technologies.
        #[arg(long)]
        overdue: bool,
    },

    /// Show one technology in detail.
    Show {
        /// Id or exact title.
        technology: String,
    },

    /// Track a new technology.
    Add {
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,

        /// Resource link; repeatable.
        #[arg(long = "resource", value_name = "URL")]
        resources: Vec<String>,
    },

    /// Stop tracking a technology.
    Remove { technology: String },

    /// Set the status of one technology.
    Status {
        technology: String,
        /// NOT_STARTED | IN_PROGRESS | COMPLETED
        status: String,
    },

    /// Replace notes; an empty string clears them.
    Notes { technology: String, text: String },

    /// Set the deadline (YYYY-MM-DD); omit the date to clear it.
    Deadline {
        technology: String,
        date: Option<String>,
    },

    /// Set one status on several technologies. Requires a signed-in session.
    BulkStatus {
        status: String,
        #[arg(required = true)]
        technologies: Vec<String>,
    },

    /// Mark every technology completed. Requires a signed-in session.
    MarkAllComplete,

    /// Reset every technology to not started. Requires a signed-in session.
    ResetAll,

    /// Export the collection as JSON. Requires a signed-in session.
    Export {
        /// Output file, or a directory to receive `technologies-<date>.json`.
        /// Prints to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Suggest a random technology to study next. Requires a signed-in session.
    Random,

    /// Show progress counters.
    Progress,

    /// Manage the local session used for bulk operations, export and random.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Print the core library version.
    Version,
}

#[derive(Subcommand)]
enum SessionCommand {
    SignIn { username: String },
    SignOut,
    Show,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Version = cli.command {
        println!("techtrack_core version={}", techtrack_core::core_version());
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    if let Err(err) = init_logging(config.log_level, &config.log_dir.to_string_lossy()) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let conn = if config.is_in_memory() {
        open_db_in_memory()
    } else {
        open_db(&config.db_path)
    }
    .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;

    if let Command::Session { action } = &cli.command {
        return run_session(SessionGuard::new(SqliteSlotRepository::new(&conn)), action);
    }

    let mut store = TechnologyStore::with_guard(
        SnapshotPersistence::new(SqliteSlotRepository::new(&conn)),
        SessionGuard::new(SqliteSlotRepository::new(&conn)),
    );
    report_load_source(store.load_source());

    let today = Local::now().date_naive();
    let outcome = dispatch(&mut store, cli.command, cli.format, today);
    let closed = store.close();
    outcome?;
    closed.context("changes were applied but could not be saved")?;
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<TrackerConfig> {
    let mut config = TrackerConfig::from_env()?;
    if let Some(db) = &cli.db {
        config = config.with_db_path(db);
    }
    if let Some(level) = &cli.log_level {
        config = config.with_log_level(level)?;
    }
    if let Some(dir) = &cli.log_dir {
        config = config.with_log_dir(dir)?;
    }
    Ok(config)
}

fn dispatch<P, G>(
    store: &mut TechnologyStore<P, G>,
    command: Command,
    format: Format,
    today: NaiveDate,
) -> Result<()>
where
    P: TechnologyPersistence,
    G: AccessGuard,
{
    match command {
        Command::List { overdue } => {
            let rows: Vec<&Technology> = if overdue {
                store.overdue(today)
            } else {
                store.list().iter().collect()
            };
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                Format::Text => {
                    if rows.is_empty() {
                        println!("no technologies tracked");
                    }
                    for technology in rows {
                        println!("{}", summary_line(technology, today));
                    }
                }
            }
        }
        Command::Show { technology } => {
            let id = resolve(store, &technology)?;
            let technology = store.get(id)?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(technology)?),
                Format::Text => print_detail(technology, today),
            }
        }
        Command::Add {
            title,
            description,
            deadline,
            resources,
        } => {
            let mut input = NewTechnology::new(title).deadline(deadline.unwrap_or_default());
            if let Some(description) = description {
                input = input.description(description);
            }
            for url in resources {
                input = input.resource("", url);
            }
            let (id, mutation) = store.add(input)?;
            println!("added {id}");
            report_mutation(&mutation);
        }
        Command::Remove { technology } => {
            let id = resolve(store, &technology)?;
            let (removed, mutation) = store.remove(id)?;
            println!("removed {} ({})", removed.title, removed.id);
            report_mutation(&mutation);
        }
        Command::Status { technology, status } => {
            let id = resolve(store, &technology)?;
            let mutation = store.update_status(id, status.trim())?;
            report_mutation(&mutation);
        }
        Command::Notes { technology, text } => {
            let id = resolve(store, &technology)?;
            let mutation = store.update_notes(id, text)?;
            report_mutation(&mutation);
        }
        Command::Deadline { technology, date } => {
            let id = resolve(store, &technology)?;
            let mutation = store.update_deadline(id, date.as_deref().unwrap_or(""))?;
            report_mutation(&mutation);
        }
        Command::BulkStatus {
            status,
            technologies,
        } => {
            let ids = technologies
                .iter()
                .map(|needle| resolve(store, needle))
                .collect::<Result<Vec<_>>>()?;
            let outcome = store.update_statuses(&ids, status.trim())?;
            report_bulk(&outcome);
        }
        Command::MarkAllComplete => report_bulk(&store.mark_all_complete()?),
        Command::ResetAll => report_bulk(&store.reset_all()?),
        Command::Export { output } => {
            store.check_access(GatedOperation::Export)?;
            let text = store.export_snapshot().to_json_pretty()?;
            match output {
                None => println!("{text}"),
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(export_file_name(today))
                    } else {
                        path
                    };
                    std::fs::write(&path, text)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("wrote {}", path.display());
                }
            }
        }
        Command::Random => {
            store.check_access(GatedOperation::RandomPick)?;
            match store.pick_random() {
                Some(technology) => match format {
                    Format::Json => println!("{}", serde_json::to_string_pretty(technology)?),
                    Format::Text => println!("{}", summary_line(technology, today)),
                },
                None => println!("no technologies tracked"),
            }
        }
        Command::Progress => {
            let summary = store.progress(today);
            match format {
                Format::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "total": summary.total,
                        "notStarted": summary.not_started,
                        "inProgress": summary.in_progress,
                        "completed": summary.completed,
                        "overdue": summary.overdue,
                        "completionPercent": summary.completion_percent,
                    }))?
                ),
                Format::Text => {
                    println!("total        {}", summary.total);
                    println!("not started  {}", summary.not_started);
                    println!("in progress  {}", summary.in_progress);
                    println!("completed    {}", summary.completed);
                    println!("overdue      {}", summary.overdue);
                    println!("completion   {}%", summary.completion_percent);
                }
            }
        }
        Command::Session { .. } | Command::Version => {}
    }
    Ok(())
}

fn run_session<S: SlotRepository>(guard: SessionGuard<S>, action: &SessionCommand) -> Result<()> {
    match action {
        SessionCommand::SignIn { username } => {
            let state = guard.sign_in(username)?;
            println!("signed in as {}", state.username);
        }
        SessionCommand::SignOut => {
            guard.sign_out()?;
            println!("signed out");
        }
        SessionCommand::Show => match guard.current() {
            Some(state) if state.is_authenticated => println!("signed in as {}", state.username),
            _ => println!("signed out"),
        },
    }
    Ok(())
}

/// Accepts a full id or an exact (case-insensitive) title.
fn resolve<P, G>(store: &TechnologyStore<P, G>, needle: &str) -> Result<TechnologyId>
where
    P: TechnologyPersistence,
    G: AccessGuard,
{
    let needle = needle.trim();
    if let Ok(id) = Uuid::parse_str(needle) {
        return Ok(id);
    }
    let matches: Vec<&Technology> = store
        .list()
        .iter()
        .filter(|technology| technology.title.eq_ignore_ascii_case(needle))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.id),
        [] => bail!("no technology with id or title `{needle}`"),
        _ => bail!("title `{needle}` matches several technologies; use the id"),
    }
}

fn summary_line(technology: &Technology, today: NaiveDate) -> String {
    let mut line = format!(
        "{}  {:<11}  {}",
        technology.id,
        technology.status.label(),
        technology.title
    );
    if let Some(deadline) = technology.deadline {
        line.push_str(&format!("  due {deadline}"));
        if technology.is_overdue(today) {
            line.push_str(" (overdue)");
        }
    }
    line
}

fn print_detail(technology: &Technology, today: NaiveDate) {
    println!("{}", technology.title);
    println!("  id        {}", technology.id);
    println!("  status    {}", technology.status.label());
    if let Some(description) = &technology.description {
        println!("  about     {description}");
    }
    match technology.deadline {
        Some(deadline) if technology.is_overdue(today) => {
            println!("  deadline  {deadline} (overdue)")
        }
        Some(deadline) => println!("  deadline  {deadline}"),
        None => println!("  deadline  -"),
    }
    if technology.has_notes() {
        println!("  notes");
        for line in technology.notes.lines() {
            println!("    {line}");
        }
    }
    for resource in &technology.resources {
        println!("  link      {} <{}>", resource.display_label(), resource.url);
    }
}

fn report_load_source(source: &LoadSource) {
    match source {
        LoadSource::RecoveredFromCorruption { reason } => {
            eprintln!("warning: stored technologies were unreadable ({reason}); using defaults")
        }
        LoadSource::StorageUnavailable { reason } => {
            eprintln!("warning: storage unavailable ({reason}); using defaults")
        }
        LoadSource::Stored | LoadSource::Seeded => {}
    }
}

fn report_mutation(mutation: &Mutation) {
    if !mutation.changed {
        println!("unchanged");
    }
    report_warning(mutation.warning.as_ref());
}

fn report_bulk(outcome: &BulkOutcome) {
    println!("updated {} ({} changed)", outcome.updated, outcome.changed);
    for id in &outcome.skipped {
        println!("skipped unknown id {id}");
    }
    report_warning(outcome.warning.as_ref());
}

fn report_warning(warning: Option<&PersistenceWarning>) {
    if let Some(warning) = warning {
        warn!("event=cli_persist module=cli status=error error={}", warning);
        eprintln!("warning: change kept in memory but not saved yet: {warning}");
    }
}
