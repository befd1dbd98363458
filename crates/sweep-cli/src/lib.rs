//! `todo-sweep` command line driver
//!
//! Runs the reconciler against a JSON snapshot of groups, projects, issues,
//! memberships and todos:
//! - `reconcile`: remove the todos a user can no longer see after leaving a
//!   group or project, optionally running the queued private-features rescan
//!   and writing the result back
//! - `inspect`: summarize a snapshot

#![warn(unreachable_pub)]

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sweep_core::{
    ChannelDispatcher, EntityLeaveService, PrivateFeaturesService, PrivateFeaturesWorker,
    ReconcileOutcome, Stores, SweepConfig,
};
use sweep_model::{EntityRef, Todo, UserId};
use sweep_store::{MemoryStore, Snapshot, TodoStore};
use tracing_subscriber::EnvFilter;

/// Build the argument parser
#[must_use]
pub fn command() -> Command {
    let snapshot = Arg::new("snapshot")
        .long("snapshot")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON snapshot of the store");
    let json = Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON");

    Command::new("todo-sweep")
        .version(sweep_core::VERSION)
        .about("Remove todos a user can no longer see after leaving a group or project")
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Reconcile a user's todos after leaving an entity")
                .arg(snapshot.clone())
                .arg(
                    Arg::new("user")
                        .long("user")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Id of the user who left"),
                )
                .arg(
                    Arg::new("entity")
                        .long("entity")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Id of the group or project that was left"),
                )
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .help("Entity type: Project or Group"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML reconciler configuration"),
                )
                .arg(
                    Arg::new("run-rescan")
                        .long("run-rescan")
                        .action(ArgAction::SetTrue)
                        .help("Run queued private-features rescans before exiting"),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .help("Write the updated snapshot back to its file"),
                )
                .arg(json.clone()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Summarize a snapshot")
                .arg(snapshot)
                .arg(
                    Arg::new("user")
                        .long("user")
                        .value_parser(value_parser!(u64))
                        .help("List this user's todos"),
                )
                .arg(json),
        )
}

/// Install the global tracing subscriber
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Logs go to stderr so
/// command output on stdout stays parseable.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // A subscriber may already be installed when driven from tests.
    if json {
        builder.json().try_init().ok();
    } else {
        builder.try_init().ok();
    }
}

/// Result of `reconcile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// User who left
    pub user: UserId,
    /// Entity that was left; `None` if it does not exist
    pub entity: Option<EntityRef>,
    /// Todos removed by the reconciler
    pub deleted: usize,
    /// Whether a private-features rescan was queued
    pub rescan_enqueued: bool,
    /// Todos removed by rescans run with `--run-rescan`
    pub rescan_deleted: usize,
    /// Todos left for the user
    pub remaining: usize,
}

/// Result of `inspect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    /// Number of groups
    pub groups: usize,
    /// Number of projects
    pub projects: usize,
    /// Number of issues
    pub issues: usize,
    /// Number of confidential issues
    pub confidential_issues: usize,
    /// Number of merge requests
    pub merge_requests: usize,
    /// Number of membership grants
    pub memberships: usize,
    /// Number of todos
    pub todos: usize,
    /// Todos of the requested user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_todos: Option<Vec<Todo>>,
}

/// Execute the parsed command and render its output
///
/// # Errors
/// Unreadable snapshot or config files, reconciler failures, and failures
/// writing the snapshot back.
pub async fn run(matches: &ArgMatches) -> Result<String> {
    match matches.subcommand() {
        Some(("reconcile", args)) => {
            let report = reconcile(args).await?;
            render(&report, args.get_flag("json"), render_reconcile)
        }
        Some(("inspect", args)) => {
            let report = inspect(args)?;
            render(&report, args.get_flag("json"), render_inspect)
        }
        _ => Ok(command().render_help().to_string()),
    }
}

/// Run the reconciler for the `reconcile` subcommand
///
/// # Errors
/// See [`run`].
pub async fn reconcile(args: &ArgMatches) -> Result<ReconcileReport> {
    let path = required::<PathBuf>(args, "snapshot")?;
    let user = UserId(*required::<u64>(args, "user")?);
    let entity_id = *required::<u64>(args, "entity")?;
    let kind = required::<String>(args, "kind")?;

    let config = match args.get_one::<PathBuf>("config") {
        Some(config) => SweepConfig::from_path(config)
            .with_context(|| format!("loading config {}", config.display()))?,
        None => SweepConfig::default(),
    };

    let store = Arc::new(load_snapshot(path)?);
    let stores = Stores::in_memory(store.clone(), &config);
    let (dispatcher, mut jobs) = ChannelDispatcher::channel();
    let service = EntityLeaveService::new(stores.clone(), Arc::new(dispatcher), config);

    let outcome = service
        .execute(user, entity_id, kind)
        .await
        .with_context(|| format!("reconciling user {user} after leaving {kind} {entity_id}"))?;

    let rescan_deleted = if args.get_flag("run-rescan") {
        let worker = PrivateFeaturesWorker::new(PrivateFeaturesService::new(stores));
        let stats = worker.drain(&mut jobs).await;
        if stats.jobs_failed > 0 {
            tracing::warn!(failed = stats.jobs_failed, "some rescans failed");
        }
        stats.todos_deleted
    } else {
        0
    };

    if args.get_flag("write") {
        save_snapshot(path, &store.snapshot())?;
        tracing::info!(path = %path.display(), "snapshot written");
    }

    let remaining = store.todos_for_user(user).await?.len();
    let (entity, deleted, rescan_enqueued) = match outcome {
        ReconcileOutcome::EntityNotFound => (None, 0, false),
        ReconcileOutcome::Reconciled {
            entity,
            deleted,
            rescan_enqueued,
        } => (Some(entity), deleted, rescan_enqueued),
    };

    Ok(ReconcileReport {
        user,
        entity,
        deleted,
        rescan_enqueued,
        rescan_deleted,
        remaining,
    })
}

/// Summarize a snapshot for the `inspect` subcommand
///
/// # Errors
/// See [`run`].
pub fn inspect(args: &ArgMatches) -> Result<InspectReport> {
    let path = required::<PathBuf>(args, "snapshot")?;
    let snapshot = read_snapshot(path)?;

    let user_todos = args.get_one::<u64>("user").map(|user| {
        snapshot
            .todos
            .iter()
            .filter(|todo| todo.owner == UserId(*user))
            .cloned()
            .collect()
    });

    Ok(InspectReport {
        groups: snapshot.groups.len(),
        projects: snapshot.projects.len(),
        issues: snapshot.issues.len(),
        confidential_issues: snapshot.issues.iter().filter(|i| i.confidential).count(),
        merge_requests: snapshot.merge_requests.len(),
        memberships: snapshot.memberships.len(),
        todos: snapshot.todos.len(),
        user_todos,
    })
}

/// Load a snapshot file into a fresh store
///
/// # Errors
/// Unreadable or malformed files, and snapshots with duplicate todo ids.
pub fn load_snapshot(path: &Path) -> Result<MemoryStore> {
    let snapshot = read_snapshot(path)?;
    MemoryStore::from_snapshot(snapshot)
        .with_context(|| format!("loading snapshot {}", path.display()))
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&input).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let output = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, output).with_context(|| format!("writing snapshot {}", path.display()))
}

fn required<'a, T: Clone + Send + Sync + 'static>(args: &'a ArgMatches, name: &str) -> Result<&'a T> {
    args.get_one::<T>(name)
        .with_context(|| format!("missing --{name}"))
}

fn render<T: Serialize>(
    report: &T,
    json: bool,
    text: fn(&mut String, &T) -> std::fmt::Result,
) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    let mut out = String::new();
    text(&mut out, report)?;
    Ok(out)
}

fn render_reconcile(out: &mut String, report: &ReconcileReport) -> std::fmt::Result {
    match report.entity {
        Some(entity) => {
            writeln!(out, "Reconciled user {} after leaving {entity}", report.user)?;
            writeln!(out, "  Deleted: {}", report.deleted)?;
            writeln!(out, "  Rescan queued: {}", report.rescan_enqueued)?;
            if report.rescan_deleted > 0 {
                writeln!(out, "  Deleted by rescan: {}", report.rescan_deleted)?;
            }
        }
        None => writeln!(out, "Entity not found, nothing to reconcile")?,
    }
    write!(out, "  Remaining todos: {}", report.remaining)
}

fn render_inspect(out: &mut String, report: &InspectReport) -> std::fmt::Result {
    writeln!(out, "Snapshot Summary")?;
    writeln!(out, "================")?;
    writeln!(out, "  Groups: {}", report.groups)?;
    writeln!(out, "  Projects: {}", report.projects)?;
    writeln!(
        out,
        "  Issues: {} ({} confidential)",
        report.issues, report.confidential_issues
    )?;
    writeln!(out, "  Merge requests: {}", report.merge_requests)?;
    writeln!(out, "  Memberships: {}", report.memberships)?;
    write!(out, "  Todos: {}", report.todos)?;
    for todo in report.user_todos.iter().flatten() {
        write!(out, "\n    {} {:?} in {:?}", todo.id, todo.target, todo.scope)?;
    }
    Ok(())
}
