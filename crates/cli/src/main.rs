mod config;
mod entity;
mod restore;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use confhist_storage::{
    validate_entity_name, AccessGate, Author, HistoryAction, HistoryError, HistoryStore, Operation,
    RecordWriter, RevisionId,
};
use tracing_subscriber::EnvFilter;

use crate::config::ConfhistConfig;
use crate::entity::FileEntity;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Kind of change being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OperationArg {
    Created,
    Changed,
    Deleted,
    Renamed,
}

impl From<OperationArg> for Operation {
    fn from(op: OperationArg) -> Self {
        match op {
            OperationArg::Created => Operation::Created,
            OperationArg::Changed => Operation::Changed,
            OperationArg::Deleted => Operation::Deleted,
            OperationArg::Renamed => Operation::Renamed,
        }
    }
}

/// Configuration history store.
#[derive(Parser)]
#[command(name = "confhist", version, about = "Configuration history store")]
struct Cli {
    /// Path to the config file (default: ./confhist.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// History root directory, overriding the config file
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Acting user, checked against the [access] section
    #[arg(long, global = true)]
    user: Option<String>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log debug details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the recorded revisions of an entity
    List {
        /// Entity name, e.g. `team/app`
        entity: String,
    },

    /// Print the configuration stored in one revision
    Show {
        /// Entity name
        entity: String,
        /// Revision timestamp (YYYY-MM-DD-hh-mm-ss)
        timestamp: String,
    },

    /// Record the entity's current configuration as a new revision
    Record {
        /// Entity name
        entity: String,
        /// Kind of change being recorded
        #[arg(long, value_enum, default_value = "changed")]
        operation: OperationArg,
        /// Read the configuration from this file instead of the entity's own
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Restore an entity to a recorded revision
    Restore {
        /// Entity name
        entity: String,
        /// Revision timestamp (YYYY-MM-DD-hh-mm-ss)
        timestamp: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Per-invocation context shared by all subcommands.
pub(crate) struct Context {
    pub config: ConfhistConfig,
    pub gate: Box<dyn AccessGate>,
    pub user: Option<String>,
    pub output: OutputFormat,
    pub quiet: bool,
}

impl Context {
    pub fn store(&self) -> HistoryStore {
        HistoryStore::new(&self.config.history).with_entities_root(&self.config.entities.root)
    }

    pub fn writer(&self) -> RecordWriter {
        RecordWriter::new(&self.config.history)
    }

    pub fn entity(&self, name: &str) -> FileEntity {
        FileEntity::new(name, self.config.entity_config_file(name))
    }

    pub fn author(&self) -> Author {
        self.user.as_deref().map(Author::user).unwrap_or_default()
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&format!("error: {}", msg), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    if let Some(root) = cli.root {
        config.history.root = root;
    }

    let ctx = Context {
        gate: config.gate(cli.user.as_deref()),
        config,
        user: cli.user,
        output: cli.output,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::List { entity } => cmd_list(&ctx, &entity),
        Commands::Show { entity, timestamp } => cmd_show(&ctx, &entity, &timestamp),
        Commands::Record {
            entity,
            operation,
            file,
        } => cmd_record(&ctx, &entity, operation.into(), file.as_deref()),
        Commands::Restore {
            entity,
            timestamp,
            yes,
        } => restore::cmd_restore(&ctx, &entity, &timestamp, yes),
    };

    if let Err(e) = result {
        report_history_error(&e, ctx.output, ctx.quiet);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("CONFHIST_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_list(ctx: &Context, name: &str) -> Result<(), HistoryError> {
    validate_entity_name(name)?;
    let store = ctx.store();
    let entity = ctx.entity(name);
    let listing = HistoryAction::new(&store, ctx.gate.as_ref()).job_configs(&entity)?;

    match ctx.output {
        OutputFormat::Json => {
            let errors: Vec<serde_json::Value> = listing
                .errors
                .iter()
                .map(|e| serde_json::json!({ "path": e.path, "reason": e.reason }))
                .collect();
            let json = serde_json::json!({
                "entity": name,
                "revisions": listing.configs,
                "errors": errors,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            if !ctx.quiet {
                for err in &listing.errors {
                    eprintln!("warning: skipped unreadable record {}", err);
                }
            }
            if listing.is_empty() {
                if !ctx.quiet {
                    println!("no history for '{}'", name);
                }
                return Ok(());
            }
            println!("{:<21}{:<10}USER", "TIMESTAMP", "OPERATION");
            for info in &listing.configs {
                println!(
                    "{:<21}{:<10}{}",
                    info.id.timestamp.to_string(),
                    info.operation.as_str(),
                    info.user.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

fn cmd_show(ctx: &Context, name: &str, timestamp: &str) -> Result<(), HistoryError> {
    let id = RevisionId::from_params(Some(name), Some(timestamp))?;
    ctx.gate.check_permission(&id.name)?;
    let record = ctx.store().resolve_revision(&ctx.entity(&id.name), id.timestamp)?;

    match ctx.output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "revision": record.info,
                "config": String::from_utf8_lossy(&record.payload),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(&record.payload).and_then(|_| stdout.flush()) {
                report_error(&format!("error writing output: {}", e), ctx.output, ctx.quiet);
                process::exit(1);
            }
        }
    }
    Ok(())
}

fn cmd_record(
    ctx: &Context,
    name: &str,
    operation: Operation,
    file: Option<&Path>,
) -> Result<(), HistoryError> {
    validate_entity_name(name)?;
    ctx.gate.check_permission(name)?;

    let payload = if operation.has_payload() {
        let source = file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| ctx.config.entity_config_file(name));
        let bytes = std::fs::read(&source).map_err(|e| {
            HistoryError::InvalidRequest(format!(
                "could not read configuration '{}': {}",
                source.display(),
                e
            ))
        })?;
        Some(bytes)
    } else {
        None
    };

    let id = ctx
        .writer()
        .record(name, operation, &ctx.author(), payload.as_deref())?;

    match ctx.output {
        OutputFormat::Json => {
            let json = serde_json::json!({ "recorded": id, "operation": operation.as_str() });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            if !ctx.quiet {
                println!("recorded {} ({})", id, operation);
            }
        }
    }
    Ok(())
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{{\"error\": \"{}\"}}", msg.replace('"', "\\\""));
        }
    }
}

/// Like [`report_error`], but keeps the error class visible to scripts.
pub(crate) fn report_history_error(err: &HistoryError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let mut causes = Vec::new();
            let mut source = std::error::Error::source(err);
            while let Some(cause) = source {
                causes.push(cause.to_string());
                source = std::error::Error::source(cause);
            }
            let json = serde_json::json!({
                "error": err.to_string(),
                "kind": err.kind(),
                "causes": causes,
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            if quiet {
                return;
            }
            eprintln!("error: {}", err);
            let mut source = std::error::Error::source(err);
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = std::error::Error::source(cause);
            }
        }
    }
}
