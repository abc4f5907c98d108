use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemalift_catalog::{Connector, SnowflakeConnector};
use schemalift_core::{
    read_table_list, Config, ConfigError, ConnectionConfig, LiftConfig, Namespace, RunPhase,
    RunReport,
};
use schemalift_engine::error::{EXIT_CONFIG, EXIT_FAILURE};
use schemalift_engine::{check_connection, snapshot, EventSink, LiftError, RunEvent, Sequencer};

const DEFAULT_CONFIG_FILE: &str = "schemalift.toml";

/// SchemaLift - Copy DEV table definitions into PROD
#[derive(Parser)]
#[command(name = "schemalift")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: schemalift.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot DEV definitions and create missing PROD tables (default)
    Run(RunArgs),

    /// Verify warehouse credentials with `SELECT 1`
    Check,
}

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
struct RunArgs {
    /// Table list file (comma or newline separated)
    #[arg(short, long)]
    tables: Option<PathBuf>,

    /// DEV database to copy from
    #[arg(long)]
    dev_db: Option<String>,

    /// DEV schema to copy from
    #[arg(long)]
    dev_schema: Option<String>,

    /// PROD database to create tables in
    #[arg(long)]
    prod_db: Option<String>,

    /// PROD schema to create tables in
    #[arg(long)]
    prod_schema: Option<String>,

    /// Root directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Skip the DEV snapshot and only migrate
    #[arg(long)]
    no_snapshot: bool,

    /// Print the planned statements without connecting
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON run report
    #[arg(short, long)]
    report: Option<PathBuf>,
}

impl RunArgs {
    /// Apply flag overrides on top of the resolved settings
    fn apply(&self, config: &mut LiftConfig) {
        if self.dev_db.is_some() || self.dev_schema.is_some() {
            config.source = Namespace::new(
                self.dev_db.as_deref().unwrap_or(&config.source.database),
                self.dev_schema.as_deref().unwrap_or(&config.source.schema),
            );
        }
        if self.prod_db.is_some() || self.prod_schema.is_some() {
            config.target = Namespace::new(
                self.prod_db.as_deref().unwrap_or(&config.target.database),
                self.prod_schema.as_deref().unwrap_or(&config.target.schema),
            );
        }
        if let Some(tables) = &self.tables {
            config.tables_file = tables.clone();
        }
        if let Some(root) = &self.snapshot_dir {
            config.snapshot_root = root.clone();
        }
        if self.no_snapshot {
            config.snapshot_enabled = false;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // A missing .env is fine; the process environment may already be set
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env loaded");
    }

    if let Err(err) = dispatch(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(exit_code(&err));
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.verbose)?;
    let connector = SnowflakeConnector::new();

    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run_command(&config, &args, &connector, cli.verbose).await,
        Commands::Check => check_command(&config, &connector).await,
    }
}

/// Load the config file, falling back to defaults when none exists
fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return Config::from_file(path);
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        Config::from_file(default_path)
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Ok(Config::default())
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Run command - snapshot DEV and create missing PROD tables
async fn run_command(
    config: &Config,
    args: &RunArgs,
    connector: &dyn Connector,
    verbose: bool,
) -> anyhow::Result<()> {
    let mut lift = LiftConfig::resolve(config, &env_lookup);
    args.apply(&mut lift);

    if verbose {
        eprintln!("{} {} → {}", "Using".cyan(), lift.source, lift.target);
        eprintln!("{} {}", "Table list:".cyan(), lift.tables_file.display());
    }

    if args.dry_run {
        return dry_run(&lift, connector);
    }

    let credentials = ConnectionConfig::resolve(&config.connection, &env_lookup)?;
    let sequencer = Sequencer::new(&lift, connector);

    println!("{} run {}", "Starting".cyan(), sequencer.run_id());

    let mut printer = StatusPrinter::new(verbose);
    let report = sequencer.run(&credentials, &mut printer).await?;

    if let Some(path) = &args.report {
        report.save_to_file(path)?;
        println!("{} {}", "Report written to".green(), path.display());
    }

    print_run_summary(&report);
    Ok(())
}

/// Print the statements a run would execute
fn dry_run(config: &LiftConfig, connector: &dyn Connector) -> anyhow::Result<()> {
    let tables = read_table_list(&config.tables_file)?;
    let sequencer = Sequencer::new(config, connector);

    println!("{}", "Dry run, nothing will be executed".yellow().bold());
    if config.snapshot_enabled {
        println!(
            "{} {}",
            "Snapshot directory:".cyan(),
            snapshot::snapshot_dir(&config.snapshot_root, &config.source, sequencer.run_id()).display()
        );
    }

    for statement in sequencer.plan(&tables) {
        println!("  {}", statement);
    }

    Ok(())
}

/// Check command - open a session and run `SELECT 1`
async fn check_command(config: &Config, connector: &dyn Connector) -> anyhow::Result<()> {
    let credentials = ConnectionConfig::resolve(&config.connection, &env_lookup)?;

    check_connection(connector, &credentials).await?;

    println!(
        "{} {} as {} ({}, role {})",
        "✓ Connected to".green().bold(),
        connector.name(),
        credentials.user,
        credentials.account,
        credentials.role
    );
    Ok(())
}

/// Process exit status for a failed command
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(lift) = err.downcast_ref::<LiftError>() {
        lift.exit_code()
    } else if err.downcast_ref::<ConfigError>().is_some() {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}

/// Prints run events as status lines
struct StatusPrinter {
    verbose: bool,
}

impl StatusPrinter {
    fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl EventSink for StatusPrinter {
    fn on_event(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Phase(RunPhase::Failed) => {
                eprintln!("{}", "✗ Run failed".red().bold());
            }
            RunEvent::Phase(phase) => {
                if self.verbose {
                    eprintln!("{} {}", "→".cyan(), phase);
                }
            }
            RunEvent::SnapshotDirReady(dir) => {
                println!("{} {}", "Snapshot directory".cyan(), dir.display());
            }
            RunEvent::FileWritten(path) => {
                println!("  {} {}", "✓ Wrote".green(), path.display());
            }
            RunEvent::StatementExecuted(sql) => {
                println!("  {} {}", "✓".green(), sql);
            }
        }
    }
}

/// Print run summary to stdout
fn print_run_summary(report: &RunReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schema Lift Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Run:    {}", report.run_id);
    println!("Source: {}", report.source);
    println!("Target: {}", report.target);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Tables:     {}", report.tables.len());
    println!("  Statements: {}", report.statements.len());
    println!("  Files:      {}", report.snapshot_files.len());
    if let Some(dir) = &report.snapshot_dir {
        println!("  Snapshot:   {}", dir.display());
    }
    println!();

    if report.tables.is_empty() {
        println!("{}", "⚠ Table list was empty, only the schema was ensured".yellow());
    } else if report.is_done() {
        println!("{}", "✓ Done".green().bold());
    }

    println!("{}", "=".repeat(60).bright_blue());
}
