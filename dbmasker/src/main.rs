//! Masked database dump and restore tool.
//!
//! This binary reads the configured databases, replaces sensitive column
//! values with synthetic data, and writes SQL dumps that can be replayed
//! into a development database.
//!
//! # Security Guarantees
//! - Source databases are only read during a dump
//! - No credentials stored or logged
//! - Restores never run without confirmation unless `--force` is given

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dbmasker")]
#[command(about = "Create and restore masked database dumps")]
#[command(version)]
#[command(long_about = "
dbmasker - Masked database dumps for development and testing

Reads every table of the configured databases, substitutes synthetic values
for the configured columns, and writes a self-contained SQL dump per
connection. Dumps can be restored with the engine's own client.

SUPPORTED DATABASES:
- MySQL / MariaDB (mysql://, mariadb://)
- PostgreSQL (postgres://, postgresql://)
- SQLite (sqlite: or .db/.sqlite/.sqlite3 files)

EXAMPLES:
  dbmasker dump
  dbmasker dump --connection app --output app.sql
  dbmasker restore --connection staging --force
  dbmasker restore --no-dump --input masked_database_app.sql
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,

    /// Masking configuration file
    #[arg(
        short,
        long,
        global = true,
        default_value = commands::DEFAULT_CONFIG_FILE,
        help = "Masking configuration file (JSON)"
    )]
    pub config: PathBuf,

    /// Single database target shortcut
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        help = "Database connection string used as the 'default' connection (credentials will be sanitized in logs)"
    )]
    pub database_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create masked dumps
    Dump(DumpArgs),
    /// Create a masked dump and restore it into a database
    Restore(RestoreArgs),
}

#[derive(Args)]
pub struct DumpArgs {
    /// Connection to dump
    #[arg(long, help = "Specific connection to process (default: all configured)")]
    pub connection: Option<String>,

    /// Output directory
    #[arg(long, help = "Output directory for dump files")]
    pub output_path: Option<PathBuf>,

    /// Output file
    #[arg(short, long, help = "Output file path (single connection only)")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Connection to restore into
    #[arg(long, help = "Connection to dump and restore (default: the default connection)")]
    pub connection: Option<String>,

    /// Dump file
    #[arg(
        short,
        long,
        help = "Dump file to write and restore (default: masked_database_<connection>.sql)"
    )]
    pub input: Option<PathBuf>,

    /// Restore an existing dump
    #[arg(long, help = "Skip creating the dump and restore an existing file")]
    pub no_dump: bool,

    /// Skip confirmation
    #[arg(long, help = "Restore without asking for confirmation")]
    pub force: bool,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = dbmasker_core::init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let outcome = match &cli.command {
        Command::Dump(args) => commands::dump(&cli, args).await,
        Command::Restore(args) => commands::restore(&cli, args).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
