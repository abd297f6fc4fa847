//! `dump` and `restore` command handlers.

use crate::{Cli, DumpArgs, RestoreArgs};
use anyhow::{Context, bail};
use dbmasker_core::orchestrator::LEGACY_DUMP_FILE;
use dbmasker_core::{
    ConnectionMaskConfig, DatabaseTarget, MaskerConfig, MaskingOrchestrator, OperationResult,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, warn};

/// Configuration file read when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "dbmasker.json";

/// Connection name used for the `DATABASE_URL` shortcut.
const URL_CONNECTION: &str = "default";

/// Loads the configuration file and applies the `DATABASE_URL` shortcut.
///
/// A missing default file yields an empty configuration; a missing file
/// named explicitly is an error.
pub(crate) fn load_config(path: &Path, database_url: Option<&str>) -> anyhow::Result<MaskerConfig> {
    let mut config = if path.exists() {
        MaskerConfig::from_json_file(path)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?
    } else if path == Path::new(DEFAULT_CONFIG_FILE) {
        MaskerConfig::new()
    } else {
        bail!("Config file not found: {}", path.display());
    };

    if let Some(url) = database_url {
        config
            .databases
            .insert(URL_CONNECTION.to_string(), DatabaseTarget::new(url));
        if config.default_connection.is_none() {
            config.default_connection = Some(URL_CONNECTION.to_string());
        }
    }

    config.validate()?;
    Ok(config)
}

/// Masking rules for a named connection.
///
/// Without any `connections` section the top-level rules apply to every
/// connection.
pub(crate) fn connection_config(
    config: &MaskerConfig,
    name: &str,
) -> anyhow::Result<ConnectionMaskConfig> {
    if config.connections.is_empty() {
        return Ok(config.legacy_connection_config());
    }
    match config.connections.get(name) {
        Some(connection) => Ok(connection.clone()),
        None => bail!("Connection '{}' not found in configuration.", name),
    }
}

/// Existing dump to restore when `--input` is absent: the connection's own
/// file, falling back to the legacy single-connection file.
pub(crate) fn default_restore_input(config: &MaskerConfig, name: &str) -> PathBuf {
    let dir = config.resolve_output_dir(None);
    let candidate = dir.join(config.connection_config(name).output_file_name(name));
    if candidate.exists() {
        candidate
    } else {
        dir.join(LEGACY_DUMP_FILE)
    }
}

/// Interprets a confirmation answer; an empty answer means yes.
pub(crate) fn parse_confirmation(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes"
    )
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [Y/n] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(parse_confirmation(&answer))
}

fn display_result(result: &OperationResult) {
    if result.is_success() {
        println!(
            "Connection '{}': masked database dump created successfully",
            result.connection
        );
        if let Some(file) = &result.output_file {
            println!("  Output file: {}", file.display());
        }
        if let Some(tables) = result.tables_processed {
            println!("  Tables processed: {}", tables);
        }
    } else {
        println!(
            "Connection '{}': failed to create masked database dump",
            result.connection
        );
        if let Some(error) = &result.error {
            println!("  Error: {}", error);
        }
    }
}

fn elapsed(start: Instant) -> String {
    format!("{:.2} seconds", start.elapsed().as_secs_f64())
}

/// Creates masked dumps for one or all connections.
pub(crate) async fn dump(cli: &Cli, args: &DumpArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(&cli.config, cli.database_url.as_deref())?;
    let start = Instant::now();

    let results = if let Some(name) = &args.connection {
        info!("Creating masked database dump for connection: {}", name);
        let mask_config = connection_config(&config, name)?;
        let output = args.output.clone().unwrap_or_else(|| {
            config
                .resolve_output_dir(args.output_path.as_deref())
                .join(mask_config.output_file_name(name))
        });

        let orchestrator = MaskingOrchestrator::new(config);
        vec![
            orchestrator
                .create_masked_dump_for_connection(name, &mask_config, Some(&output))
                .await,
        ]
    } else {
        if args.output.is_some() {
            warn!("--output applies to a single connection and is ignored");
        }
        info!("Creating masked database dumps for all configured connections");
        let orchestrator = MaskingOrchestrator::new(config);
        orchestrator
            .create_masked_dumps(args.output_path.as_deref())
            .await
            .into_values()
            .collect()
    };

    for result in &results {
        display_result(result);
    }
    println!("Total time taken: {}", elapsed(start));

    if results.iter().all(OperationResult::is_success) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Dumps a connection (unless `--no-dump`) and restores the dump into it.
pub(crate) async fn restore(cli: &Cli, args: &RestoreArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(&cli.config, cli.database_url.as_deref())?;
    let name = match args.connection.clone() {
        Some(name) => name,
        None => config
            .default_connection_name()
            .map(str::to_string)
            .context("No --connection given and no default connection configured")?,
    };

    let input = if args.no_dump {
        let input = args
            .input
            .clone()
            .unwrap_or_else(|| default_restore_input(&config, &name));
        if !input.exists() {
            bail!("Input file not found: {}", input.display());
        }
        input
    } else {
        info!("Creating masked database dump for connection: {}", name);
        let mask_config = connection_config(&config, &name)?;
        let output = args.input.clone().unwrap_or_else(|| {
            config
                .resolve_output_dir(None)
                .join(mask_config.output_file_name(&name))
        });

        let start = Instant::now();
        let result = MaskingOrchestrator::new(config.clone())
            .create_masked_dump_for_connection(&name, &mask_config, Some(&output))
            .await;
        if !result.is_success() {
            bail!(
                "Failed to create masked database dump: {}",
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        println!("Masked database dump created: {}", output.display());
        println!("Time taken: {}", elapsed(start));
        output
    };

    if !args.force
        && !confirm(&format!(
            "This will overwrite the database for connection '{}'. Are you sure?",
            name
        ))?
    {
        println!("Operation cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    info!("Restoring masked database to connection: {}", name);
    let start = Instant::now();
    MaskingOrchestrator::new(config)
        .restore_masked_dump(&input, Some(&name))
        .await?;

    println!("Database restored successfully with masked data!");
    println!("Connection: {}", name);
    println!("Time taken: {}", elapsed(start));
    Ok(ExitCode::SUCCESS)
}
