//! Replaying a dump through the engine's command-line client.
//!
//! # Security
//! Passwords are handed to the client through its environment variable
//! (`MYSQL_PWD`, `PGPASSWORD`) and never appear in the argument list, in
//! `Debug` output, or in logs.

use crate::Result;
use crate::error::DbMaskerError;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use zeroize::Zeroizing;

/// Connection parameters of a restore target, parsed from its URL.
pub struct RestoreTarget {
    /// Server host name or address
    pub host: Option<String>,
    /// Server port, when not the client's default
    pub port: Option<u16>,
    /// Login user, percent-decoded
    pub user: Option<String>,
    /// Login password, percent-decoded and zeroized on drop
    pub password: Option<Zeroizing<String>>,
    /// Database name, percent-decoded
    pub database: Option<String>,
}

impl std::fmt::Debug for RestoreTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("database", &self.database)
            .finish()
    }
}

fn percent_decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

impl RestoreTarget {
    /// Parses a `mysql://` or `postgres://` URL.
    ///
    /// # Errors
    /// Returns a configuration error for unparsable URLs; the message never
    /// contains the URL itself.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url).map_err(|e| {
            DbMaskerError::configuration(format!("Invalid restore target URL: {}", e))
        })?;

        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };

        Ok(Self {
            host: parsed.host_str().map(str::to_string).and_then(non_empty),
            port: parsed.port(),
            user: non_empty(percent_decode(parsed.username())),
            password: parsed
                .password()
                .map(|p| Zeroizing::new(percent_decode(p))),
            database: non_empty(percent_decode(parsed.path().trim_start_matches('/'))),
        })
    }
}

/// A fully prepared client invocation.
pub struct RestoreCommand {
    /// Executable name, resolved through `PATH`
    pub program: String,
    /// Arguments, free of credentials
    pub args: Vec<String>,
    /// Extra environment, such as the password variable
    pub env: Vec<(String, Zeroizing<String>)>,
    /// File connected to the client's standard input
    pub stdin: Option<PathBuf>,
}

impl std::fmt::Debug for RestoreCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("RestoreCommand")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &env_keys)
            .field("stdin", &self.stdin)
            .finish()
    }
}

impl RestoreCommand {
    /// Value of an environment entry.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// `mysql` reading the dump from stdin.
pub fn mysql_command(target: &RestoreTarget, input: &Path) -> RestoreCommand {
    let mut args = Vec::new();
    if let Some(host) = &target.host {
        args.push(format!("--host={}", host));
    }
    if let Some(port) = target.port {
        args.push(format!("--port={}", port));
    }
    if let Some(user) = &target.user {
        args.push(format!("--user={}", user));
    }
    if let Some(database) = &target.database {
        args.push(database.clone());
    }

    let env = target
        .password
        .iter()
        .map(|p| ("MYSQL_PWD".to_string(), p.clone()))
        .collect();

    RestoreCommand {
        program: "mysql".to_string(),
        args,
        env,
        stdin: Some(input.to_path_buf()),
    }
}

/// `psql` executing the dump file, stopping on the first error.
pub fn psql_command(target: &RestoreTarget, input: &Path) -> RestoreCommand {
    let mut args = vec![
        "--no-psqlrc".to_string(),
        "--quiet".to_string(),
        "--set".to_string(),
        "ON_ERROR_STOP=1".to_string(),
    ];
    if let Some(host) = &target.host {
        args.extend(["--host".to_string(), host.clone()]);
    }
    if let Some(port) = target.port {
        args.extend(["--port".to_string(), port.to_string()]);
    }
    if let Some(user) = &target.user {
        args.extend(["--username".to_string(), user.clone()]);
    }
    if let Some(database) = &target.database {
        args.extend(["--dbname".to_string(), database.clone()]);
    }
    args.extend(["--file".to_string(), input.display().to_string()]);

    let env = target
        .password
        .iter()
        .map(|p| ("PGPASSWORD".to_string(), p.clone()))
        .collect();

    RestoreCommand {
        program: "psql".to_string(),
        args,
        env,
        stdin: None,
    }
}

/// `sqlite3` reading the dump from stdin, aborting on the first error.
pub fn sqlite_command(database: &Path, input: &Path) -> RestoreCommand {
    RestoreCommand {
        program: "sqlite3".to_string(),
        args: vec!["-bail".to_string(), database.display().to_string()],
        env: Vec::new(),
        stdin: Some(input.to_path_buf()),
    }
}

/// Runs a restore command to completion, capturing its output.
///
/// # Errors
/// Returns `RestoreFailure` carrying stdout and stderr when the client cannot
/// be started or exits unsuccessfully.
pub async fn run_restore(command: &RestoreCommand) -> Result<()> {
    let mut process = tokio::process::Command::new(&command.program);
    process
        .args(&command.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in &command.env {
        process.env(key, value.as_str());
    }

    match &command.stdin {
        Some(path) => {
            let file = std::fs::File::open(path).map_err(|e| {
                DbMaskerError::io(format!("Failed to open dump file {}", path.display()), e)
            })?;
            process.stdin(Stdio::from(file));
        }
        None => {
            process.stdin(Stdio::null());
        }
    }

    tracing::debug!("Running restore command: {:?}", command);

    let output = process
        .output()
        .await
        .map_err(|e| DbMaskerError::RestoreFailure {
            tool: command.program.clone(),
            exit_code: None,
            output: format!("failed to start {}: {}", command.program, e),
        })?;

    if !output.status.success() {
        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !captured.is_empty() && !stderr.is_empty() {
            captured.push('\n');
        }
        captured.push_str(&stderr);

        return Err(DbMaskerError::RestoreFailure {
            tool: command.program.clone(),
            exit_code: output.status.code(),
            output: captured.trim_end().to_string(),
        });
    }

    Ok(())
}
