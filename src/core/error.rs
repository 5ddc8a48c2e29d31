//! Error types for logbook with contextual messages and exit codes
//!
//! A single error type categorizes failures so the CLI can pick an exit code
//! and print a help line. Collaborator failures (git, remote services) are
//! usually caught by the caller and downgraded to warnings; only what reaches
//! `main` terminates the process.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for logbook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Remote service error (polisher, release host)
  Remote = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for logbook
#[derive(Debug)]
pub enum LogbookError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Remote HTTP service errors
  Remote(RemoteError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl LogbookError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    LogbookError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    LogbookError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      LogbookError::Message { message, context, help } => LogbookError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      LogbookError::Io(err) => LogbookError::Message {
        message: ctx_str,
        context: Some(format!("I/O error: {}", err)),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      LogbookError::Config(_) => ExitCode::User,
      LogbookError::Git(_) => ExitCode::System,
      LogbookError::Remote(_) => ExitCode::Remote,
      LogbookError::Io(_) => ExitCode::System,
      LogbookError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      LogbookError::Config(e) => e.help_message(),
      LogbookError::Git(e) => e.help_message(),
      LogbookError::Remote(e) => e.help_message(),
      LogbookError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for LogbookError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LogbookError::Config(e) => write!(f, "{}", e),
      LogbookError::Git(e) => write!(f, "{}", e),
      LogbookError::Remote(e) => write!(f, "{}", e),
      LogbookError::Io(e) => write!(f, "I/O error: {}", e),
      LogbookError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for LogbookError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      LogbookError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for LogbookError {
  fn from(err: io::Error) -> Self {
    LogbookError::Io(err)
  }
}

impl From<String> for LogbookError {
  fn from(msg: String) -> Self {
    LogbookError::message(msg)
  }
}

impl From<&str> for LogbookError {
  fn from(msg: &str) -> Self {
    LogbookError::message(msg)
  }
}

impl From<toml_edit::TomlError> for LogbookError {
  fn from(err: toml_edit::TomlError) -> Self {
    LogbookError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for LogbookError {
  fn from(err: toml_edit::de::Error) -> Self {
    LogbookError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for LogbookError {
  fn from(err: toml_edit::ser::Error) -> Self {
    LogbookError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for LogbookError {
  fn from(err: serde_json::Error) -> Self {
    LogbookError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for LogbookError {
  fn from(err: semver::Error) -> Self {
    LogbookError::message(format!("Invalid semantic version: {}", err))
  }
}

impl From<regex::Error> for LogbookError {
  fn from(err: regex::Error) -> Self {
    LogbookError::message(format!("Invalid pattern: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for LogbookError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    LogbookError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<reqwest::Error> for LogbookError {
  fn from(err: reqwest::Error) -> Self {
    let status = err.status().map(|s| s.as_u16());
    LogbookError::Remote(RemoteError::Transport {
      status,
      message: err.to_string(),
    })
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Explicitly requested config file does not exist
  NotFound { path: PathBuf },

  /// Config file exists but could not be parsed
  Invalid { path: PathBuf, reason: String },

  /// A value in the config or on the command line is out of range
  InvalidValue { field: String, value: String },

  /// Package manifest could not be read or carries no version
  Manifest { path: PathBuf, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `logbook init` to create a configuration file.".to_string()),
      ConfigError::Invalid { .. } => Some("Fix the TOML syntax or remove the file to fall back to defaults.".to_string()),
      ConfigError::Manifest { .. } => {
        Some("Point `release.manifest` (or --manifest) at a Cargo.toml or package.json with a version.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Configuration file not found: {}", path.display())
      }
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::InvalidValue { field, value } => {
        write!(f, "Invalid value '{}' for {}", value, field)
      }
      ConfigError::Manifest { path, reason } => {
        write!(f, "Cannot use package manifest {}: {}", path.display(), reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Push failed
  PushFailed { remote: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") {
          Some("The remote has commits you don't have. Pull first, then push the release tag.".to_string())
        } else if reason.contains("permission denied") || reason.contains("403") {
          Some("Check your SSH key or token permissions for the remote.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run logbook inside a git repository or initialize one at: {}",
        path.display()
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::PushFailed { remote, reason } => {
        write!(f, "Push to {} failed: {}", remote, reason)
      }
    }
  }
}

/// Remote service errors (text polishers, release host)
#[derive(Debug)]
pub enum RemoteError {
  /// Network failure, timeout, or non-2xx status
  Transport { status: Option<u16>, message: String },

  /// A 2xx response whose payload did not have the expected shape
  MalformedResponse { service: String, reason: String },
}

impl RemoteError {
  fn help_message(&self) -> Option<String> {
    match self {
      RemoteError::Transport { status: Some(401), .. } | RemoteError::Transport { status: Some(403), .. } => {
        Some("Check that the API key or token is valid and has the required scopes.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for RemoteError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RemoteError::Transport {
        status: Some(code),
        message,
      } => write!(f, "Remote request failed (HTTP {}): {}", code, message),
      RemoteError::Transport { status: None, message } => write!(f, "Remote request failed: {}", message),
      RemoteError::MalformedResponse { service, reason } => {
        write!(f, "Unexpected response from {}: {}", service, reason)
      }
    }
  }
}

/// Result type alias for logbook
pub type LogbookResult<T> = Result<T, LogbookError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> LogbookResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> LogbookResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<LogbookError>,
{
  fn context(self, ctx: impl Into<String>) -> LogbookResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> LogbookResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &LogbookError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

impl From<anyhow::Error> for LogbookError {
  fn from(err: anyhow::Error) -> Self {
    LogbookError::message(err.to_string())
  }
}
