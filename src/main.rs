mod changelog;
mod commands;
mod core;
mod polish;
mod release;

use clap::{ArgAction, Parser, Subcommand};
use core::config::{Overrides, ProviderChoice};
use core::error::{LogbookError, print_error};
use core::vcs::SystemGit;
use release::version::BumpType;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Versioned, hash-deduplicated changelogs from git history
#[derive(Parser)]
#[command(name = "logbook")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Config file to use instead of searching for logbook.toml
  #[arg(long, global = true, value_name = "PATH")]
  config: Option<PathBuf>,

  /// More log output (-v info, -vv debug); RUST_LOG takes precedence
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Create logbook.toml, the changelog directory and a draft
  Init {
    /// Overwrite an existing config without asking
    #[arg(short, long)]
    yes: bool,
  },

  /// Add changelog entries from recent commits or a custom message
  Add {
    /// Add this message instead of reading commits
    #[arg(short, long)]
    message: Option<String>,
    /// Commit range for git log --since (default from config: "1 day ago")
    #[arg(long)]
    since: Option<String>,
    /// Text polishing provider
    #[arg(long, value_enum)]
    provider: Option<ProviderChoice>,
    /// OpenAI API key (overrides OPENAI_API_KEY)
    #[arg(long, value_name = "KEY")]
    openai_key: Option<String>,
    /// Anthropic API key (overrides ANTHROPIC_API_KEY)
    #[arg(long, value_name = "KEY")]
    claude_key: Option<String>,
    /// Gemini API key (overrides GEMINI_API_KEY)
    #[arg(long, value_name = "KEY")]
    gemini_key: Option<String>,
    /// Ask the polisher for emoji-prefixed entries
    #[arg(long, conflicts_with = "no_emoji")]
    emoji: bool,
    /// Ask the polisher for plain entries
    #[arg(long)]
    no_emoji: bool,
    /// Changelog directory
    #[arg(long)]
    dir: Option<PathBuf>,
  },

  /// Bump the version, freeze the open document, tag and publish
  Release {
    /// Which part of the version to bump
    #[arg(value_enum)]
    bump: BumpType,
    /// Changelog directory
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Package manifest holding the version (Cargo.toml or package.json)
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Extra file whose version string is replaced (repeatable)
    #[arg(long = "version-file", value_name = "PATH")]
    version_files: Vec<PathBuf>,
    /// Skip the pending-commit check
    #[arg(long)]
    skip_check: bool,
    /// Answer yes to every prompt
    #[arg(short, long)]
    yes: bool,
    /// Do not push the release commit and tag
    #[arg(long)]
    no_push: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Log to stderr; stdout is reserved for command output
fn init_tracing(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("logbook={}", level)));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .try_init();
}

/// Repository root when inside git, else the current directory
fn project_root(cwd: &Path) -> PathBuf {
  SystemGit::open(cwd)
    .map(|git| git.work_tree().to_path_buf())
    .unwrap_or_else(|_| cwd.to_path_buf())
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let cwd = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(LogbookError::from(e).context("Failed to get current directory")),
  };
  let root = project_root(&cwd);
  let config = cli.config.map(|p| cwd.join(p));
  let config = config.as_deref();

  let result = match cli.command {
    Commands::Init { yes } => commands::run_init(&root, config, yes),
    Commands::Add {
      message,
      since,
      provider,
      openai_key,
      claude_key,
      gemini_key,
      emoji,
      no_emoji,
      dir,
    } => {
      let overrides = Overrides {
        dir: dir.map(|p| cwd.join(p)),
        since,
        emoji: emoji_override(emoji, no_emoji),
        provider,
        openai_key,
        claude_key,
        gemini_key,
        ..Default::default()
      };
      commands::run_add(&root, config, message, &overrides)
    }
    Commands::Release {
      bump,
      dir,
      manifest,
      version_files,
      skip_check,
      yes,
      no_push,
    } => {
      let overrides = Overrides {
        dir: dir.map(|p| cwd.join(p)),
        manifest: manifest.map(|p| cwd.join(p)),
        version_files: version_files.into_iter().map(|p| cwd.join(p)).collect(),
        check_pending: skip_check.then_some(false),
        push: no_push.then_some(false),
        ..Default::default()
      };
      commands::run_release(&root, config, bump, &overrides, yes)
    }
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn emoji_override(emoji: bool, no_emoji: bool) -> Option<bool> {
  match (emoji, no_emoji) {
    (true, _) => Some(true),
    (_, true) => Some(false),
    _ => None,
  }
}

fn handle_error(err: LogbookError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
