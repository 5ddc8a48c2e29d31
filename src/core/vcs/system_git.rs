//! System git backend
//!
//! Runs the `git` binary with an isolated environment. Used as the commit
//! source for changelog ingestion and as the tag/commit/push collaborator
//! during a release.

use super::{ChangePublisher, CommitInfo, CommitSource, TagPublisher, filter_commits};
use crate::core::error::{GitError, LogbookError, LogbookResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Field and record separators for `git log --format`
const FIELD_SEP: char = '\x1f';
const RECORD_SEP: char = '\x1e';

/// Git backend using system git
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> LogbookResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(LogbookError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(LogbookError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// True when `git status --porcelain` reports anything
  pub fn has_uncommitted_changes(&self) -> LogbookResult<bool> {
    let output = self.run(&["status", "--porcelain"])?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
  }

  /// URL of a configured remote, if there is one
  pub fn remote_url(&self, remote: &str) -> Option<String> {
    let output = self.git_cmd().args(["remote", "get-url", remote]).output().ok()?;
    if !output.status.success() {
      return None;
    }
    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!url.is_empty()).then_some(url)
  }

  /// Run a git subcommand, turning a non-zero exit into `GitError::CommandFailed`
  fn run(&self, args: &[&str]) -> LogbookResult<Output> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
      return Err(LogbookError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }

    Ok(output)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("core.quotePath=false");
    cmd.arg("-c").arg("log.showSignature=false");

    cmd
  }
}

impl CommitSource for SystemGit {
  /// `range` is anything `git log --since` accepts; empty means all history
  fn commits_since(&self, range: &str) -> LogbookResult<Vec<CommitInfo>> {
    let since = format!("--since={}", range);
    let mut args = vec!["log", "--no-merges", "--reverse", "--format=%H%x1f%s%x1e"];
    if !range.trim().is_empty() {
      args.push(since.as_str());
    }

    let output = match self.run(&args) {
      Ok(output) => output,
      // A repository without commits has no history to read
      Err(LogbookError::Git(GitError::CommandFailed { stderr, .. }))
        if stderr.contains("does not have any commits") || stderr.contains("bad default revision") =>
      {
        return Ok(Vec::new());
      }
      Err(e) => return Err(e),
    };

    let commits = parse_log_output(&String::from_utf8_lossy(&output.stdout));
    Ok(filter_commits(commits))
  }
}

impl TagPublisher for SystemGit {
  fn create_tag(&self, version: &str) -> LogbookResult<()> {
    let tag = format!("v{}", version);
    self.run(&["tag", "-a", &tag, "-m", &format!("Release {}", version)])?;
    Ok(())
  }
}

impl ChangePublisher for SystemGit {
  fn commit_all(&self, message: &str) -> LogbookResult<bool> {
    self.run(&["add", "-A"])?;
    if !self.has_uncommitted_changes()? {
      return Ok(false);
    }
    self.run(&["commit", "-m", message])?;
    Ok(true)
  }

  fn push(&self, remote: &str) -> LogbookResult<()> {
    match self.run(&["push", remote, "HEAD", "--follow-tags"]) {
      Ok(_) => Ok(()),
      Err(LogbookError::Git(GitError::CommandFailed { stderr, .. })) => Err(LogbookError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        reason: stderr,
      })),
      Err(e) => Err(e),
    }
  }
}

/// Parse `%H<US>%s<RS>` records
fn parse_log_output(stdout: &str) -> Vec<CommitInfo> {
  stdout
    .split(RECORD_SEP)
    .filter_map(|record| {
      let record = record.trim_start_matches(['\n', '\r']);
      let (sha, subject) = record.split_once(FIELD_SEP)?;
      let subject = subject.trim();
      if sha.is_empty() || subject.is_empty() {
        return None;
      }
      Some(CommitInfo::new(sha.trim(), subject))
    })
    .collect()
}
