//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Credentials that would let a run reach the network
const NETWORK_ENV: [&str; 6] = [
  "OPENAI_API_KEY",
  "ANTHROPIC_API_KEY",
  "GEMINI_API_KEY",
  "GITHUB_TOKEN",
  "GH_TOKEN",
  "RUST_LOG",
];

/// A temporary git repository with a Cargo manifest
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRepo {
  /// Repository with `Cargo.toml` at `version` and one initial commit
  pub fn new(version: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;
    git(&path, &["config", "tag.gpgsign", "false"])?;

    std::fs::write(
      path.join("Cargo.toml"),
      format!(
        "[package]\nname = \"demo\"\nversion = \"{}\"\nedition = \"2024\"\n\n[dependencies]\n",
        version
      ),
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial commit"])?;

    Ok(Self { _root: root, path })
  }

  /// Record an empty commit with `message`
  pub fn commit(&self, message: &str) -> Result<()> {
    git(&self.path, &["commit", "--allow-empty", "-m", message])?;
    Ok(())
  }

  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let full = self.path.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    std::fs::read_to_string(self.path.join(path)).with_context(|| format!("Failed to read {}", path))
  }

  /// Subject of the latest commit
  pub fn last_commit_subject(&self) -> Result<String> {
    let output = git(&self.path, &["log", "-1", "--format=%s"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "--list"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run logbook without failing on a non-zero exit
pub fn run_logbook_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_logbook"));
  cmd.current_dir(cwd).args(args);
  for key in NETWORK_ENV {
    cmd.env_remove(key);
  }
  cmd.output().context("Failed to run logbook")
}

/// Run logbook, failing unless it exits successfully
pub fn run_logbook(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_logbook_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "logbook command failed: logbook {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

/// Number of `<!-- hash:... -->` markers in a document
pub fn entry_count(document: &str) -> usize {
  document.matches("<!-- hash:").count()
}
