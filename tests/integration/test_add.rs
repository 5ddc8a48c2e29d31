//! Tests for the `add` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_add_records_commits_once() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;
  repo.commit("feat: add parser")?;
  repo.commit("fix: crash on empty input")?;

  run_logbook(&repo.path, &["add"])?;
  let first = repo.read_file("changelog/draft.md")?;
  assert!(first.contains("- feat: add parser <!-- hash:"));
  assert!(first.contains("- fix: crash on empty input <!-- hash:"));
  assert_eq!(entry_count(&first), 3);

  let output = run_logbook(&repo.path, &["add"])?;
  assert!(stdout(&output).contains("up to date"));
  assert_eq!(repo.read_file("changelog/draft.md")?, first);

  Ok(())
}

#[test]
fn test_add_skips_administrative_commits() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;
  repo.commit("Merge branch 'feature' into main")?;
  repo.commit("Updated changelog for v0.0.9")?;
  repo.commit("feat: real work")?;

  run_logbook(&repo.path, &["add"])?;
  let draft = repo.read_file("changelog/draft.md")?;

  assert!(draft.contains("feat: real work"));
  assert!(!draft.contains("Merge branch"));
  assert!(!draft.contains("Updated changelog"));
  Ok(())
}

#[test]
fn test_custom_message_duplicate_then_new() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;

  run_logbook(&repo.path, &["add", "-m", "Document the config file"])?;
  let before = repo.read_file("changelog/draft.md")?;
  assert_eq!(entry_count(&before), 1);

  let output = run_logbook(&repo.path, &["add", "-m", "Document the config file"])?;
  assert!(stdout(&output).contains("already exists"));
  assert_eq!(repo.read_file("changelog/draft.md")?, before);

  run_logbook(&repo.path, &["add", "--message", "Support package.json manifests"])?;
  let after = repo.read_file("changelog/draft.md")?;
  assert_eq!(entry_count(&after), 2);

  let header = after.find("## **Unreleased**").unwrap();
  let newer = after.find("- Support package.json manifests").unwrap();
  let older = after.find("- Document the config file").unwrap();
  assert!(header < newer && newer < older);
  Ok(())
}

#[test]
fn test_add_writes_into_untagged_version_file() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;
  repo.write_file(
    "changelog/0.4.0.md",
    "---\nversion: 0.4.0\ndate: 2025-01-01\ntag:\n---\n\n# Release 0.4.0\n\n## **Unreleased**\n",
  )?;

  run_logbook(&repo.path, &["add", "-m", "Prepared by hand"])?;

  assert!(!repo.file_exists("changelog/draft.md"));
  assert!(repo.read_file("changelog/0.4.0.md")?.contains("- Prepared by hand"));
  Ok(())
}

#[test]
fn test_add_honours_dir_override() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;

  run_logbook(&repo.path, &["add", "-m", "Elsewhere", "--dir", "notes"])?;

  assert!(repo.read_file("notes/draft.md")?.contains("- Elsewhere"));
  assert!(!repo.file_exists("changelog"));
  Ok(())
}

#[test]
fn test_add_custom_message_outside_git() -> Result<()> {
  let tmp = tempfile::TempDir::new()?;

  run_logbook(tmp.path(), &["add", "-m", "No repository needed"])?;

  let draft = std::fs::read_to_string(tmp.path().join("changelog/draft.md"))?;
  assert!(draft.contains("- No repository needed"));
  Ok(())
}

#[test]
fn test_explicit_missing_config_fails() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;

  let output = run_logbook_raw(&repo.path, &["add", "--config", "nope.toml", "-m", "x"])?;

  assert!(!output.status.success());
  assert!(!repo.file_exists("changelog"));
  Ok(())
}
