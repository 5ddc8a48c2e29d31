//! Tests for the `init` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_creates_config_and_draft() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;

  run_logbook(&repo.path, &["init", "--yes"])?;

  assert!(repo.file_exists("logbook.toml"));
  let config = repo.read_file("logbook.toml")?;
  assert!(config.contains("[changelog]"));
  assert!(config.contains("manifest = \"Cargo.toml\""));

  let draft = repo.read_file("changelog/draft.md")?;
  assert!(draft.starts_with("---\nversion: 0.1.0\n"));
  assert!(draft.contains("tag:\n---\n"));
  assert!(draft.contains("# Release 0.1.0"));
  assert!(draft.contains("## **Unreleased**"));

  Ok(())
}

#[test]
fn test_init_never_clobbers_draft() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;
  run_logbook(&repo.path, &["init", "--yes"])?;

  repo.write_file("changelog/draft.md", "hand edited\n")?;
  run_logbook(&repo.path, &["init", "--yes"])?;

  assert_eq!(repo.read_file("changelog/draft.md")?, "hand edited\n");
  Ok(())
}

#[test]
fn test_init_respects_configured_directory() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;
  repo.write_file("logbook.toml", "[changelog]\ndir = \"docs/changes\"\n")?;

  // Existing config is kept when the prompt is declined (stdin is empty)
  let output = run_logbook(&repo.path, &["init"])?;
  assert!(stdout(&output).contains("Keeping existing"));

  assert!(repo.file_exists("docs/changes/draft.md"));
  assert!(!repo.file_exists("changelog"));
  Ok(())
}

#[test]
fn test_init_with_package_json() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;
  std::fs::remove_file(repo.path.join("Cargo.toml"))?;
  repo.write_file("package.json", "{\n  \"name\": \"demo\",\n  \"version\": \"0.1.0\"\n}\n")?;

  run_logbook(&repo.path, &["init", "--yes"])?;

  let config = repo.read_file("logbook.toml")?;
  assert!(config.contains("manifest = \"package.json\""));
  Ok(())
}
