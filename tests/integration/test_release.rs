//! Tests for the `release` command

use crate::helpers::*;
use anyhow::Result;

fn draft(version: &str, entries: &[&str]) -> String {
  let mut text = format!(
    "---\nversion: {0}\ndate: 2025-01-01\ntag:\n---\n\n# Release {0}\n\n## **Unreleased**\n",
    version
  );
  for entry in entries {
    text.push_str(&format!("- {}\n", entry));
  }
  text
}

#[test]
fn test_release_uses_manifest_version() -> Result<()> {
  let repo = TestRepo::new("1.0.0")?;
  repo.write_file("changelog/draft.md", &draft("0.2.0", &["Added exports"]))?;

  run_logbook(&repo.path, &["release", "minor", "--skip-check", "--no-push"])?;

  assert!(!repo.file_exists("changelog/0.2.0.md"));
  let released = repo.read_file("changelog/1.1.0.md")?;
  assert!(released.contains("version: 1.1.0"));
  assert!(released.contains("tag: v1.1.0"));
  assert!(released.contains("# Release 1.1.0"));
  assert!(released.contains("- Added exports"));
  assert!(!released.contains("**Unreleased**"));

  let next = repo.read_file("changelog/draft.md")?;
  assert!(next.contains("version: 1.1.1"));
  assert!(next.contains("## **Unreleased**"));

  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.1.0\""));
  Ok(())
}

#[test]
fn test_release_commits_and_tags() -> Result<()> {
  let repo = TestRepo::new("0.3.0")?;
  repo.write_file("changelog/draft.md", &draft("0.3.0", &["Faster startup"]))?;

  // No remote is configured, so the push step fails without aborting
  let output = run_logbook(&repo.path, &["release", "patch", "--skip-check"])?;
  let out = stdout(&output);
  assert!(out.contains("Released 0.3.1"));
  assert!(out.contains("failed"));

  assert_eq!(repo.last_commit_subject()?, "Updated changelog for v0.3.1");
  assert!(repo.tags()?.contains(&"v0.3.1".to_string()));
  Ok(())
}

#[test]
fn test_release_without_open_document() -> Result<()> {
  let repo = TestRepo::new("2.0.0")?;

  run_logbook(&repo.path, &["release", "major", "--skip-check", "--no-push"])?;

  let released = repo.read_file("changelog/3.0.0.md")?;
  assert!(released.contains("# Release 3.0.0"));
  assert!(released.contains("- Release 3.0.0"));
  assert!(repo.read_file("changelog/draft.md")?.contains("version: 3.0.1"));
  Ok(())
}

#[test]
fn test_release_ingests_pending_commits_with_yes() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;
  repo.commit("feat: pending work")?;

  run_logbook(&repo.path, &["release", "patch", "--yes", "--no-push"])?;

  let released = repo.read_file("changelog/0.1.1.md")?;
  assert!(released.contains("- feat: pending work <!-- hash:"));
  Ok(())
}

#[test]
fn test_release_declined_pending_prompt_continues() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;
  repo.commit("feat: left out")?;

  // stdin is closed, which reads as "no"
  let output = run_logbook(&repo.path, &["release", "patch", "--no-push"])?;
  assert!(stdout(&output).contains("Continuing without them"));

  let released = repo.read_file("changelog/0.1.1.md")?;
  assert!(!released.contains("feat: left out"));
  Ok(())
}

#[test]
fn test_release_stamps_version_files() -> Result<()> {
  let repo = TestRepo::new("0.9.0")?;
  repo.write_file("VERSION", "0.9.0\n")?;

  run_logbook(
    &repo.path,
    &["release", "minor", "--skip-check", "--no-push", "--version-file", "VERSION"],
  )?;

  assert_eq!(repo.read_file("VERSION")?, "0.10.0\n");
  Ok(())
}

#[test]
fn test_release_package_json_manifest() -> Result<()> {
  let repo = TestRepo::new("0.1.0")?;
  repo.write_file("package.json", "{\n  \"name\": \"demo\",\n  \"version\": \"4.1.0\"\n}\n")?;

  run_logbook(
    &repo.path,
    &["release", "patch", "--skip-check", "--no-push", "--manifest", "package.json"],
  )?;

  assert!(repo.read_file("package.json")?.contains("\"version\": \"4.1.1\""));
  assert!(repo.file_exists("changelog/4.1.1.md"));
  Ok(())
}

#[test]
fn test_invalid_bump_fails_before_changes() -> Result<()> {
  let repo = TestRepo::new("1.0.0")?;
  repo.write_file("changelog/draft.md", &draft("1.0.1", &[]))?;

  let output = run_logbook_raw(&repo.path, &["release", "huge"])?;

  assert!(!output.status.success());
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.0.0\""));
  assert!(repo.file_exists("changelog/draft.md"));
  Ok(())
}

#[test]
fn test_missing_manifest_fails_before_changes() -> Result<()> {
  let repo = TestRepo::new("1.0.0")?;
  repo.write_file("changelog/draft.md", &draft("1.0.1", &["Kept"]))?;

  let output = run_logbook_raw(&repo.path, &["release", "patch", "--skip-check", "--manifest", "missing/Cargo.toml"])?;

  assert!(!output.status.success());
  assert!(repo.read_file("changelog/draft.md")?.contains("- Kept"));
  assert!(!repo.file_exists("changelog/1.0.1.md"));
  Ok(())
}

#[test]
fn test_release_outside_git() -> Result<()> {
  let tmp = tempfile::TempDir::new()?;
  std::fs::write(
    tmp.path().join("Cargo.toml"),
    "[package]\nname = \"loose\"\nversion = \"0.5.0\"\nedition = \"2024\"\n",
  )?;
  std::fs::create_dir(tmp.path().join("changelog"))?;
  std::fs::write(tmp.path().join("changelog/draft.md"), draft("0.5.0", &["Works without git"]))?;

  let output = run_logbook(tmp.path(), &["release", "patch"])?;
  let out = stdout(&output);
  assert!(out.contains("Released 0.5.1"));
  assert!(out.contains("Commit:    skipped"));
  assert!(!out.contains("Next steps"));

  let released = std::fs::read_to_string(tmp.path().join("changelog/0.5.1.md"))?;
  assert!(released.contains("- Works without git"));
  assert!(std::fs::read_to_string(tmp.path().join("changelog/draft.md"))?.contains("version: 0.5.2"));
  Ok(())
}

#[test]
fn test_release_refuses_to_replace_released_document() -> Result<()> {
  let repo = TestRepo::new("1.0.0")?;
  let shipped = "---\nversion: 1.1.0\ndate: 2024-12-01\ntag: v1.1.0\n---\n\n# Release 1.1.0\n\n- Shipped history\n";
  repo.write_file("changelog/1.1.0.md", shipped)?;
  repo.write_file("changelog/draft.md", &draft("0.2.0", &["Newer work"]))?;

  let output = run_logbook_raw(&repo.path, &["release", "minor", "--skip-check", "--no-push"])?;

  assert!(!output.status.success());
  assert_eq!(repo.read_file("changelog/1.1.0.md")?, shipped);
  assert!(repo.read_file("changelog/draft.md")?.contains("- Newer work"));
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.0.0\""));
  assert!(repo.tags()?.is_empty());
  Ok(())
}
