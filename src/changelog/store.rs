//! Backing-directory access for changelog documents
//!
//! The store is the only code that touches the changelog directory. It knows
//! two kinds of file:
//!
//! - `draft.md` - the open document for the current cycle
//! - `<major>.<minor>.<patch>.md` - one document per released (or pre-created) version
//!
//! Reads of optional files return `None` on any failure. Writes replace the
//! whole file through a temporary sibling and a rename.

use crate::core::error::{LogbookResult, ResultExt};
use regex::Regex;
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// File name of the open draft document
pub const DRAFT_FILE: &str = "draft.md";

static VERSION_FILE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+\.md$").expect("version file pattern is valid"));

/// Versions that have a `<semver>.md` document, highest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSet {
  versions: Vec<Version>,
}

impl VersionSet {
  pub fn new(mut versions: Vec<Version>) -> Self {
    versions.sort_by(|a, b| b.cmp(a));
    versions.dedup();
    Self { versions }
  }

  pub fn highest(&self) -> Option<&Version> {
    self.versions.first()
  }

}

/// Filesystem-backed document store rooted at the changelog directory
#[derive(Debug, Clone)]
pub struct ReleaseDocumentStore {
  dir: PathBuf,
}

impl ReleaseDocumentStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn draft_path(&self) -> PathBuf {
    self.dir.join(DRAFT_FILE)
  }

  pub fn version_path(&self, version: &Version) -> PathBuf {
    self.dir.join(format!("{}.{}.{}.md", version.major, version.minor, version.patch))
  }

  /// Create the backing directory if it does not exist
  pub fn ensure_directory(&self) -> LogbookResult<()> {
    fs::create_dir_all(&self.dir).with_context(|| format!("Failed to create {}", self.dir.display()))
  }

  /// Enumerate `<semver>.md` documents
  ///
  /// A missing directory is an empty set. Names matching the pattern but
  /// failing semver parsing (e.g. leading zeros) are skipped.
  pub fn list_version_documents(&self) -> LogbookResult<VersionSet> {
    let entries = match fs::read_dir(&self.dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(VersionSet::default()),
      Err(e) => return Err(e).with_context(|| format!("Failed to list {}", self.dir.display())),
    };

    let mut versions = Vec::new();
    for entry in entries {
      let entry = entry?;
      let name = entry.file_name();
      let Some(name) = name.to_str() else {
        continue;
      };
      if !VERSION_FILE.is_match(name) {
        continue;
      }
      let stem = name.trim_end_matches(".md");
      match Version::parse(stem) {
        Ok(version) => versions.push(version),
        Err(e) => debug!(file = name, error = %e, "skipping unparseable version document"),
      }
    }

    Ok(VersionSet::new(versions))
  }

  #[allow(dead_code)] // Used in tests
  pub fn draft_exists(&self) -> bool {
    self.draft_path().is_file()
  }

  /// Draft text, or `None` when there is no readable draft
  pub fn read_draft(&self) -> Option<String> {
    read_optional(&self.draft_path())
  }

  pub fn read_version_document(&self, version: &Version) -> Option<String> {
    read_optional(&self.version_path(version))
  }

  pub fn write_draft(&self, text: &str) -> LogbookResult<()> {
    self.ensure_directory()?;
    write_atomic(&self.draft_path(), text)
  }

  pub fn write_version_document(&self, version: &Version, text: &str) -> LogbookResult<()> {
    self.ensure_directory()?;
    write_atomic(&self.version_path(version), text)
  }

  /// Move `draft.md` to `<version>.md`, replacing any existing file there
  pub fn rename_draft_to_version(&self, version: &Version) -> LogbookResult<PathBuf> {
    let target = self.version_path(version);
    fs::rename(self.draft_path(), &target)
      .with_context(|| format!("Failed to rename draft to {}", target.display()))?;
    Ok(target)
  }

  /// Move one version document to another version's name
  pub fn rename_version_document(&self, from: &Version, to: &Version) -> LogbookResult<PathBuf> {
    let target = self.version_path(to);
    if from != to {
      fs::rename(self.version_path(from), &target)
        .with_context(|| format!("Failed to rename {}.md to {}", from, target.display()))?;
    }
    Ok(target)
  }
}

fn read_optional(path: &Path) -> Option<String> {
  match fs::read_to_string(path) {
    Ok(text) => Some(text),
    Err(e) => {
      if e.kind() != std::io::ErrorKind::NotFound {
        debug!(path = %path.display(), error = %e, "treating unreadable document as absent");
      }
      None
    }
  }
}

/// Whole-file replacement via a temporary sibling and rename
fn write_atomic(path: &Path, text: &str) -> LogbookResult<()> {
  let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("document");
  let tmp = path.with_file_name(format!(".{}.tmp", file_name));

  fs::write(&tmp, text).with_context(|| format!("Failed to write {}", tmp.display()))?;
  fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
  Ok(())
}
