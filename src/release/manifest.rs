//! Package manifest and auxiliary version files
//!
//! The manifest is the source of truth for the released version. `Cargo.toml`
//! is edited through `toml_edit` so formatting and comments survive;
//! `package.json` is read with `serde_json` and patched textually so key order
//! and indentation are untouched.

use crate::core::error::{ConfigError, LogbookError, LogbookResult, ResultExt};
use regex::Regex;
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Reads and writes the project version
pub trait VersionManifest {
  fn current_version(&self) -> LogbookResult<Version>;
  fn set_version(&self, version: &Version) -> LogbookResult<()>;
}

/// Manifest format, chosen from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
  Cargo,
  PackageJson,
}

impl ManifestKind {
  pub fn detect(path: &Path) -> LogbookResult<Self> {
    match path.file_name().and_then(|n| n.to_str()) {
      Some("Cargo.toml") => Ok(ManifestKind::Cargo),
      Some("package.json") => Ok(ManifestKind::PackageJson),
      _ => Err(manifest_error(path, "unsupported manifest (expected Cargo.toml or package.json)")),
    }
  }
}

/// A manifest on disk
#[derive(Debug, Clone)]
pub struct ManifestFile {
  path: PathBuf,
  kind: ManifestKind,
}

impl ManifestFile {
  pub fn new(path: impl Into<PathBuf>) -> LogbookResult<Self> {
    let path = path.into();
    let kind = ManifestKind::detect(&path)?;
    Ok(Self { path, kind })
  }

  fn read(&self) -> LogbookResult<String> {
    if !self.path.is_file() {
      return Err(manifest_error(&self.path, "file not found"));
    }
    fs::read_to_string(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))
  }

  fn write(&self, content: &str) -> LogbookResult<()> {
    fs::write(&self.path, content).with_context(|| format!("Failed to write {}", self.path.display()))
  }
}

impl VersionManifest for ManifestFile {
  fn current_version(&self) -> LogbookResult<Version> {
    let content = self.read()?;
    let raw = match self.kind {
      ManifestKind::Cargo => cargo_version(&content).map_err(|reason| manifest_error(&self.path, &reason))?,
      ManifestKind::PackageJson => {
        package_json_version(&content).map_err(|reason| manifest_error(&self.path, &reason))?
      }
    };
    Version::parse(&raw).map_err(|e| manifest_error(&self.path, &format!("invalid version '{}': {}", raw, e)))
  }

  fn set_version(&self, version: &Version) -> LogbookResult<()> {
    let content = self.read()?;
    let updated = match self.kind {
      ManifestKind::Cargo => set_cargo_version(&content, version),
      ManifestKind::PackageJson => set_package_json_version(&content, version),
    }
    .map_err(|reason| manifest_error(&self.path, &reason))?;

    self.write(&updated)?;
    debug!(path = %self.path.display(), version = %version, "manifest updated");
    Ok(())
  }
}

fn manifest_error(path: &Path, reason: &str) -> LogbookError {
  LogbookError::Config(ConfigError::Manifest {
    path: path.to_path_buf(),
    reason: reason.to_string(),
  })
}

/// `package.version`, else `workspace.package.version`
fn cargo_version(content: &str) -> Result<String, String> {
  let doc: toml_edit::DocumentMut = content.parse().map_err(|e| format!("invalid TOML: {}", e))?;

  let direct = doc.get("package").and_then(|p| p.get("version")).and_then(|v| v.as_str());
  let inherited = doc
    .get("workspace")
    .and_then(|w| w.get("package"))
    .and_then(|p| p.get("version"))
    .and_then(|v| v.as_str());

  direct
    .or(inherited)
    .map(str::to_string)
    .ok_or_else(|| "no package.version or workspace.package.version".to_string())
}

fn set_cargo_version(content: &str, version: &Version) -> Result<String, String> {
  let mut doc: toml_edit::DocumentMut = content.parse().map_err(|e| format!("invalid TOML: {}", e))?;
  let value = version.to_string();

  let has_direct = doc
    .get("package")
    .and_then(|p| p.get("version"))
    .is_some_and(|v| v.is_str());
  let has_inherited = doc
    .get("workspace")
    .and_then(|w| w.get("package"))
    .and_then(|p| p.get("version"))
    .is_some_and(|v| v.is_str());

  if has_direct {
    doc["package"]["version"] = toml_edit::value(value);
  } else if has_inherited {
    doc["workspace"]["package"]["version"] = toml_edit::value(value);
  } else {
    return Err("no package.version or workspace.package.version".to_string());
  }

  Ok(doc.to_string())
}

fn package_json_version(content: &str) -> Result<String, String> {
  let json: serde_json::Value = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;
  json
    .get("version")
    .and_then(|v| v.as_str())
    .map(str::to_string)
    .ok_or_else(|| "no \"version\" field".to_string())
}

static JSON_VERSION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#""version"(\s*):(\s*)"[^"]*""#).expect("json version pattern is valid"));

/// Replace the first `"version": "..."` value in place
fn set_package_json_version(content: &str, version: &Version) -> Result<String, String> {
  package_json_version(content)?;
  if !JSON_VERSION.is_match(content) {
    return Err("no \"version\" field".to_string());
  }
  let replacement = format!(r#""version"${{1}}:${{2}}"{}""#, version);
  Ok(JSON_VERSION.replace(content, replacement.as_str()).into_owned())
}

/// Outcome of stamping the auxiliary version files
#[derive(Debug, Clone, Default)]
pub struct StampReport {
  /// Files rewritten with the new version
  pub changed: Vec<PathBuf>,
  /// Files that could not be read or written, with the reason
  pub failed: Vec<(PathBuf, String)>,
}

/// Replace every occurrence of `old` with `new` in each auxiliary file
///
/// Missing files and files without the old version are skipped with a
/// warning. A file that cannot be read or written is recorded in
/// `failed` and the rest are still stamped.
pub fn stamp_version_files(files: &[PathBuf], old: &Version, new: &Version) -> StampReport {
  let old = old.to_string();
  let new = new.to_string();
  let mut report = StampReport::default();

  for file in files {
    let content = match fs::read_to_string(file) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        warn!(path = %file.display(), "version file not found; skipping");
        continue;
      }
      Err(e) => {
        warn!(path = %file.display(), error = %e, "could not read version file");
        report.failed.push((file.clone(), e.to_string()));
        continue;
      }
    };

    if !content.contains(&old) {
      warn!(path = %file.display(), version = %old, "version file does not mention the current version");
      continue;
    }

    match fs::write(file, content.replace(&old, &new)) {
      Ok(()) => report.changed.push(file.clone()),
      Err(e) => {
        warn!(path = %file.display(), error = %e, "could not write version file");
        report.failed.push((file.clone(), e.to_string()));
      }
    }
  }

  report
}
