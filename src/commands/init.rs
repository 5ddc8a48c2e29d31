//! `logbook init`

use crate::changelog::document::draft_template;
use crate::changelog::resolver::resolve_open_document;
use crate::changelog::store::ReleaseDocumentStore;
use crate::commands::{prompt_yes_no, today};
use crate::core::config::{DEFAULT_MANIFEST, FileConfig, Overrides, Settings};
use crate::core::error::LogbookResult;
use crate::release::version::{BumpType, next_version};
use std::path::{Path, PathBuf};

/// Scaffold configuration, changelog directory and draft
///
/// An existing config is only replaced after confirmation (or with `yes`);
/// an existing open document is never touched.
pub fn run_init(root: &Path, explicit_config: Option<&Path>, yes: bool) -> LogbookResult<()> {
  let config_path = match explicit_config {
    Some(path) if path.is_absolute() => path.to_path_buf(),
    Some(path) => root.join(path),
    None => FileConfig::find_config_path(root).unwrap_or_else(|| root.join("logbook.toml")),
  };

  let write_config = if config_path.exists() {
    yes || prompt_yes_no(&format!("⚠️  {} already exists. Overwrite?", config_path.display()))?
  } else {
    true
  };

  if write_config {
    FileConfig::scaffold(&detect_manifest(root)).save(&config_path)?;
    println!("✅ Wrote {}", config_path.display());
  } else {
    println!("   Keeping existing {}", config_path.display());
  }

  let settings = Settings::resolve(root, Some(&config_path), &Overrides::default())?;
  let store = ReleaseDocumentStore::new(&settings.changelog_dir);
  store.ensure_directory()?;
  println!("📁 Changelog directory: {}", store.dir().display());

  let open = resolve_open_document(&store)?;
  if open.exists() {
    println!("   Open document already exists: {}", open.path(&store).display());
  } else {
    let version = next_version(&store.list_version_documents()?, BumpType::Patch);
    store.write_draft(&draft_template(&version, &today()))?;
    println!("📝 Created {} (version {})", store.draft_path().display(), version);
  }

  println!();
  println!("Next steps:");
  println!("  logbook add                 # record recent commits");
  println!("  logbook release patch       # cut a release");

  Ok(())
}

/// `Cargo.toml`, else `package.json`, else the default
fn detect_manifest(root: &Path) -> PathBuf {
  ["Cargo.toml", "package.json"]
    .iter()
    .find(|name| root.join(name).is_file())
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST))
}
