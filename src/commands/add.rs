//! `logbook add`

use crate::changelog::ingest::{CommitIngestionPipeline, MessageInput};
use crate::changelog::store::ReleaseDocumentStore;
use crate::commands::today;
use crate::core::config::{Overrides, Settings};
use crate::core::error::LogbookResult;
use crate::core::vcs::{CommitInfo, CommitSource, SystemGit};
use crate::polish::select_polisher;
use std::path::Path;
use tracing::debug;

/// Commit source for custom messages outside a git repository
struct NoHistory;

impl CommitSource for NoHistory {
  fn commits_since(&self, _range: &str) -> LogbookResult<Vec<CommitInfo>> {
    Ok(Vec::new())
  }
}

/// Add entries from commits since `overrides.since` (or config), or one custom message
pub fn run_add(
  root: &Path,
  explicit_config: Option<&Path>,
  message: Option<String>,
  overrides: &Overrides,
) -> LogbookResult<()> {
  let settings = Settings::resolve(root, explicit_config, overrides)?;
  debug!(root = %settings.root.display(), config = ?settings.config_path, "settings resolved");
  let store = ReleaseDocumentStore::new(&settings.changelog_dir);

  let git = match SystemGit::open(root) {
    Ok(git) => Some(git),
    Err(e) if message.is_some() => {
      debug!(error = %e, "no git repository; adding custom message only");
      None
    }
    Err(e) => return Err(e),
  };
  let source: &dyn CommitSource = match &git {
    Some(git) => git as &dyn CommitSource,
    None => &NoHistory,
  };

  let polisher = select_polisher(&settings.polish);
  let pipeline = CommitIngestionPipeline::new(&store, source, polisher.as_deref(), settings.emoji);

  let custom = message.is_some();
  let input = match message {
    Some(message) => MessageInput::Custom(message),
    None => MessageInput::Commits {
      since: settings.since.clone(),
    },
  };

  let report = pipeline.run(&input, &today())?;

  if report.is_empty() {
    if custom {
      println!("⚠️  Entry already exists in {}", report.path.display());
    } else if report.duplicates > 0 {
      println!(
        "✅ Changelog up to date ({} commit(s) already recorded in {})",
        report.duplicates,
        report.path.display()
      );
    } else {
      println!("ℹ️  No new commits since {}", settings.since);
    }
    return Ok(());
  }

  if report.created {
    println!("📝 Created {}", report.path.display());
  }
  println!("✅ Added {} entr{} to {}", report.added.len(), if report.added.len() == 1 { "y" } else { "ies" }, report.path.display());
  for entry in &report.added {
    println!("   {}", entry.rendered_text);
  }
  if report.duplicates > 0 {
    println!("   Skipped {} already recorded", report.duplicates);
  }

  Ok(())
}
