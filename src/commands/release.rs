//! `logbook release`

use crate::changelog::ingest::{CommitIngestionPipeline, MessageInput};
use crate::changelog::store::ReleaseDocumentStore;
use crate::commands::{prompt_yes_no, today};
use crate::core::config::{Overrides, Settings};
use crate::core::error::LogbookResult;
use crate::core::vcs::SystemGit;
use crate::polish::select_polisher;
use crate::release::cutter::{ReleaseCutter, ReleaseOutcome, ReleaseRequest, StepStatus};
use crate::release::github::{GitHubReleases, ReleaseHost};
use crate::release::manifest::{ManifestFile, VersionManifest};
use crate::release::version::BumpType;
use std::path::Path;
use tracing::{debug, warn};

/// Cut a release of type `bump`
pub fn run_release(
  root: &Path,
  explicit_config: Option<&Path>,
  bump: BumpType,
  overrides: &Overrides,
  yes: bool,
) -> LogbookResult<()> {
  let settings = Settings::resolve(root, explicit_config, overrides)?;
  debug!(root = %settings.root.display(), config = ?settings.config_path, "settings resolved");
  let git = match SystemGit::open(root) {
    Ok(git) => Some(git),
    Err(e) => {
      debug!(error = %e, "no git repository; skipping commit, tag and push");
      None
    }
  };
  let store = ReleaseDocumentStore::new(&settings.changelog_dir);

  // Validate the manifest before anything is written
  let manifest = ManifestFile::new(&settings.release.manifest)?;
  let current = manifest.current_version()?;
  println!("📦 Releasing {} ({} bump from {})", bump.apply(&current), bump, current);

  if let Some(git) = &git
    && settings.release.check_pending
  {
    ingest_pending(&settings, &store, git, yes)?;
  }

  let remote_url = git.as_ref().and_then(|git| git.remote_url(&settings.release.remote));
  let github = GitHubReleases::from_settings(&settings.github, remote_url.as_deref());
  let host = github.as_ref().map(|h| h as &dyn ReleaseHost);

  let request = ReleaseRequest {
    bump,
    today: today(),
    version_files: settings.release.version_files.clone(),
    push: settings.release.push,
    remote: settings.release.remote.clone(),
  };

  let mut cutter = ReleaseCutter::new(&store, &manifest).with_host(host);
  if let Some(git) = &git {
    cutter = cutter.with_tags(git).with_changes(git);
  }
  let outcome = cutter.release(&request)?;

  print_outcome(&outcome, &settings.release.remote);
  Ok(())
}

/// Offer to record commits the open document does not have yet
fn ingest_pending(settings: &Settings, store: &ReleaseDocumentStore, git: &SystemGit, yes: bool) -> LogbookResult<()> {
  let polisher = select_polisher(&settings.polish);
  let pipeline = CommitIngestionPipeline::new(store, git, polisher.as_deref(), settings.emoji);

  let pending = match pipeline.pending_messages(&settings.since) {
    Ok(pending) => pending,
    Err(e) => {
      warn!(error = %e, "could not check for pending commits");
      return Ok(());
    }
  };
  if pending.is_empty() {
    return Ok(());
  }

  println!();
  println!("⚠️  {} commit(s) since {} are not in the changelog:", pending.len(), settings.since);
  for message in &pending {
    println!("   - {}", message);
  }

  if yes || prompt_yes_no("Add them before releasing?")? {
    let report = pipeline.run(
      &MessageInput::Commits {
        since: settings.since.clone(),
      },
      &today(),
    )?;
    println!("✅ Added {} entries to {}", report.added.len(), report.path.display());
  } else {
    println!("   Continuing without them");
  }
  println!();

  Ok(())
}

fn print_outcome(outcome: &ReleaseOutcome, remote: &str) {
  println!("✅ Released {}", outcome.version);
  println!("   Manifest:  {} -> {}", outcome.previous_version, outcome.version);
  for file in &outcome.stamped_files {
    println!("   Stamped:   {}", file.display());
  }
  for (file, reason) in &outcome.unstamped_files {
    println!("   ⚠️  Not stamped: {} ({})", file.display(), reason);
  }
  if outcome.fabricated {
    println!("   Document:  {} (no open document; wrote a minimal one)", outcome.document.display());
  } else {
    println!("   Document:  {}", outcome.document.display());
  }
  println!("   Commit:    {}", describe(&outcome.commit));
  println!("   Tag:       {} {}", outcome.tag, describe(&outcome.tag_status));
  println!("   Push:      {} {}", remote, describe(&outcome.push));
  println!("   Release:   {}", describe(&outcome.host));
  println!("   State:     {}", outcome.state);
  println!();
  println!("📝 New draft opened at version {}", outcome.next_draft_version);

  if outcome.tag_status == StepStatus::Done && outcome.push != StepStatus::Done {
    println!();
    println!("Next steps:");
    println!("  git push {} HEAD --follow-tags", remote);
  }
}

fn describe(status: &StepStatus) -> String {
  match status {
    StepStatus::Done => "done".to_string(),
    StepStatus::Skipped => "skipped".to_string(),
    StepStatus::Failed(reason) => format!("failed ({})", reason),
  }
}
