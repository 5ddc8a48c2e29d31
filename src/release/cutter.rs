//! Cutting a release
//!
//! ```text
//! Open(draft | untagged version file) -> Cutting -> Released(<version>.md) -> Open(new draft)
//! ```
//!
//! The released version comes from the package manifest, and a version
//! that already has a released document is refused before anything is
//! written. Manifest and document writes are fatal when they fail. The
//! auxiliary version files, commit, tag, push and the remote release are
//! best effort and only reported.

use crate::changelog::document::{ReleaseDocument, close_for_release, draft_template, minimal_release_document};
use crate::changelog::resolver::{DocumentLocation, OpenDocument, resolve_open_document};
use crate::changelog::store::ReleaseDocumentStore;
use crate::core::error::{ConfigError, LogbookError, LogbookResult};
use crate::core::vcs::{ChangePublisher, TagPublisher};
use crate::release::github::ReleaseHost;
use crate::release::manifest::{VersionManifest, stamp_version_files};
use crate::release::version::{BumpType, next_version};
use semver::Version;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Where the cut currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CutState {
  Open(DocumentLocation),
  Cutting { from: Version, to: Version },
  Released(PathBuf),
  Reopened { draft_version: Version },
}

impl fmt::Display for CutState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CutState::Open(DocumentLocation::Draft) => write!(f, "open (draft)"),
      CutState::Open(DocumentLocation::Version(v)) => write!(f, "open ({}.md)", v),
      CutState::Cutting { from, to } => write!(f, "cutting {} -> {}", from, to),
      CutState::Released(path) => write!(f, "released ({})", path.display()),
      CutState::Reopened { draft_version } => write!(f, "open (new draft {})", draft_version),
    }
  }
}

/// Result of one best-effort step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
  Done,
  Skipped,
  Failed(String),
}

impl StepStatus {
  fn from_result(step: &str, result: LogbookResult<()>) -> Self {
    match result {
      Ok(()) => StepStatus::Done,
      Err(e) => {
        warn!(step, error = %e, "release step failed; continuing");
        StepStatus::Failed(e.to_string())
      }
    }
  }
}

/// Inputs for one cut
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
  pub bump: BumpType,
  /// `YYYY-MM-DD` written into the released and the new draft documents
  pub today: String,
  /// Auxiliary files stamped with the new version
  pub version_files: Vec<PathBuf>,
  pub push: bool,
  pub remote: String,
}

#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
  pub previous_version: Version,
  pub version: Version,
  pub tag: String,
  /// The released `<version>.md`
  pub document: PathBuf,
  /// True when no open document existed and a minimal one was written
  pub fabricated: bool,
  pub stamped_files: Vec<PathBuf>,
  /// Auxiliary files that could not be stamped, with the reason
  pub unstamped_files: Vec<(PathBuf, String)>,
  pub commit: StepStatus,
  pub tag_status: StepStatus,
  pub push: StepStatus,
  pub host: StepStatus,
  /// Placeholder version of the new draft
  pub next_draft_version: Version,
  pub state: CutState,
}

pub struct ReleaseCutter<'a> {
  store: &'a ReleaseDocumentStore,
  manifest: &'a dyn VersionManifest,
  tags: Option<&'a dyn TagPublisher>,
  changes: Option<&'a dyn ChangePublisher>,
  host: Option<&'a dyn ReleaseHost>,
}

impl<'a> ReleaseCutter<'a> {
  pub fn new(store: &'a ReleaseDocumentStore, manifest: &'a dyn VersionManifest) -> Self {
    Self {
      store,
      manifest,
      tags: None,
      changes: None,
      host: None,
    }
  }

  pub fn with_tags(mut self, tags: &'a dyn TagPublisher) -> Self {
    self.tags = Some(tags);
    self
  }

  pub fn with_changes(mut self, changes: &'a dyn ChangePublisher) -> Self {
    self.changes = Some(changes);
    self
  }

  pub fn with_host(mut self, host: Option<&'a dyn ReleaseHost>) -> Self {
    self.host = host;
    self
  }

  pub fn release(&self, request: &ReleaseRequest) -> LogbookResult<ReleaseOutcome> {
    let open = resolve_open_document(self.store)?;
    let mut state = CutState::Open(open.location.clone());
    info!(state = %state, "starting release");

    // 1. version from the manifest
    let previous = self.manifest.current_version()?;
    let version = request.bump.apply(&previous);
    let tag = format!("v{}", version);
    state = self.advance(
      state,
      CutState::Cutting {
        from: previous.clone(),
        to: version.clone(),
      },
    );

    self.ensure_not_released(&version)?;

    // 2. manifest and auxiliary files
    self.manifest.set_version(&version)?;
    let stamp = stamp_version_files(&request.version_files, &previous, &version);

    // 3. close and rename the open document
    let (document, fabricated) = self.close_open_document(&open, &version, &request.today)?;
    state = self.advance(state, CutState::Released(document.clone()));

    // 4. record and publish
    let commit = match self.changes {
      Some(changes) => match changes.commit_all(&format!("Updated changelog for {}", tag)) {
        Ok(true) => StepStatus::Done,
        Ok(false) => StepStatus::Skipped,
        Err(e) => StepStatus::from_result("commit", Err(e)),
      },
      None => StepStatus::Skipped,
    };

    let tag_status = match self.tags {
      Some(tags) => StepStatus::from_result("tag", tags.create_tag(&version.to_string())),
      None => StepStatus::Skipped,
    };

    let push = match self.changes {
      Some(changes) if request.push => StepStatus::from_result("push", changes.push(&request.remote)),
      _ => StepStatus::Skipped,
    };

    let host = match self.host {
      Some(host) => {
        let (title, body) = self.release_notes(&version, &request.today);
        StepStatus::from_result("remote release", host.create_release(&tag, &title, &body))
      }
      None => {
        info!("no release host configured; skipping remote release");
        StepStatus::Skipped
      }
    };

    // 5. next cycle
    let next_draft_version = next_version(&self.store.list_version_documents()?, BumpType::Patch);
    self
      .store
      .write_draft(&draft_template(&next_draft_version, &request.today))?;
    state = self.advance(
      state,
      CutState::Reopened {
        draft_version: next_draft_version.clone(),
      },
    );

    Ok(ReleaseOutcome {
      previous_version: previous,
      version,
      tag,
      document,
      fabricated,
      stamped_files: stamp.changed,
      unstamped_files: stamp.failed,
      commit,
      tag_status,
      push,
      host,
      next_draft_version,
      state,
    })
  }

  /// A released document is frozen; cutting onto its version would replace it
  fn ensure_not_released(&self, version: &Version) -> LogbookResult<()> {
    let Some(existing) = self.store.read_version_document(version) else {
      return Ok(());
    };
    if !ReleaseDocument::parse(&existing).is_closed() {
      return Ok(());
    }
    Err(LogbookError::Config(ConfigError::InvalidValue {
      field: "release version".to_string(),
      value: format!(
        "{} ({} is already released; bump the manifest past it)",
        version,
        self.store.version_path(version).display()
      ),
    }))
  }

  fn advance(&self, from: CutState, to: CutState) -> CutState {
    info!(from = %from, to = %to, "release state");
    to
  }

  /// Close the open document as `<version>.md`
  ///
  /// Falls back to a minimal document when there is none or it cannot be
  /// moved into place.
  fn close_open_document(&self, open: &OpenDocument, version: &Version, today: &str) -> LogbookResult<(PathBuf, bool)> {
    if let Some(text) = &open.text {
      let closed = close_for_release(text, version, today);
      let moved = match &open.location {
        DocumentLocation::Draft => self
          .store
          .write_draft(&closed)
          .and_then(|_| self.store.rename_draft_to_version(version)),
        DocumentLocation::Version(existing) => self
          .store
          .write_version_document(existing, &closed)
          .and_then(|_| self.store.rename_version_document(existing, version)),
      };
      match moved {
        Ok(path) => return Ok((path, false)),
        Err(e) => warn!(error = %e, "could not move the open document; writing a minimal one"),
      }
    } else {
      info!(version = %version, "no open document; writing a minimal one");
    }

    self
      .store
      .write_version_document(version, &minimal_release_document(version, today))?;
    Ok((self.store.version_path(version), true))
  }

  /// Title and body (without frontmatter) of the released document
  fn release_notes(&self, version: &Version, today: &str) -> (String, String) {
    let text = self
      .store
      .read_version_document(version)
      .unwrap_or_else(|| minimal_release_document(version, today));
    let doc = ReleaseDocument::parse(&text);
    let title = doc.title().unwrap_or_else(|| format!("Release {}", version));
    (title, doc.body.trim().to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::changelog::document::Entry;
  use crate::changelog::merge::merge_entries;
  use crate::core::error::RemoteError;
  use std::cell::RefCell;
  use std::fs;
  use tempfile::TempDir;

  fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
  }

  struct FakeManifest {
    version: RefCell<Version>,
  }

  impl FakeManifest {
    fn at(version: &str) -> Self {
      Self {
        version: RefCell::new(v(version)),
      }
    }
  }

  impl VersionManifest for FakeManifest {
    fn current_version(&self) -> LogbookResult<Version> {
      Ok(self.version.borrow().clone())
    }

    fn set_version(&self, version: &Version) -> LogbookResult<()> {
      *self.version.borrow_mut() = version.clone();
      Ok(())
    }
  }

  #[derive(Default)]
  struct RecordingGit {
    calls: RefCell<Vec<String>>,
    fail_tag: bool,
    fail_push: bool,
  }

  impl TagPublisher for RecordingGit {
    fn create_tag(&self, version: &str) -> LogbookResult<()> {
      self.calls.borrow_mut().push(format!("tag {}", version));
      if self.fail_tag {
        return Err(LogbookError::message("tag exists"));
      }
      Ok(())
    }
  }

  impl ChangePublisher for RecordingGit {
    fn commit_all(&self, message: &str) -> LogbookResult<bool> {
      self.calls.borrow_mut().push(format!("commit {}", message));
      Ok(true)
    }

    fn push(&self, remote: &str) -> LogbookResult<()> {
      self.calls.borrow_mut().push(format!("push {}", remote));
      if self.fail_push {
        return Err(LogbookError::message("rejected"));
      }
      Ok(())
    }
  }

  #[derive(Default)]
  struct RecordingHost {
    releases: RefCell<Vec<(String, String, String)>>,
    fail: bool,
  }

  impl ReleaseHost for RecordingHost {
    fn create_release(&self, tag: &str, title: &str, body: &str) -> LogbookResult<()> {
      self
        .releases
        .borrow_mut()
        .push((tag.to_string(), title.to_string(), body.to_string()));
      if self.fail {
        return Err(LogbookError::Remote(RemoteError::Transport {
          status: Some(500),
          message: "down".to_string(),
        }));
      }
      Ok(())
    }
  }

  fn request(bump: BumpType) -> ReleaseRequest {
    ReleaseRequest {
      bump,
      today: "2025-06-01".to_string(),
      version_files: Vec::new(),
      push: true,
      remote: "origin".to_string(),
    }
  }

  fn setup() -> (TempDir, ReleaseDocumentStore) {
    let tmp = TempDir::new().unwrap();
    let store = ReleaseDocumentStore::new(tmp.path().join("changelog"));
    (tmp, store)
  }

  fn draft_with_entry(version: &str, message: &str) -> String {
    merge_entries(&draft_template(&v(version), "2025-01-01"), &[Entry::fallback(message)])
  }

  #[test]
  fn test_release_uses_manifest_version_and_renames_draft() {
    let (_tmp, store) = setup();
    store.write_draft(&draft_with_entry("0.2.0", "feat: thing")).unwrap();
    let manifest = FakeManifest::at("1.0.0");

    let outcome = ReleaseCutter::new(&store, &manifest).release(&request(BumpType::Minor)).unwrap();

    assert_eq!(outcome.version, v("1.1.0"));
    assert_eq!(outcome.document, store.version_path(&v("1.1.0")));
    assert!(!outcome.fabricated);
    assert_eq!(*manifest.version.borrow(), v("1.1.0"));

    let released = store.read_version_document(&v("1.1.0")).unwrap();
    let doc = ReleaseDocument::parse(&released);
    assert_eq!(doc.version(), Some(v("1.1.0")));
    assert_eq!(doc.tag(), Some("v1.1.0"));
    assert_eq!(doc.date(), Some("2025-06-01"));
    assert!(!released.contains("## **Unreleased**"));
    assert!(released.contains("- feat: thing"));

    assert_eq!(outcome.next_draft_version, v("1.1.1"));
    let draft = store.read_draft().unwrap();
    assert!(draft.contains("version: 1.1.1"));
    assert!(draft.contains("## **Unreleased**"));
    assert!(ReleaseDocument::parse(&draft).entry_hashes().is_empty());
    assert_eq!(
      outcome.state,
      CutState::Reopened {
        draft_version: v("1.1.1")
      }
    );
  }

  #[test]
  fn test_release_without_open_document_fabricates() {
    let (_tmp, store) = setup();
    let manifest = FakeManifest::at("0.3.0");

    let outcome = ReleaseCutter::new(&store, &manifest).release(&request(BumpType::Patch)).unwrap();

    assert!(outcome.fabricated);
    let released = store.read_version_document(&v("0.3.1")).unwrap();
    assert!(released.contains("# Release 0.3.1"));
    assert!(released.contains("- Release 0.3.1"));
    assert!(ReleaseDocument::parse(&released).is_closed());
    assert!(store.draft_exists());
  }

  #[test]
  fn test_release_of_untagged_version_document() {
    let (_tmp, store) = setup();
    let doc = "---\nversion: 2.0.0\ndate: 2025-01-01\ntag:\n---\n\n# Release 2.0.0\n\n## **Unreleased**\n- manual note\n";
    store.write_version_document(&v("2.0.0"), doc).unwrap();
    let manifest = FakeManifest::at("2.0.0");

    let outcome = ReleaseCutter::new(&store, &manifest).release(&request(BumpType::Major)).unwrap();

    assert_eq!(outcome.version, v("3.0.0"));
    assert!(store.read_version_document(&v("2.0.0")).is_none());
    let released = store.read_version_document(&v("3.0.0")).unwrap();
    assert!(released.contains("- manual note"));
    assert!(released.contains("# Release 3.0.0"));
    assert_eq!(outcome.next_draft_version, v("3.0.1"));
  }

  #[test]
  fn test_tag_key_not_invented() {
    let (_tmp, store) = setup();
    store
      .write_draft("---\nversion: 0.1.0\ndate: 2025-01-01\n---\n\n# Release 0.1.0\n\n## **Unreleased**\n- a\n")
      .unwrap();
    let manifest = FakeManifest::at("0.1.0");

    ReleaseCutter::new(&store, &manifest).release(&request(BumpType::Patch)).unwrap();

    let released = store.read_version_document(&v("0.1.1")).unwrap();
    assert!(!released.contains("tag:"));
    assert!(released.contains("version: 0.1.1"));
  }

  #[test]
  fn test_collaborators_called_in_order() {
    let (_tmp, store) = setup();
    store.write_draft(&draft_with_entry("0.1.0", "fix: x")).unwrap();
    let manifest = FakeManifest::at("0.1.0");
    let git = RecordingGit::default();
    let host = RecordingHost::default();

    let outcome = ReleaseCutter::new(&store, &manifest)
      .with_tags(&git)
      .with_changes(&git)
      .with_host(Some(&host))
      .release(&request(BumpType::Patch))
      .unwrap();

    assert_eq!(
      *git.calls.borrow(),
      vec!["commit Updated changelog for v0.1.1", "tag 0.1.1", "push origin"]
    );
    assert_eq!(outcome.commit, StepStatus::Done);
    assert_eq!(outcome.tag_status, StepStatus::Done);
    assert_eq!(outcome.push, StepStatus::Done);
    assert_eq!(outcome.host, StepStatus::Done);

    let releases = host.releases.borrow();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].0, "v0.1.1");
    assert_eq!(releases[0].1, "Release 0.1.1");
    assert!(releases[0].2.starts_with("# Release 0.1.1"));
    assert!(releases[0].2.contains("- fix: x"));
    assert!(!releases[0].2.contains("tag: v0.1.1"));
  }

  #[test]
  fn test_collaborator_failures_do_not_abort() {
    let (_tmp, store) = setup();
    store.write_draft(&draft_with_entry("0.1.0", "fix: y")).unwrap();
    let manifest = FakeManifest::at("1.2.3");
    let git = RecordingGit {
      fail_tag: true,
      fail_push: true,
      ..Default::default()
    };
    let host = RecordingHost {
      fail: true,
      ..Default::default()
    };

    let outcome = ReleaseCutter::new(&store, &manifest)
      .with_tags(&git)
      .with_changes(&git)
      .with_host(Some(&host))
      .release(&request(BumpType::Patch))
      .unwrap();

    assert!(matches!(outcome.tag_status, StepStatus::Failed(_)));
    assert!(matches!(outcome.push, StepStatus::Failed(_)));
    assert!(matches!(outcome.host, StepStatus::Failed(_)));
    assert!(store.read_version_document(&v("1.2.4")).is_some());
    assert!(store.read_draft().unwrap().contains("version: 1.2.5"));
  }

  #[test]
  fn test_unconfigured_steps_are_skipped() {
    let (_tmp, store) = setup();
    let manifest = FakeManifest::at("0.1.0");
    let git = RecordingGit::default();
    let mut req = request(BumpType::Minor);
    req.push = false;

    let outcome = ReleaseCutter::new(&store, &manifest)
      .with_tags(&git)
      .with_changes(&git)
      .with_host(None)
      .release(&req)
      .unwrap();

    assert_eq!(outcome.push, StepStatus::Skipped);
    assert_eq!(outcome.host, StepStatus::Skipped);
    assert!(!git.calls.borrow().iter().any(|c| c.starts_with("push")));
  }

  #[test]
  fn test_version_files_stamped() {
    let (tmp, store) = setup();
    let aux = tmp.path().join("VERSION");
    fs::write(&aux, "0.9.0\n").unwrap();
    let manifest = FakeManifest::at("0.9.0");
    let mut req = request(BumpType::Minor);
    req.version_files = vec![aux.clone(), tmp.path().join("missing.txt")];

    let outcome = ReleaseCutter::new(&store, &manifest).release(&req).unwrap();

    assert_eq!(outcome.stamped_files, vec![aux.clone()]);
    assert_eq!(fs::read_to_string(&aux).unwrap(), "0.10.0\n");
  }

  #[test]
  fn test_released_document_is_never_replaced() {
    let (_tmp, store) = setup();
    let shipped = "---\nversion: 1.1.0\ndate: 2024-12-01\ntag: v1.1.0\n---\n\n# Release 1.1.0\n\n- shipped history\n";
    store.write_version_document(&v("1.1.0"), shipped).unwrap();
    let draft = draft_with_entry("0.2.0", "feat: new");
    store.write_draft(&draft).unwrap();
    let manifest = FakeManifest::at("1.0.0");
    let git = RecordingGit::default();

    let result = ReleaseCutter::new(&store, &manifest)
      .with_tags(&git)
      .with_changes(&git)
      .release(&request(BumpType::Minor));

    assert!(matches!(result, Err(LogbookError::Config(ConfigError::InvalidValue { .. }))));
    assert_eq!(store.read_version_document(&v("1.1.0")).unwrap(), shipped);
    assert_eq!(store.read_draft().unwrap(), draft);
    assert_eq!(*manifest.version.borrow(), v("1.0.0"));
    assert!(git.calls.borrow().is_empty());
  }

  #[test]
  fn test_untagged_document_at_target_version_is_reused() {
    let (_tmp, store) = setup();
    store
      .write_version_document(&v("1.1.0"), "---\nversion: 1.1.0\ndate: 2025-01-01\ntag:\n---\n\n# Release 1.1.0\n\n## **Unreleased**\n- pending\n")
      .unwrap();
    let manifest = FakeManifest::at("1.0.0");

    let outcome = ReleaseCutter::new(&store, &manifest).release(&request(BumpType::Minor)).unwrap();

    assert!(!outcome.fabricated);
    let released = store.read_version_document(&v("1.1.0")).unwrap();
    assert!(released.contains("tag: v1.1.0"));
    assert!(released.contains("- pending"));
  }

  #[test]
  fn test_unwritable_version_file_does_not_abort() {
    let (tmp, store) = setup();
    store.write_draft(&draft_with_entry("0.1.0", "fix: z")).unwrap();
    let aux = tmp.path().join("aux");
    fs::create_dir(&aux).unwrap();
    let manifest = FakeManifest::at("0.1.0");
    let git = RecordingGit::default();
    let mut req = request(BumpType::Patch);
    req.version_files = vec![aux.clone()];

    let outcome = ReleaseCutter::new(&store, &manifest)
      .with_tags(&git)
      .with_changes(&git)
      .release(&req)
      .unwrap();

    assert!(outcome.stamped_files.is_empty());
    assert_eq!(outcome.unstamped_files.len(), 1);
    assert_eq!(outcome.unstamped_files[0].0, aux);
    assert!(store.read_version_document(&v("0.1.1")).unwrap().contains("- fix: z"));
    assert!(store.read_draft().unwrap().contains("version: 0.1.2"));
    assert_eq!(outcome.tag_status, StepStatus::Done);
  }

  #[test]
  fn test_unmovable_open_document_falls_back_to_minimal() {
    let (_tmp, store) = setup();
    let open = "---\nversion: 2.0.0\ndate: 2025-01-01\ntag:\n---\n\n# Release 2.0.0\n\n## **Unreleased**\n- stuck\n";
    store.write_version_document(&v("2.0.0"), open).unwrap();
    // The temporary file used to rewrite 2.0.0.md cannot be created
    fs::create_dir(store.dir().join(".2.0.0.md.tmp")).unwrap();
    let manifest = FakeManifest::at("2.0.0");

    let outcome = ReleaseCutter::new(&store, &manifest).release(&request(BumpType::Major)).unwrap();

    assert!(outcome.fabricated);
    assert_eq!(outcome.document, store.version_path(&v("3.0.0")));
    let released = store.read_version_document(&v("3.0.0")).unwrap();
    assert!(released.contains("- Release 3.0.0"));
    assert!(ReleaseDocument::parse(&released).is_closed());
    assert_eq!(store.read_version_document(&v("2.0.0")).unwrap(), open);
    assert!(store.read_draft().unwrap().contains("version: 3.0.1"));
  }
}
