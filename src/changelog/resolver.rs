//! Which document accepts new entries
//!
//! Policy, first match wins:
//!
//! 1. An existing draft is open, whatever its frontmatter says.
//! 2. Otherwise the highest `<semver>.md` is open if its `tag` is empty or
//!    absent (a version file created by hand before tagging).
//! 3. Otherwise the draft path is open even though nothing exists there yet.

use crate::changelog::document::ReleaseDocument;
use crate::changelog::store::ReleaseDocumentStore;
use crate::core::error::LogbookResult;
use semver::Version;
use std::path::PathBuf;
use tracing::debug;

/// Where an open document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLocation {
  Draft,
  Version(Version),
}

/// The resolved open document and its current text, if it exists
#[derive(Debug, Clone)]
pub struct OpenDocument {
  pub location: DocumentLocation,
  pub text: Option<String>,
}

impl OpenDocument {
  pub fn exists(&self) -> bool {
    self.text.is_some()
  }

  pub fn path(&self, store: &ReleaseDocumentStore) -> PathBuf {
    match &self.location {
      DocumentLocation::Draft => store.draft_path(),
      DocumentLocation::Version(version) => store.version_path(version),
    }
  }

  /// Overwrite this document in place
  pub fn write(&self, store: &ReleaseDocumentStore, text: &str) -> LogbookResult<()> {
    match &self.location {
      DocumentLocation::Draft => store.write_draft(text),
      DocumentLocation::Version(version) => store.write_version_document(version, text),
    }
  }
}

/// Resolve the single open document
pub fn resolve_open_document(store: &ReleaseDocumentStore) -> LogbookResult<OpenDocument> {
  if let Some(text) = store.read_draft() {
    debug!("open document is the existing draft");
    return Ok(OpenDocument {
      location: DocumentLocation::Draft,
      text: Some(text),
    });
  }

  let versions = store.list_version_documents()?;
  if let Some(highest) = versions.highest()
    && let Some(text) = store.read_version_document(highest)
    && !ReleaseDocument::parse(&text).is_closed()
  {
    debug!(version = %highest, "open document is an untagged version file");
    return Ok(OpenDocument {
      location: DocumentLocation::Version(highest.clone()),
      text: Some(text),
    });
  }

  debug!("no open document on storage; resolving to a new draft");
  Ok(OpenDocument {
    location: DocumentLocation::Draft,
    text: None,
  })
}
