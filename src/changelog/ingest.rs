//! The `add` workflow
//!
//! Resolve the open document, gather messages (commits or one custom
//! message), drop the ones whose hash is already in the document, polish the
//! rest, merge them under the Unreleased header and write the document back.
//! Running it twice over the same commits adds nothing the second time.

use crate::changelog::document::{Entry, draft_template};
use crate::changelog::hash::{EntryHash, contains_hash};
use crate::changelog::merge::merge_entries;
use crate::changelog::resolver::resolve_open_document;
use crate::changelog::store::ReleaseDocumentStore;
use crate::core::error::{LogbookError, LogbookResult};
use crate::core::vcs::CommitSource;
use crate::polish::{MessagePolisher, polish_or_fallback};
use crate::release::version::{BumpType, next_version};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the messages come from
#[derive(Debug, Clone)]
pub enum MessageInput {
  /// Commits from the commit source in this range
  Commits { since: String },
  /// One message given by the user
  ///
  /// Surrounding whitespace is trimmed before hashing, so `" x "` and a
  /// commit subject `x` are the same entry.
  Custom(String),
}

/// What one `add` run did
#[derive(Debug, Clone)]
pub struct AddReport {
  /// Entries written, in document order
  pub added: Vec<Entry>,
  /// Messages skipped because their hash was already present
  pub duplicates: usize,
  /// The open document that was (or would have been) written
  pub path: PathBuf,
  /// True when the draft was materialized by this run
  pub created: bool,
}

impl AddReport {
  pub fn is_empty(&self) -> bool {
    self.added.is_empty()
  }
}

pub struct CommitIngestionPipeline<'a> {
  store: &'a ReleaseDocumentStore,
  commits: &'a dyn CommitSource,
  polisher: Option<&'a dyn MessagePolisher>,
  emoji: bool,
}

impl<'a> CommitIngestionPipeline<'a> {
  pub fn new(
    store: &'a ReleaseDocumentStore,
    commits: &'a dyn CommitSource,
    polisher: Option<&'a dyn MessagePolisher>,
    emoji: bool,
  ) -> Self {
    Self {
      store,
      commits,
      polisher,
      emoji,
    }
  }

  /// Run the workflow; `today` dates a newly created draft
  pub fn run(&self, input: &MessageInput, today: &str) -> LogbookResult<AddReport> {
    let open = resolve_open_document(self.store)?;
    let path = open.path(self.store);

    let messages = self.collect_messages(input)?;

    let (text, created) = match &open.text {
      Some(text) => (text.clone(), false),
      None => {
        let version = next_version(&self.store.list_version_documents()?, BumpType::Patch);
        debug!(version = %version, "materializing new draft");
        (draft_template(&version, today), true)
      }
    };

    let (fresh, duplicates) = dedup_messages(&text, messages);
    if fresh.is_empty() {
      info!(duplicates, path = %path.display(), "no new entries");
      return Ok(AddReport {
        added: Vec::new(),
        duplicates,
        path,
        created: false,
      });
    }

    let bullets = polish_or_fallback(self.polisher, &fresh, self.emoji);
    let entries: Vec<Entry> = fresh
      .into_iter()
      .zip(bullets)
      .map(|(raw, rendered)| Entry::new(raw, rendered))
      .collect();

    let merged = merge_entries(&text, &entries);
    open.write(self.store, &merged)?;
    info!(added = entries.len(), duplicates, path = %path.display(), "entries merged");

    Ok(AddReport {
      added: entries,
      duplicates,
      path,
      created,
    })
  }

  /// Messages from the commit source that the open document does not hold yet
  pub fn pending_messages(&self, since: &str) -> LogbookResult<Vec<String>> {
    let open = resolve_open_document(self.store)?;
    let messages = self.collect_messages(&MessageInput::Commits {
      since: since.to_string(),
    })?;
    let text = open.text.unwrap_or_default();
    Ok(dedup_messages(&text, messages).0)
  }

  fn collect_messages(&self, input: &MessageInput) -> LogbookResult<Vec<String>> {
    match input {
      MessageInput::Custom(message) => {
        let message = message.trim();
        if message.is_empty() {
          return Err(LogbookError::with_help(
            "Custom message is empty",
            "Pass a non-empty message with -m/--message",
          ));
        }
        Ok(vec![message.to_string()])
      }
      MessageInput::Commits { since } => {
        let commits = self.commits.commits_since(since)?;
        debug!(count = commits.len(), since = %since, "commits read");
        Ok(commits.into_iter().map(|c| c.message).collect())
      }
    }
  }
}

/// Split messages into ones not yet in `document` and a duplicate count
///
/// Duplicates within the same batch collapse to their first occurrence.
fn dedup_messages(document: &str, messages: Vec<String>) -> (Vec<String>, usize) {
  let mut seen: HashSet<EntryHash> = HashSet::new();
  let mut fresh = Vec::new();
  let mut duplicates = 0;

  for message in messages {
    let hash = EntryHash::of(&message);
    if contains_hash(document, &hash) || !seen.insert(hash.clone()) {
      debug!(hash = %hash, "skipping duplicate message");
      duplicates += 1;
      continue;
    }
    fresh.push(message);
  }

  (fresh, duplicates)
}
