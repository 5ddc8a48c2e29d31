//! Source-control collaborators
//!
//! The changelog and release workflows only see these traits; `SystemGit`
//! implements all of them on top of the system `git` binary.

pub mod system_git;

use crate::core::error::LogbookResult;

pub use system_git::SystemGit;

/// A commit as the changelog sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
  pub sha: String,
  pub message: String,
}

impl CommitInfo {
  pub fn new(sha: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      sha: sha.into(),
      message: message.into(),
    }
  }
}

/// Supplies commits for a time range, oldest first
///
/// Implementations must already drop administrative commits (see
/// [`is_administrative`]).
pub trait CommitSource {
  fn commits_since(&self, range: &str) -> LogbookResult<Vec<CommitInfo>>;
}

/// Creates release tags
pub trait TagPublisher {
  /// Create tag `v<version>`
  fn create_tag(&self, version: &str) -> LogbookResult<()>;
}

/// Records and publishes working-tree changes
pub trait ChangePublisher {
  /// Stage everything and commit; returns `false` when there was nothing to commit
  fn commit_all(&self, message: &str) -> LogbookResult<bool>;

  /// Push the current branch and its tags
  fn push(&self, remote: &str) -> LogbookResult<()>;
}

/// Merge and changelog-maintenance commits never become entries
pub fn is_administrative(message: &str) -> bool {
  let lower = message.to_lowercase();
  lower.contains("merge pull request")
    || lower.contains("merge branch")
    || lower.starts_with("merge ")
    || lower.contains("updated changelog")
}

/// Drop administrative commits, keeping order
pub fn filter_commits(commits: Vec<CommitInfo>) -> Vec<CommitInfo> {
  commits.into_iter().filter(|c| !is_administrative(&c.message)).collect()
}
