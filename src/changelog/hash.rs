//! Content hashes used as the dedup ledger inside changelog documents
//!
//! Each rendered entry carries a trailing `<!-- hash:xxxxxxxx -->` marker.
//! Whether a message was already recorded is always decided by scanning the
//! document text itself; nothing is cached between invocations.

use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters kept from the SHA-256 digest
const HASH_LEN: usize = 8;

/// Truncated SHA-256 of a raw changelog message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryHash(String);

impl EntryHash {
  /// Hash a raw message
  pub fn of(message: &str) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    let result = hasher.finalize();
    let hex = format!("{:x}", result);
    Self(hex[..HASH_LEN].to_string())
  }

  /// Wrap an already-computed hash (e.g. one read back from a document)
  ///
  /// Returns `None` unless the value is exactly eight lowercase hex digits.
  #[allow(dead_code)] // Used by extract_hashes() and in tests
  pub fn parse(value: &str) -> Option<Self> {
    let valid = value.len() == HASH_LEN && value.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    valid.then(|| Self(value.to_string()))
  }

  /// The hex digits of the hash
  #[allow(dead_code)] // Used in tests
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// The machine-readable marker embedded at the end of an entry line
  pub fn marker(&self) -> String {
    format!("<!-- hash:{} -->", self.0)
  }
}

impl fmt::Display for EntryHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// True iff the marker for `hash` appears anywhere in the document
///
/// The whole text is searched, not only the Unreleased section.
pub fn contains_hash(document: &str, hash: &EntryHash) -> bool {
  document.contains(&hash.marker())
}

/// Every hash marker in the document, in order of appearance
#[allow(dead_code)] // Used by ReleaseDocument::entry_hashes() and in tests
pub fn extract_hashes(document: &str) -> Vec<EntryHash> {
  const PREFIX: &str = "<!-- hash:";
  let mut hashes = Vec::new();
  let mut rest = document;

  while let Some(start) = rest.find(PREFIX) {
    let after = &rest[start + PREFIX.len()..];
    if let Some(end) = after.find(" -->")
      && let Some(hash) = EntryHash::parse(&after[..end])
    {
      hashes.push(hash);
    }
    rest = after;
  }

  hashes
}
