//! Release documents: the markdown files that make up the changelog
//!
//! A document is open while its `tag` is empty or absent and closed once a
//! tag is recorded. The templates here produce the exact layout every other
//! module expects:
//!
//! ```text
//! ---
//! version: 0.1.0
//! date: 2025-01-15
//! tag:
//! ---
//!
//! # Release 0.1.0
//!
//! ## **Unreleased**
//!
//! <!-- New entries will be added here -->
//! ```

use crate::changelog::frontmatter::{self, Frontmatter};
use crate::changelog::hash::{self, EntryHash};
use semver::Version;

/// Marker identifying the Unreleased section header line
pub const UNRELEASED_MARKER: &str = "**Unreleased**";

/// Full Unreleased section header as written by the templates
pub const UNRELEASED_HEADER: &str = "## **Unreleased**";

/// Prefix of the document title line
pub const TITLE_PREFIX: &str = "# Release";

const PLACEHOLDER_COMMENT: &str = "<!-- New entries will be added here -->";

/// A single changelog line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
  /// Original commit or custom message; the hash is derived from this
  pub raw_message: String,
  /// Bullet text actually stored (polished or fallback)
  pub rendered_text: String,
  pub hash: EntryHash,
}

impl Entry {
  pub fn new(raw_message: impl Into<String>, rendered_text: impl Into<String>) -> Self {
    let raw_message = raw_message.into();
    let hash = EntryHash::of(&raw_message);
    Self {
      raw_message,
      rendered_text: rendered_text.into(),
      hash,
    }
  }

  /// Entry whose rendered text is the unpolished `- <message>` bullet
  #[allow(dead_code)] // Used in tests
  pub fn fallback(raw_message: impl Into<String>) -> Self {
    let raw_message = raw_message.into();
    let rendered = fallback_bullet(&raw_message);
    Self::new(raw_message, rendered)
  }

  /// The line written into the document
  pub fn to_line(&self) -> String {
    format!("{} {}", self.rendered_text, self.hash.marker())
  }
}

/// `- <message>`, collapsed to a single line
pub fn fallback_bullet(raw_message: &str) -> String {
  let single_line = raw_message.split_whitespace().collect::<Vec<_>>().join(" ");
  format!("- {}", single_line)
}

/// Parsed view over a document's text
#[derive(Debug, Clone)]
pub struct ReleaseDocument {
  pub frontmatter: Frontmatter,
  pub body: String,
}

impl ReleaseDocument {
  pub fn parse(text: &str) -> Self {
    let (frontmatter, body) = frontmatter::decode(text);
    Self { frontmatter, body }
  }

  pub fn render(&self) -> String {
    frontmatter::encode(&self.frontmatter, &self.body)
  }

  /// Version from frontmatter; `None` for a draft without a valid one
  #[allow(dead_code)] // Used in tests
  pub fn version(&self) -> Option<Version> {
    self.frontmatter.get("version").and_then(|v| Version::parse(v).ok())
  }

  #[allow(dead_code)] // Used in tests
  pub fn date(&self) -> Option<&str> {
    self.frontmatter.get("date").filter(|d| !d.is_empty())
  }

  pub fn tag(&self) -> Option<&str> {
    self.frontmatter.get("tag").filter(|t| !t.is_empty())
  }

  /// A document with a non-empty tag has been released
  pub fn is_closed(&self) -> bool {
    self.tag().is_some()
  }

  /// Display heading, `Release <version>`
  pub fn title(&self) -> Option<String> {
    self.frontmatter.get("version").map(|v| format!("Release {}", v))
  }

  #[allow(dead_code)] // Used in tests
  pub fn entry_hashes(&self) -> Vec<EntryHash> {
    hash::extract_hashes(&self.body)
  }
}

/// Fresh open document for a new cycle
pub fn draft_template(version: &Version, date: &str) -> String {
  let mut fm = Frontmatter::new();
  fm.set("version", version.to_string());
  fm.set("date", date);
  fm.set("tag", "");

  let body = format!(
    "\n{} {}\n\n{}\n\n{}\n\n",
    TITLE_PREFIX, version, UNRELEASED_HEADER, PLACEHOLDER_COMMENT
  );
  frontmatter::encode(&fm, &body)
}

/// Stand-in for a release whose open document never existed on storage
pub fn minimal_release_document(version: &Version, date: &str) -> String {
  let mut fm = Frontmatter::new();
  fm.set("version", version.to_string());
  fm.set("date", date);
  fm.set("tag", format!("v{}", version));

  let body = format!("\n{} {}\n\n- Release {}\n", TITLE_PREFIX, version, version);
  frontmatter::encode(&fm, &body)
}

/// Freeze an open document as release `version`
///
/// Updates `version` and `date`, fills `tag` only when the key is already
/// present, retitles the document, and drops the Unreleased header line while
/// keeping the entries under it.
pub fn close_for_release(text: &str, version: &Version, date: &str) -> String {
  let mut doc = ReleaseDocument::parse(text);
  doc.frontmatter.set("version", version.to_string());
  doc.frontmatter.set("date", date);
  if doc.frontmatter.contains_key("tag") {
    doc.frontmatter.set("tag", format!("v{}", version));
  }

  let mut header_removed = false;
  let mut title_updated = false;
  let lines: Vec<String> = doc
    .body
    .split('\n')
    .filter_map(|line| {
      if !header_removed && line.trim_end_matches('\r') == UNRELEASED_HEADER {
        header_removed = true;
        return None;
      }
      if !title_updated && line.starts_with(TITLE_PREFIX) {
        title_updated = true;
        return Some(format!("{} {}", TITLE_PREFIX, version));
      }
      Some(line.to_string())
    })
    .collect();

  doc.body = lines.join("\n");
  doc.render()
}
