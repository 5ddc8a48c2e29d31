//! Key/value metadata block at the top of every changelog document
//!
//! ```text
//! ---
//! version: 1.2.0
//! date: 2025-01-15
//! tag: v1.2.0
//! ---
//! ```
//!
//! Decoding never fails: text without an opening `---` line (or without a
//! closing one) is all body, and lines that are not `key: value` are skipped.
//! Lines whose value is never changed are written back exactly as read, so
//! `tag: ` keeps its trailing space. A value set in code with no original
//! line is written in the canonical form, and an empty value becomes `tag:`.

/// Keys written first, in this order, when encoding
const KNOWN_KEYS: [&str; 3] = ["version", "date", "tag"];

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
  key: String,
  value: String,
  /// Line as decoded, without its `\n`; dropped once the value changes
  raw: Option<String>,
}

impl Field {
  fn render(&self) -> String {
    match &self.raw {
      Some(raw) => raw.clone(),
      None if self.value.is_empty() => format!("{}:", self.key),
      None => format!("{}: {}", self.key, self.value),
    }
  }
}

/// Ordered frontmatter mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
  entries: Vec<Field>,
}

impl Frontmatter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.field(key).map(|f| f.value.as_str())
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.field(key).is_some()
  }

  /// Insert or replace a value, keeping the key's original position
  ///
  /// Setting the value a key already has leaves its line untouched.
  pub fn set(&mut self, key: &str, value: impl Into<String>) {
    let value = value.into();
    match self.entries.iter_mut().find(|f| f.key == key) {
      Some(field) if field.value == value => {}
      Some(field) => {
        field.value = value;
        field.raw = None;
      }
      None => self.entries.push(Field {
        key: key.to_string(),
        value,
        raw: None,
      }),
    }
  }

  fn set_decoded(&mut self, key: &str, value: &str, raw: &str) {
    self.set(key, value);
    if let Some(field) = self.entries.iter_mut().find(|f| f.key == key) {
      field.raw = Some(raw.to_string());
    }
  }

  fn field(&self, key: &str) -> Option<&Field> {
    self.entries.iter().find(|f| f.key == key)
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Entries in encoding order: known keys first, then the rest as read
  fn ordered(&self) -> Vec<&Field> {
    let mut ordered: Vec<_> = KNOWN_KEYS.iter().filter_map(|key| self.field(key)).collect();
    ordered.extend(self.entries.iter().filter(|f| !KNOWN_KEYS.contains(&f.key.as_str())));
    ordered
  }
}

fn is_delimiter(line: &str) -> bool {
  line.trim_end_matches('\r') == DELIMITER
}

/// Split a document into its frontmatter and body
pub fn decode(text: &str) -> (Frontmatter, String) {
  let mut lines = text.split_inclusive('\n');

  let Some(first) = lines.next() else {
    return (Frontmatter::new(), String::new());
  };
  if !is_delimiter(first.trim_end_matches('\n')) {
    return (Frontmatter::new(), text.to_string());
  }

  let mut frontmatter = Frontmatter::new();
  let mut consumed = first.len();

  for line in lines {
    consumed += line.len();
    let content = line.trim_end_matches('\n');

    if is_delimiter(content) {
      return (frontmatter, text[consumed..].to_string());
    }

    if let Some((key, value)) = content.split_once(':') {
      let key = key.trim();
      if !key.is_empty() {
        frontmatter.set_decoded(key, value.trim(), content);
      }
    }
  }

  // Opening delimiter without a closing one
  (Frontmatter::new(), text.to_string())
}

/// Render frontmatter and body back into document text
///
/// An empty mapping produces the body unchanged.
pub fn encode(frontmatter: &Frontmatter, body: &str) -> String {
  if frontmatter.is_empty() {
    return body.to_string();
  }

  let mut output = String::from(DELIMITER);
  output.push('\n');
  for field in frontmatter.ordered() {
    output.push_str(&field.render());
    output.push('\n');
  }
  output.push_str(DELIMITER);
  output.push('\n');
  output.push_str(body);
  output
}
