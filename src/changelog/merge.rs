//! Insertion of new entries into a document's Unreleased section
//!
//! New lines go directly under the `**Unreleased**` header, ahead of older
//! entries, so the newest batch reads first. Nothing outside the insertion
//! point is moved or dropped. Inserted lines use the document's own line
//! ending.

use crate::changelog::document::{Entry, TITLE_PREFIX, UNRELEASED_HEADER, UNRELEASED_MARKER};

/// Merge `entries` into `document`, returning the new text
pub fn merge_entries(document: &str, entries: &[Entry]) -> String {
  if entries.is_empty() {
    return document.to_string();
  }

  let crlf = document.contains("\r\n");
  let eol = if crlf { "\r\n" } else { "\n" };
  // Lines are split on `\n`, so under CRLF each kept line still ends in `\r`
  let terminated = |line: String| if crlf { line + "\r" } else { line };

  let rendered: Vec<String> = entries.iter().map(Entry::to_line).collect();
  let mut lines: Vec<String> = document.split('\n').map(str::to_string).collect();

  if let Some(header) = lines.iter().position(|line| line.contains(UNRELEASED_MARKER)) {
    insert_lines(&mut lines, header + 1, rendered.into_iter().map(terminated).collect());
    return lines.join("\n");
  }

  if let Some(title) = lines.iter().position(|line| line.starts_with(TITLE_PREFIX)) {
    let mut section = vec![String::new(), UNRELEASED_HEADER.to_string(), String::new()];
    section.extend(rendered);
    insert_lines(&mut lines, title + 1, section.into_iter().map(terminated).collect());
    return lines.join("\n");
  }

  let mut output = document.to_string();
  if !output.is_empty() && !output.ends_with('\n') {
    output.push_str(eol);
  }
  if !output.is_empty() {
    output.push_str(eol);
  }
  output.push_str(UNRELEASED_HEADER);
  output.push_str(eol);
  output.push_str(eol);
  for line in rendered {
    output.push_str(&line);
    output.push_str(eol);
  }
  output
}

fn insert_lines(lines: &mut Vec<String>, at: usize, new: Vec<String>) {
  let tail = lines.split_off(at);
  lines.extend(new);
  lines.extend(tail);
}
