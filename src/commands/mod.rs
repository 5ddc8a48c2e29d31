//! CLI commands for logbook
//!
//! - **init**: scaffold `logbook.toml`, the changelog directory and a draft
//! - **add**: add entries from recent commits or one custom message
//! - **release**: bump the version, freeze the open document, tag and publish

pub mod add;
pub mod init;
pub mod release;

pub use add::run_add;
pub use init::run_init;
pub use release::run_release;

use crate::core::error::LogbookResult;
use std::io::{self, Write};

/// Ask a yes/no question; anything but `y`/`yes` is a no
pub(crate) fn prompt_yes_no(message: &str) -> LogbookResult<bool> {
  print!("{} [y/N]: ", message);
  io::stdout().flush()?;

  let mut input = String::new();
  io::stdin().read_line(&mut input)?;

  Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Local calendar date, `YYYY-MM-DD`
pub(crate) fn today() -> String {
  chrono::Local::now().format("%Y-%m-%d").to_string()
}
