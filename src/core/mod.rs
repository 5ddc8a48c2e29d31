//! Core plumbing for logbook
//!
//! - **config**: layered configuration (`logbook.toml`, environment, CLI) resolved to `Settings`
//! - **error**: error types with exit codes and contextual help messages
//! - **vcs**: git collaborators (commit source, tagging, commit/push) over system git

pub mod config;
pub mod error;
pub mod vcs;
