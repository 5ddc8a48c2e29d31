//! Changelog state
//!
//! - **hash**: content hashes embedded in entry lines (the dedup ledger)
//! - **frontmatter**: the `---` key/value block heading each document
//! - **document**: document model, templates and the release-closing transform
//! - **store**: the changelog directory (`draft.md` and `<semver>.md` files)
//! - **resolver**: which single document is open for new entries
//! - **merge**: insertion of entries under the Unreleased header
//! - **ingest**: the `add` workflow tying the above together

pub mod document;
pub mod frontmatter;
pub mod hash;
pub mod ingest;
pub mod merge;
pub mod resolver;
pub mod store;
