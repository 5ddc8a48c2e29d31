//! Release bookkeeping
//!
//! - **version**: bump types and the next-draft version computation
//! - **manifest**: package manifest and auxiliary version-stamped files
//! - **github**: remote release publishing
//! - **cutter**: the release state machine
//!
//! # Version sources
//!
//! The released version is the manifest version bumped by the requested
//! type. The new draft's placeholder version is the highest `<semver>.md` in
//! the changelog directory bumped by patch. The two are independent and can
//! drift apart if the manifest is edited by hand.

pub mod cutter;
pub mod github;
pub mod manifest;
pub mod version;
