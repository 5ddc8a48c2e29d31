//! Semantic version bumps

use crate::changelog::store::VersionSet;
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version bump type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
  Major,
  Minor,
  Patch,
}

impl BumpType {
  /// Apply the bump, dropping any pre-release or build metadata
  pub fn apply(&self, current: &Version) -> Version {
    let mut version = current.clone();
    version.pre = Prerelease::EMPTY;
    version.build = BuildMetadata::EMPTY;

    match self {
      BumpType::Major => {
        version.major += 1;
        version.minor = 0;
        version.patch = 0;
      }
      BumpType::Minor => {
        version.minor += 1;
        version.patch = 0;
      }
      BumpType::Patch => {
        version.patch += 1;
      }
    }

    version
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      BumpType::Major => "major",
      BumpType::Minor => "minor",
      BumpType::Patch => "patch",
    }
  }
}

impl fmt::Display for BumpType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for BumpType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "major" => Ok(BumpType::Major),
      "minor" => Ok(BumpType::Minor),
      "patch" => Ok(BumpType::Patch),
      _ => Err(format!("Unknown bump type '{}' (expected major, minor or patch)", s)),
    }
  }
}

/// Version for a fresh document, derived from the existing version documents
///
/// An empty set bootstraps at `0.1.0` whatever the bump type.
pub fn next_version(versions: &VersionSet, bump: BumpType) -> Version {
  match versions.highest() {
    Some(highest) => bump.apply(highest),
    None => Version::new(0, 1, 0),
  }
}
