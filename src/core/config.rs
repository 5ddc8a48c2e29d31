//! Layered configuration
//!
//! Settings are resolved once, before any workflow runs, in this order:
//!
//! 1. built-in defaults
//! 2. `logbook.toml` (searched: `logbook.toml`, `.logbook.toml`, `.config/logbook.toml`)
//! 3. credentials from the environment
//! 4. command-line overrides
//!
//! The result is an immutable [`Settings`]. Missing credentials leave the
//! matching feature disabled rather than failing.

use crate::core::error::{ConfigError, LogbookError, LogbookResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file names searched under the project root, in order
const CONFIG_CANDIDATES: [&str; 3] = ["logbook.toml", ".logbook.toml", ".config/logbook.toml"];

pub const DEFAULT_CHANGELOG_DIR: &str = "changelog";
pub const DEFAULT_SINCE: &str = "1 day ago";
pub const DEFAULT_MANIFEST: &str = "Cargo.toml";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which text-polishing provider to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderChoice {
  /// First provider with a credential (openai, claude, gemini)
  #[default]
  Auto,
  Openai,
  Claude,
  Gemini,
  /// Never polish; store raw messages
  None,
}

/// On-disk configuration; every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
  #[serde(default)]
  pub changelog: ChangelogSection,
  #[serde(default)]
  pub polish: PolishSection,
  #[serde(default)]
  pub release: ReleaseSection,
  #[serde(default)]
  pub github: GithubSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangelogSection {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dir: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub since: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub emoji: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolishSection {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider: Option<ProviderChoice>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_secs: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub openai_key: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub claude_key: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gemini_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseSection {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub manifest: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version_files: Option<Vec<PathBuf>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub check_pending: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub push: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub remote: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubSection {
  /// `owner/name`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repo: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub api_url: Option<String>,
}

impl FileConfig {
  /// Find config file in search order
  pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES.iter().map(|name| root.join(name)).find(|p| p.is_file())
  }

  /// Load the explicit file (which must exist) or the first one found
  ///
  /// Returns the path actually read, if any.
  pub fn load(root: &Path, explicit: Option<&Path>) -> LogbookResult<(Option<PathBuf>, Self)> {
    let path = match explicit {
      Some(path) => {
        let path = absolutize(root, path);
        if !path.is_file() {
          return Err(LogbookError::Config(ConfigError::NotFound { path }));
        }
        path
      }
      None => match Self::find_config_path(root) {
        Some(path) => path,
        None => return Ok((None, Self::default())),
      },
    };

    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config = Self::parse(&content).map_err(|reason| {
      LogbookError::Config(ConfigError::Invalid {
        path: path.clone(),
        reason,
      })
    })?;

    Ok((Some(path), config))
  }

  pub fn parse(content: &str) -> Result<Self, String> {
    toml_edit::de::from_str(content).map_err(|e| e.to_string().trim().to_string())
  }

  /// Starter configuration written by `logbook init`
  pub fn scaffold(manifest: &Path) -> Self {
    Self {
      changelog: ChangelogSection {
        dir: Some(PathBuf::from(DEFAULT_CHANGELOG_DIR)),
        since: Some(DEFAULT_SINCE.to_string()),
        emoji: Some(false),
      },
      polish: PolishSection {
        provider: Some(ProviderChoice::Auto),
        timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        ..Default::default()
      },
      release: ReleaseSection {
        manifest: Some(manifest.to_path_buf()),
        version_files: Some(Vec::new()),
        check_pending: Some(true),
        push: Some(true),
        remote: Some(DEFAULT_REMOTE.to_string()),
      },
      github: GithubSection::default(),
    }
  }

  pub fn save(&self, path: &Path) -> LogbookResult<()> {
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(path, content).with_context(|| format!("Failed to write config to {}", path.display()))?;
    Ok(())
  }
}

/// Values given on the command line; `None` leaves the lower layers alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub dir: Option<PathBuf>,
  pub since: Option<String>,
  pub emoji: Option<bool>,
  pub provider: Option<ProviderChoice>,
  pub openai_key: Option<String>,
  pub claude_key: Option<String>,
  pub gemini_key: Option<String>,
  pub manifest: Option<PathBuf>,
  /// Non-empty replaces the configured list
  pub version_files: Vec<PathBuf>,
  pub check_pending: Option<bool>,
  pub push: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PolishSettings {
  pub provider: ProviderChoice,
  pub model: Option<String>,
  pub timeout: Duration,
  pub openai_key: Option<String>,
  pub claude_key: Option<String>,
  pub gemini_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReleaseSettings {
  pub manifest: PathBuf,
  pub version_files: Vec<PathBuf>,
  pub check_pending: bool,
  pub push: bool,
  pub remote: String,
}

#[derive(Debug, Clone)]
pub struct GithubSettings {
  pub token: Option<String>,
  pub repo: Option<String>,
  pub api_url: String,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Settings {
  pub root: PathBuf,
  /// Config file that contributed, if any
  pub config_path: Option<PathBuf>,
  pub changelog_dir: PathBuf,
  pub since: String,
  pub emoji: bool,
  pub polish: PolishSettings,
  pub release: ReleaseSettings,
  pub github: GithubSettings,
}

impl Settings {
  /// Resolve against the process environment
  pub fn resolve(root: &Path, explicit_config: Option<&Path>, overrides: &Overrides) -> LogbookResult<Self> {
    let (config_path, file) = FileConfig::load(root, explicit_config)?;
    Self::from_layers(root, config_path, file, |key| std::env::var(key).ok(), overrides)
  }

  /// Merge defaults, file, environment and overrides
  pub fn from_layers(
    root: &Path,
    config_path: Option<PathBuf>,
    file: FileConfig,
    env: impl Fn(&str) -> Option<String>,
    overrides: &Overrides,
  ) -> LogbookResult<Self> {
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let dir = overrides
      .dir
      .clone()
      .or(file.changelog.dir)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_CHANGELOG_DIR));

    let timeout_secs = file.polish.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
      return Err(LogbookError::Config(ConfigError::InvalidValue {
        field: "polish.timeout_secs".to_string(),
        value: "0".to_string(),
      }));
    }

    let polish = PolishSettings {
      provider: overrides.provider.or(file.polish.provider).unwrap_or_default(),
      model: file.polish.model,
      timeout: Duration::from_secs(timeout_secs),
      openai_key: overrides
        .openai_key
        .clone()
        .or_else(|| env("OPENAI_API_KEY"))
        .or(file.polish.openai_key),
      claude_key: overrides
        .claude_key
        .clone()
        .or_else(|| env("ANTHROPIC_API_KEY"))
        .or(file.polish.claude_key),
      gemini_key: overrides
        .gemini_key
        .clone()
        .or_else(|| env("GEMINI_API_KEY"))
        .or(file.polish.gemini_key),
    };

    let manifest = overrides
      .manifest
      .clone()
      .or(file.release.manifest)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST));

    let version_files = if overrides.version_files.is_empty() {
      file.release.version_files.unwrap_or_default()
    } else {
      overrides.version_files.clone()
    };

    let release = ReleaseSettings {
      manifest: absolutize(root, &manifest),
      version_files: version_files.iter().map(|p| absolutize(root, p)).collect(),
      check_pending: overrides.check_pending.or(file.release.check_pending).unwrap_or(true),
      push: overrides.push.or(file.release.push).unwrap_or(true),
      remote: file.release.remote.unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
    };

    let github = GithubSettings {
      token: env("GITHUB_TOKEN").or_else(|| env("GH_TOKEN")),
      repo: file.github.repo,
      api_url: file.github.api_url.unwrap_or_else(|| DEFAULT_GITHUB_API.to_string()),
    };

    Ok(Self {
      root: root.to_path_buf(),
      config_path,
      changelog_dir: absolutize(root, &dir),
      since: overrides
        .since
        .clone()
        .or(file.changelog.since)
        .unwrap_or_else(|| DEFAULT_SINCE.to_string()),
      emoji: overrides.emoji.or(file.changelog.emoji).unwrap_or(false),
      polish,
      release,
      github,
    })
  }
}

fn absolutize(root: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    root.join(path)
  }
}
