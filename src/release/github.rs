//! GitHub release publishing
//!
//! Best effort: the release cutter only builds a host when a token and a
//! repository are known, and a failed publish never aborts a release.

use crate::core::config::GithubSettings;
use crate::core::error::{LogbookError, LogbookResult, RemoteError};
use serde::Serialize;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Publishes a release object for an existing tag
pub trait ReleaseHost {
  fn create_release(&self, tag: &str, title: &str, body: &str) -> LogbookResult<()>;
}

/// GitHub REST `POST /repos/{owner}/{repo}/releases`
pub struct GitHubReleases {
  owner: String,
  repo: String,
  token: String,
  api_url: String,
  backoff: Duration,
  client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct CreateRelease<'a> {
  tag_name: &'a str,
  name: &'a str,
  body: &'a str,
  draft: bool,
  prerelease: bool,
}

impl GitHubReleases {
  pub fn new(owner: impl Into<String>, repo: impl Into<String>, token: impl Into<String>, api_url: &str) -> LogbookResult<Self> {
    let client = reqwest::blocking::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .user_agent(concat!("logbook/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self {
      owner: owner.into(),
      repo: repo.into(),
      token: token.into(),
      api_url: api_url.trim_end_matches('/').to_string(),
      backoff: Duration::from_secs(1),
      client,
    })
  }

  /// Build from settings, using the git remote when no repo is configured
  ///
  /// `None` when the token or the repository is unknown.
  pub fn from_settings(settings: &GithubSettings, remote_url: Option<&str>) -> Option<Self> {
    let token = settings.token.as_deref()?;
    let (owner, repo) = match settings.repo.as_deref() {
      Some(slug) => parse_repo_slug(slug)?,
      None => parse_github_remote(remote_url?)?,
    };

    match Self::new(owner, repo, token, &settings.api_url) {
      Ok(host) => Some(host),
      Err(e) => {
        warn!(error = %e, "could not build GitHub client");
        None
      }
    }
  }

  pub fn slug(&self) -> String {
    format!("{}/{}", self.owner, self.repo)
  }

  fn post_once(&self, request: &CreateRelease<'_>) -> LogbookResult<()> {
    let url = format!("{}/repos/{}/{}/releases", self.api_url, self.owner, self.repo);
    let response = self
      .client
      .post(&url)
      .bearer_auth(&self.token)
      .header("Accept", "application/vnd.github+json")
      .header("X-GitHub-Api-Version", "2022-11-28")
      .json(request)
      .send()?;

    let status = response.status();
    if status.is_success() {
      return Ok(());
    }
    let body = response.text().unwrap_or_default();
    Err(LogbookError::Remote(RemoteError::Transport {
      status: Some(status.as_u16()),
      message: format!("GitHub returned {}: {}", status, body.trim()),
    }))
  }
}

impl ReleaseHost for GitHubReleases {
  fn create_release(&self, tag: &str, title: &str, body: &str) -> LogbookResult<()> {
    let request = CreateRelease {
      tag_name: tag,
      name: title,
      body,
      draft: false,
      prerelease: false,
    };
    with_retry(MAX_ATTEMPTS, self.backoff, |attempt| {
      debug!(attempt, repo = %self.slug(), tag, "creating GitHub release");
      self.post_once(&request)
    })
  }
}

/// Run `op` up to `attempts` times, doubling the wait after each failure
///
/// Client errors other than 429 are not retried.
fn with_retry<T>(attempts: u32, base: Duration, mut op: impl FnMut(u32) -> LogbookResult<T>) -> LogbookResult<T> {
  let mut delay = base;
  let mut attempt = 1;
  loop {
    match op(attempt) {
      Ok(value) => return Ok(value),
      Err(e) if attempt < attempts && is_retryable(&e) => {
        warn!(attempt, error = %e, "request failed; retrying in {:?}", delay);
        thread::sleep(delay);
        delay *= 2;
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}

fn is_retryable(error: &LogbookError) -> bool {
  match error {
    LogbookError::Remote(RemoteError::Transport {
      status: Some(status), ..
    }) => *status == 429 || *status >= 500,
    LogbookError::Remote(RemoteError::Transport { status: None, .. }) => true,
    _ => false,
  }
}

/// `owner/name`
fn parse_repo_slug(slug: &str) -> Option<(String, String)> {
  let (owner, repo) = slug.trim().split_once('/')?;
  if owner.is_empty() || repo.is_empty() || repo.contains('/') {
    return None;
  }
  Some((owner.to_string(), repo.to_string()))
}

/// Parse a GitHub remote URL (SSH or HTTPS) into (owner, repo)
pub fn parse_github_remote(url: &str) -> Option<(String, String)> {
  let url = url.trim();
  let rest = url
    .strip_prefix("git@github.com:")
    .or_else(|| url.strip_prefix("ssh://git@github.com/"))
    .or_else(|| url.strip_prefix("https://github.com/"))
    .or_else(|| url.strip_prefix("http://github.com/"))?;
  let path = rest.trim_end_matches('/');
  let path = path.strip_suffix(".git").unwrap_or(path);
  parse_repo_slug(path)
}
