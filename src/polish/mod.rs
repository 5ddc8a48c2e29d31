//! Commit message polishing
//!
//! A [`MessagePolisher`] rewrites raw commit messages into changelog bullets.
//! Providers are interchangeable; [`select_polisher`] picks one from the
//! resolved settings and [`polish_or_fallback`] guarantees one bullet per
//! input no matter what the provider does.

pub mod claude;
pub mod gemini;
pub mod openai;

use crate::changelog::document::fallback_bullet;
use crate::core::config::{PolishSettings, ProviderChoice};
use crate::core::error::{LogbookError, LogbookResult, RemoteError};
use std::time::Duration;
use tracing::{debug, warn};

pub use claude::ClaudePolisher;
pub use gemini::GeminiPolisher;
pub use openai::OpenAiPolisher;

/// Rewrites raw messages into `- ` bullet lines
pub trait MessagePolisher {
  /// Provider name for logs
  fn name(&self) -> &'static str;

  /// Return newline-separated bullets, one per message, in input order
  fn polish(&self, messages: &[String], emoji: bool) -> LogbookResult<String>;
}

const SYSTEM_PROMPT: &str = "You write concise, user-facing changelog entries from git commit messages.";

/// Prompt shared by every provider
pub fn build_prompt(messages: &[String], emoji: bool) -> String {
  let mut prompt = String::from(
    "Rewrite each commit message below as one changelog bullet.\n\
     Rules:\n\
     - Output exactly one line per message, in the same order.\n\
     - Every line starts with \"- \".\n\
     - Keep each line short and in the imperative or past tense.\n\
     - Do not add headings, numbering, or any other text.\n",
  );
  if emoji {
    prompt.push_str("- Put one fitting emoji right after \"- \".\n");
  } else {
    prompt.push_str("- Do not use emoji.\n");
  }
  prompt.push_str("\nCommit messages:\n");
  for (i, message) in messages.iter().enumerate() {
    prompt.push_str(&format!("{}. {}\n", i + 1, message));
  }
  prompt
}

/// Pull the bullet lines out of a provider response
///
/// Fails unless there is exactly one `- ` line per input message.
pub fn parse_bullets(response: &str, expected: usize) -> LogbookResult<Vec<String>> {
  let bullets: Vec<String> = response
    .lines()
    .map(str::trim)
    .filter(|line| line.starts_with("- ") && line.len() > 2)
    .map(str::to_string)
    .collect();

  if bullets.len() != expected {
    return Err(LogbookError::Remote(RemoteError::MalformedResponse {
      service: "polisher".to_string(),
      reason: format!("expected {} bullet lines, got {}", expected, bullets.len()),
    }));
  }

  Ok(bullets)
}

/// Polish `messages`, falling back to `- <raw>` per message on any failure
///
/// The result always has the same length and order as `messages`.
pub fn polish_or_fallback(polisher: Option<&dyn MessagePolisher>, messages: &[String], emoji: bool) -> Vec<String> {
  let fallback = || messages.iter().map(|m| fallback_bullet(m)).collect();

  let Some(polisher) = polisher else {
    debug!("no polisher configured; storing raw messages");
    return fallback();
  };
  if messages.is_empty() {
    return Vec::new();
  }

  match polisher
    .polish(messages, emoji)
    .and_then(|response| parse_bullets(&response, messages.len()))
  {
    Ok(bullets) => {
      debug!(provider = polisher.name(), count = bullets.len(), "messages polished");
      bullets
    }
    Err(e) => {
      warn!(provider = polisher.name(), error = %e, "polishing failed; using raw messages");
      fallback()
    }
  }
}

/// Build the configured polisher, if any
///
/// `auto` takes the first provider with a credential (openai, claude, gemini).
/// A provider without a credential is disabled, not an error.
pub fn select_polisher(settings: &PolishSettings) -> Option<Box<dyn MessagePolisher>> {
  let choice = match settings.provider {
    ProviderChoice::None => return None,
    ProviderChoice::Auto => {
      if settings.openai_key.is_some() {
        ProviderChoice::Openai
      } else if settings.claude_key.is_some() {
        ProviderChoice::Claude
      } else if settings.gemini_key.is_some() {
        ProviderChoice::Gemini
      } else {
        debug!("no polisher credentials found");
        return None;
      }
    }
    explicit => explicit,
  };

  let model = settings.model.clone();
  let built: Option<LogbookResult<Box<dyn MessagePolisher>>> = match choice {
    ProviderChoice::Openai => settings.openai_key.clone().map(|key| {
      OpenAiPolisher::new(key, model, settings.timeout).map(|p| Box::new(p) as Box<dyn MessagePolisher>)
    }),
    ProviderChoice::Claude => settings.claude_key.clone().map(|key| {
      ClaudePolisher::new(key, model, settings.timeout).map(|p| Box::new(p) as Box<dyn MessagePolisher>)
    }),
    ProviderChoice::Gemini => settings.gemini_key.clone().map(|key| {
      GeminiPolisher::new(key, model, settings.timeout).map(|p| Box::new(p) as Box<dyn MessagePolisher>)
    }),
    ProviderChoice::Auto | ProviderChoice::None => None,
  };

  match built {
    Some(Ok(polisher)) => {
      debug!(provider = polisher.name(), "polisher selected");
      Some(polisher)
    }
    Some(Err(e)) => {
      warn!(error = %e, "could not build polisher client; storing raw messages");
      None
    }
    None => {
      warn!(provider = ?choice, "provider selected but no API key available; storing raw messages");
      None
    }
  }
}

/// Blocking HTTP client with the configured timeout
pub(crate) fn http_client(timeout: Duration) -> LogbookResult<reqwest::blocking::Client> {
  let client = reqwest::blocking::Client::builder()
    .timeout(timeout)
    .user_agent(concat!("logbook/", env!("CARGO_PKG_VERSION")))
    .build()?;
  Ok(client)
}

/// Send a request and decode a JSON body, mapping non-2xx to a transport error
pub(crate) fn send_json<T: serde::de::DeserializeOwned>(
  request: reqwest::blocking::RequestBuilder,
  service: &str,
) -> LogbookResult<T> {
  let response = request.send()?;
  let status = response.status();
  if !status.is_success() {
    let body = response.text().unwrap_or_default();
    return Err(LogbookError::Remote(RemoteError::Transport {
      status: Some(status.as_u16()),
      message: format!("{} returned {}: {}", service, status, body.trim()),
    }));
  }

  response.json::<T>().map_err(|e| {
    LogbookError::Remote(RemoteError::MalformedResponse {
      service: service.to_string(),
      reason: e.to_string(),
    })
  })
}

/// Missing text in an otherwise well-formed response
pub(crate) fn empty_response(service: &str) -> LogbookError {
  LogbookError::Remote(RemoteError::MalformedResponse {
    service: service.to_string(),
    reason: "response contained no text".to_string(),
  })
}
