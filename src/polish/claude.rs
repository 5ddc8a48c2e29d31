//! Anthropic messages API provider

use super::{MessagePolisher, SYSTEM_PROMPT, build_prompt, empty_response, http_client, send_json};
use crate::core::error::LogbookResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub struct ClaudePolisher {
  api_key: String,
  model: String,
  base_url: String,
  client: reqwest::blocking::Client,
}

impl ClaudePolisher {
  pub fn new(api_key: String, model: Option<String>, timeout: Duration) -> LogbookResult<Self> {
    Ok(Self {
      api_key,
      model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
      base_url: BASE_URL.to_string(),
      client: http_client(timeout)?,
    })
  }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
  model: &'a str,
  max_tokens: u32,
  system: &'a str,
  messages: Vec<UserMessage<'a>>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
  #[serde(default)]
  content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
  #[serde(rename = "type")]
  kind: String,
  #[serde(default)]
  text: Option<String>,
}

impl MessagePolisher for ClaudePolisher {
  fn name(&self) -> &'static str {
    "claude"
  }

  fn polish(&self, messages: &[String], emoji: bool) -> LogbookResult<String> {
    let prompt = build_prompt(messages, emoji);
    let request = MessagesRequest {
      model: &self.model,
      max_tokens: MAX_TOKENS,
      system: SYSTEM_PROMPT,
      messages: vec![UserMessage {
        role: "user",
        content: &prompt,
      }],
    };

    let response: MessagesResponse = send_json(
      self
        .client
        .post(format!("{}/messages", self.base_url))
        .header("x-api-key", &self.api_key)
        .header("anthropic-version", API_VERSION)
        .json(&request),
      self.name(),
    )?;

    let text: String = response
      .content
      .into_iter()
      .filter(|block| block.kind == "text")
      .filter_map(|block| block.text)
      .collect::<Vec<_>>()
      .join("\n");

    if text.trim().is_empty() {
      return Err(empty_response(self.name()));
    }
    Ok(text)
  }
}
