//! OpenAI chat completions provider

use super::{MessagePolisher, SYSTEM_PROMPT, build_prompt, empty_response, http_client, send_json};
use crate::core::error::LogbookResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiPolisher {
  api_key: String,
  model: String,
  base_url: String,
  client: reqwest::blocking::Client,
}

impl OpenAiPolisher {
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
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage<'a>>,
  temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  #[serde(default)]
  content: Option<String>,
}

impl MessagePolisher for OpenAiPolisher {
  fn name(&self) -> &'static str {
    "openai"
  }

  fn polish(&self, messages: &[String], emoji: bool) -> LogbookResult<String> {
    let prompt = build_prompt(messages, emoji);
    let request = ChatRequest {
      model: &self.model,
      messages: vec![
        ChatMessage {
          role: "system",
          content: SYSTEM_PROMPT,
        },
        ChatMessage {
          role: "user",
          content: &prompt,
        },
      ],
      temperature: 0.2,
    };

    let response: ChatResponse = send_json(
      self
        .client
        .post(format!("{}/chat/completions", self.base_url))
        .bearer_auth(&self.api_key)
        .json(&request),
      self.name(),
    )?;

    response
      .choices
      .into_iter()
      .next()
      .and_then(|choice| choice.message.content)
      .filter(|text| !text.trim().is_empty())
      .ok_or_else(|| empty_response(self.name()))
  }
}
