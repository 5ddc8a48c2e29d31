//! Google Gemini `generateContent` provider

use super::{MessagePolisher, SYSTEM_PROMPT, build_prompt, empty_response, http_client, send_json};
use crate::core::error::LogbookResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiPolisher {
  api_key: String,
  model: String,
  base_url: String,
  client: reqwest::blocking::Client,
}

impl GeminiPolisher {
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
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
  system_instruction: Content<'a>,
  contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
  parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
  text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  #[serde(default)]
  text: Option<String>,
}

impl MessagePolisher for GeminiPolisher {
  fn name(&self) -> &'static str {
    "gemini"
  }

  fn polish(&self, messages: &[String], emoji: bool) -> LogbookResult<String> {
    let prompt = build_prompt(messages, emoji);
    let request = GenerateRequest {
      system_instruction: Content {
        parts: vec![Part { text: SYSTEM_PROMPT }],
      },
      contents: vec![Content {
        parts: vec![Part { text: &prompt }],
      }],
    };

    let response: GenerateResponse = send_json(
      self
        .client
        .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
        .header("x-goog-api-key", &self.api_key)
        .json(&request),
      self.name(),
    )?;

    let text = first_candidate_text(response);
    if text.trim().is_empty() {
      return Err(empty_response(self.name()));
    }
    Ok(text)
  }
}

fn first_candidate_text(response: GenerateResponse) -> String {
  response
    .candidates
    .into_iter()
    .next()
    .and_then(|candidate| candidate.content)
    .map(|content| {
      content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("")
    })
    .unwrap_or_default()
}
