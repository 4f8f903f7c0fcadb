//! Text generation over the Gemini `generateContent` HTTP API.

use anyhow::{Context, Result};
use nextplace_core::{GenerationError, TextGeneration};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize, Debug)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    pub(crate) fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

pub(crate) fn build_generate_url(base: &str, model: &str) -> Result<Url> {
    let mut url = Url::parse(base).context("Invalid Gemini base URL")?;
    let operation = format!("{model}:generateContent");
    url.path_segments_mut()
        .map_err(|()| anyhow::anyhow!("Gemini base URL cannot be a base"))?
        .pop_if_empty()
        .extend(["v1beta", "models", operation.as_str()]);
    Ok(url)
}

pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GeminiClient {
    /// Reads `GEMINI_API_KEY`, and optionally `GEMINI_MODEL` / `GEMINI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY").context("GEMINI_API_KEY env var is required")?;
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: build_generate_url(&base, &model)?,
            api_key,
        })
    }
}

impl TextGeneration for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(GenerationError::Provider(format!("{status}: {detail}")));
        }

        let parsed: GenerateResponse = resp
            .json()
            .map_err(|e| GenerationError::Provider(e.to_string()))?;
        parsed
            .into_text()
            .ok_or_else(|| GenerationError::Provider("response has no candidates".into()))
    }
}
