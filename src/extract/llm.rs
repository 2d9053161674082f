// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Delegated prerequisite extraction through a text-generation model

use super::{CandidateSet, ExtractError, PrereqExtractor};
use crate::config::ExtractorConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A model that answers a prompt with free text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, ExtractError>;
}

/// Extractor that asks a model to list the prerequisite courses
pub struct LlmExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl LlmExtractor {
    /// Wrap a text generator
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl PrereqExtractor for LlmExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let reply = self.generator.generate(&build_prompt(text)).await?;
        let codes = decode_reply(&reply);
        debug!(count = codes.len(), "Model returned prerequisite candidates");
        Ok(codes)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Prompt asking for a bare JSON array of university course codes
#[must_use]
pub fn build_prompt(text: &str) -> String {
    format!(
        "Extract the university course codes that are prerequisites in the text below.\n\
         Rules:\n\
         - Return ONLY a JSON array of strings such as [\"CMPT 125\", \"MACM 101\"], with no other text.\n\
         - When the text gives alternatives (\"A or B\"), include every alternative.\n\
         - Exclude high school requirements: BC grade codes (BC 11, BC 12) and grade 11/12 \
           courses such as MATH 12, CHEM 11, PHYS 12, ENGL 12, BIO 11.\n\
         - Exclude any course that is named only as a substitute or equivalent for a high \
           school requirement, even if it is a university course.\n\
         - Return [] when there are no university course prerequisites.\n\n\
         Text: {text}"
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Reply {
    List(Vec<String>),
    Wrapped { courses: Vec<String> },
}

/// Remove a surrounding markdown code fence, if any
#[must_use]
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string ("json") on the opening line
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Decode a model reply into normalized candidate codes.
///
/// Anything that is not a JSON array of strings (or `{"courses": [...]}`)
/// yields no candidates.
#[must_use]
pub fn decode_reply(reply: &str) -> Vec<String> {
    let payload = strip_code_fence(reply);
    let raw = match serde_json::from_str::<Reply>(payload) {
        Ok(Reply::List(codes) | Reply::Wrapped { courses: codes }) => codes,
        Err(e) => {
            warn!("Discarding undecodable model reply: {}", e);
            return Vec::new();
        }
    };

    let mut candidates = CandidateSet::new();
    for code in &raw {
        candidates.insert(code);
    }
    candidates.into_vec()
}

// =============================================================================
// Gemini
// =============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
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
    text: String,
}

/// Google Gemini `generateContent` client
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client from the extractor configuration, reading the API
    /// key from the configured environment variable
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ExtractError::MissingApiKey(config.api_key_env.clone()))?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ExtractError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Status(response.status().as_u16()));
        }

        // A reply without text decodes to no candidates downstream
        let body: GenerateResponse = response.json().await?;
        Ok(body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }
}
