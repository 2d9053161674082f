// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Prerequisite text extraction
//!
//! Turns a course's free-text prerequisite description into candidate
//! course codes. Two strategies share one trait: deterministic pattern
//! scanning and delegation to a text-generation model. Both run their
//! output through [`CandidateSet`], which normalizes, deduplicates, and
//! applies the high-school exclusion policy.

pub mod llm;
pub mod pattern;

use crate::config::ExtractorConfig;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

pub use llm::{GeminiClient, LlmExtractor, TextGenerator};
pub use pattern::PatternExtractor;

/// Errors from an extraction collaborator
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The request never produced a response
    #[error("extractor request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collaborator answered with a non-success status
    #[error("extractor returned status {0}")]
    Status(u16),

    /// The model API key is not available
    #[error("missing API key: set {0}")]
    MissingApiKey(String),
}

/// Which extraction strategy to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorStrategy {
    /// Regex scan, no external call
    #[default]
    Pattern,
    /// Delegate to a text-generation model
    Llm,
}

/// Extracts candidate course codes from prerequisite text
#[async_trait]
pub trait PrereqExtractor: Send + Sync {
    /// Candidate codes in first-seen order, without duplicates or
    /// high-school requirements. Blank input yields an empty list.
    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractError>;

    /// Short strategy name for logs
    fn name(&self) -> &'static str;
}

/// Build the extractor selected by configuration
pub fn from_config(config: &ExtractorConfig) -> Result<Arc<dyn PrereqExtractor>, ExtractError> {
    match config.strategy {
        ExtractorStrategy::Pattern => Ok(Arc::new(PatternExtractor::new())),
        ExtractorStrategy::Llm => {
            let client = GeminiClient::from_config(config)?;
            Ok(Arc::new(LlmExtractor::new(Arc::new(client))))
        }
    }
}

// =============================================================================
// Exclusion Policy
// =============================================================================

static HIGH_SCHOOL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // BC 11, BC 12, BC 12W
        r"(?i)^BC\s*\d+[A-Z]*$",
        // Grade 11 and 12 courses
        r"(?i)^(MATH|CHEM|PHYS|ENGL|BIO)\s*1[12][A-Z]*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("exclusion pattern compiles"))
    .collect()
});

// A complete code and nothing else: "CMPT 125", "cmpt105w"
static WHOLE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{2,5})\s*([0-9]{3,4})([A-Za-z]{0,2})$")
        .expect("code shape pattern compiles")
});

/// True for British Columbia grade 11/12 and equivalent high-school codes
#[must_use]
pub fn is_high_school(code: &str) -> bool {
    let code = code.trim();
    HIGH_SCHOOL.iter().any(|re| re.is_match(code))
}

/// Ordered, deduplicated set of candidate codes
#[derive(Debug, Default)]
pub struct CandidateSet {
    seen: HashSet<String>,
    codes: Vec<String>,
}

impl CandidateSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a code already split into parts. Returns false when it was
    /// excluded or already present.
    pub fn insert_parts(&mut self, dept: &str, number: &str, suffix: &str) -> bool {
        let code = format!(
            "{} {}{}",
            dept.to_ascii_uppercase(),
            number,
            suffix.to_ascii_uppercase()
        );
        if is_high_school(&code) || !self.seen.insert(code.clone()) {
            return false;
        }
        self.codes.push(code);
        true
    }

    /// Add a free-form code string. The whole string must be one course
    /// code; anything else is dropped.
    pub fn insert(&mut self, raw: &str) -> bool {
        match WHOLE_CODE.captures(raw.trim()) {
            Some(caps) => self.insert_parts(&caps[1], &caps[2], &caps[3]),
            None => false,
        }
    }

    /// Finish and return codes in insertion order
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.codes
    }
}
