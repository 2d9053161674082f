// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Regex-based prerequisite extraction

use super::{CandidateSet, ExtractError, PrereqExtractor};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

// CMPT 225, CMPT 105W, MACM101, ENSC 251D
static PREREQ_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z]{2,5})\s*([0-9]{3,4})([A-Za-z]{0,2})\b")
        .expect("prerequisite code pattern compiles")
});

/// Deterministic extractor that scans for course-code shaped tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl PatternExtractor {
    /// Create a pattern extractor
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Scan `text` synchronously
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<String> {
        let mut candidates = CandidateSet::new();
        for caps in PREREQ_CODE.captures_iter(text) {
            candidates.insert_parts(&caps[1], &caps[2], &caps[3]);
        }
        candidates.into_vec()
    }
}

#[async_trait]
impl PrereqExtractor for PatternExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractError> {
        Ok(self.scan(text))
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}
