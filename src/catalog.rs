// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Course catalog lookup
//!
//! The crawler only sees [`CourseCatalog`]: a query in, zero or more
//! records out, or an error. [`HttpCatalog`] talks to the outline API;
//! [`StaticCatalog`] serves records from memory or a JSON file.

use crate::config::CatalogConfig;
use crate::course::{CatalogQuery, CourseRef, SuffixPolicy};
use crate::types::CourseRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from a catalog lookup
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network or decoding failure
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("catalog returned status {0}")]
    Status(u16),

    /// A catalog file could not be read
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// A catalog file is not valid JSON
    #[error("invalid catalog data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of course records
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    /// Records matching the query; the crawler uses the first
    async fn lookup(&self, query: &CatalogQuery) -> Result<Vec<CourseRecord>, CatalogError>;
}

// =============================================================================
// HTTP
// =============================================================================

/// Catalog backed by the outline REST API
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    /// Create a catalog client from configuration
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl CourseCatalog for HttpCatalog {
    async fn lookup(&self, query: &CatalogQuery) -> Result<Vec<CourseRecord>, CatalogError> {
        debug!("GET {} dept={} number={}", self.base_url, query.dept, query.number);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("dept", query.dept.as_str()), ("number", query.number.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

// =============================================================================
// Static
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<CourseRecord>),
    Keyed(HashMap<String, CourseRecord>),
}

/// In-memory catalog keyed by "DEPT NUMBER"
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    records: HashMap<String, CourseRecord>,
}

impl StaticCatalog {
    /// Build a catalog from records; later duplicates replace earlier ones
    pub fn from_records(records: impl IntoIterator<Item = CourseRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|r| (key(&r.dept, &r.number), r))
            .collect();
        Self { records }
    }

    /// Parse a JSON array of records, or an object whose values are records
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let records = match serde_json::from_str::<CatalogFile>(json)? {
            CatalogFile::List(list) => list,
            CatalogFile::Keyed(map) => map.into_values().collect(),
        };
        Ok(Self::from_records(records))
    }

    /// Load a JSON catalog file
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn key(dept: &str, number: &str) -> String {
    let joined = format!("{dept} {number}");
    CourseRef::parse(&joined).map_or_else(
        || joined.to_ascii_uppercase(),
        |c| c.canonical(SuffixPolicy::Keep),
    )
}

#[async_trait]
impl CourseCatalog for StaticCatalog {
    async fn lookup(&self, query: &CatalogQuery) -> Result<Vec<CourseRecord>, CatalogError> {
        Ok(self
            .records
            .get(&key(&query.dept, &query.number))
            .cloned()
            .into_iter()
            .collect())
    }
}
