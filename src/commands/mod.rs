// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod build;
pub mod completions;
pub mod config;
pub mod extract;
pub mod parse;
pub mod serve;

use crate::builder::GraphBuilder;
use crate::catalog::{CourseCatalog, HttpCatalog, StaticCatalog};
use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Wire a graph builder from configuration. A catalog file replaces the
/// HTTP catalog.
pub fn graph_builder(config: &Config, catalog_file: Option<&Path>) -> Result<GraphBuilder> {
    let catalog: Arc<dyn CourseCatalog> = match catalog_file {
        Some(path) => {
            let catalog = StaticCatalog::from_path(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            info!("Loaded {} catalog records from {}", catalog.len(), path.display());
            Arc::new(catalog)
        }
        None => Arc::new(
            HttpCatalog::from_config(&config.catalog).context("Failed to create catalog client")?,
        ),
    };

    let extractor = crate::extract::from_config(&config.extractor)
        .context("Failed to create prerequisite extractor")?;
    info!("Using {} prerequisite extraction", extractor.name());

    Ok(GraphBuilder::new(catalog, extractor, config.crawl.clone()))
}
