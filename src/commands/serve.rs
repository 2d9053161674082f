// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Serve command - runs the HTTP service

use crate::config::Config;
use crate::server::{self, AppState};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the serve command
pub async fn run(
    config: &Config,
    bind: Option<String>,
    catalog_file: Option<PathBuf>,
) -> Result<()> {
    let builder = super::graph_builder(config, catalog_file.as_deref())?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    server::serve(&bind, AppState::new(Arc::new(builder))).await
}
