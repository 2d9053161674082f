// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Extract command - lists the prerequisite codes found in a description

use crate::config::Config;
use anyhow::{Context, Result};

/// Run the extract command
pub async fn run(config: &Config, text: &str, as_json: bool) -> Result<()> {
    let extractor = crate::extract::from_config(&config.extractor)
        .context("Failed to create prerequisite extractor")?;
    let courses = extractor
        .extract(text)
        .await
        .with_context(|| format!("{} extraction failed", extractor.name()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "courses": courses }))?);
    } else if courses.is_empty() {
        eprintln!("No prerequisite courses found.");
    } else {
        for course in &courses {
            println!("{course}");
        }
    }
    Ok(())
}
