// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Build command - crawls a course's prerequisites and prints the graph

use crate::builder::{BuildReport, SkipReason};
use crate::config::Config;
use crate::graph::{PrereqGraph, TreeEntryKind};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Indented prerequisite tree
    Tree,
    /// `{nodes, links}` JSON
    Json,
    /// Graphviz DOT
    Dot,
    /// Prerequisites-first course list
    Order,
}

/// Arguments for the build command
#[derive(Debug, Clone)]
pub struct BuildArgs {
    /// Course to start from
    pub course: String,
    /// Output format
    pub format: OutputFormat,
    /// Output file (stdout if not specified)
    pub output: Option<PathBuf>,
    /// Local JSON catalog instead of the HTTP catalog
    pub catalog_file: Option<PathBuf>,
    /// Depth ceiling override
    pub max_depth: Option<usize>,
    /// Include pruned branches in the output
    pub diagnostics: bool,
    /// Drop links whose endpoints were never resolved to a node
    pub resolved_only: bool,
    /// Colored output
    pub color: bool,
}

/// Run the build command
pub async fn run(mut config: Config, args: BuildArgs) -> Result<()> {
    if let Some(depth) = args.max_depth {
        config.crawl.max_depth = depth;
    }

    let builder = super::graph_builder(&config, args.catalog_file.as_deref())?;
    let mut report = builder.build_with_report(&args.course).await;
    if args.resolved_only {
        report.graph = report.graph.without_dangling_links();
    }

    if report.graph.is_empty() {
        eprintln!("Warning: no catalog record found for {:?}", args.course);
    }

    let content = match args.format {
        OutputFormat::Json if args.diagnostics => serde_json::to_string_pretty(&report)
            .context("Failed to serialize graph to JSON")?,
        OutputFormat::Json => serde_json::to_string_pretty(&report.graph)
            .context("Failed to serialize graph to JSON")?,
        OutputFormat::Dot => PrereqGraph::new(report.graph).to_dot(),
        OutputFormat::Order => render_order(&report)?,
        OutputFormat::Tree => render_tree(&report, args.diagnostics, args.color),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            info!("Wrote graph to {}", path.display());
            println!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.trim_end().as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

fn render_order(report: &BuildReport) -> Result<String> {
    let graph = PrereqGraph::new(report.graph.clone());
    let order = graph
        .study_order()
        .ok_or_else(|| anyhow::anyhow!("Prerequisite graph has a cycle; no study order exists"))?;

    let mut out = String::new();
    for (i, id) in order.iter().enumerate() {
        let title = graph.courses.node(id).map_or("(not found)", |n| n.title.as_str());
        writeln!(out, "{:>3}. {}  {}", i + 1, id, title)?;
    }
    Ok(out)
}

fn render_tree(report: &BuildReport, diagnostics: bool, color: bool) -> String {
    let mut out = String::new();
    let Some(root) = report.graph.nodes.first() else {
        return out;
    };
    let graph = PrereqGraph::new(report.graph.clone());

    for entry in graph.tree(&root.id) {
        let id = if color {
            match entry.kind {
                TreeEntryKind::Course => entry.id.bold().to_string(),
                TreeEntryKind::Repeated => entry.id.dimmed().to_string(),
                TreeEntryKind::Unresolved => entry.id.red().to_string(),
            }
        } else {
            entry.id.clone()
        };
        let note = match entry.kind {
            TreeEntryKind::Course => entry.title.unwrap_or_default(),
            TreeEntryKind::Repeated => "(see above)".to_string(),
            TreeEntryKind::Unresolved => "(not found)".to_string(),
        };
        let _ = writeln!(out, "{}{}  {}", entry.prefix, id, note);
    }

    let unresolved = graph.unresolved_ids().len();
    let _ = writeln!(
        out,
        "\n{} courses, {} prerequisite links ({} unresolved)",
        report.graph.nodes.len(),
        report.graph.links.len(),
        unresolved
    );

    if diagnostics && !report.diagnostics.is_empty() {
        let _ = writeln!(out, "\nPruned branches:");
        for d in &report.diagnostics {
            let reason = match &d.reason {
                SkipReason::DepthExceeded => "depth limit".to_string(),
                SkipReason::Unparseable => "not a course code".to_string(),
                SkipReason::Denylisted => "denylisted".to_string(),
                SkipReason::NotFound => "not in catalog".to_string(),
                SkipReason::LookupFailed(e) => format!("lookup failed: {e}"),
                SkipReason::ExtractFailed(e) => format!("extraction failed: {e}"),
            };
            let _ = writeln!(out, "  {} (depth {}): {}", d.course, d.depth, reason);
        }
    }

    out
}
