// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Recursive prerequisite graph builder
//!
//! Starting from one course string, the builder parses it, looks it up in
//! the catalog, extracts prerequisite codes from the record, records a link
//! for each, and recurses depth-first. Every per-branch failure prunes only
//! that branch; a build always completes with whatever was reachable.

use crate::catalog::CourseCatalog;
use crate::config::CrawlConfig;
use crate::course::{self, CourseRef};
use crate::extract::PrereqExtractor;
use crate::types::{CourseGraph, CourseNode, CourseRecord, PrereqLink};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a denylisted course is treated when another course requires it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenylistPolicy {
    /// Record the link but never look the course up
    #[default]
    Skip,
    /// Record no link naming the course either
    Prune,
}

/// Why a branch stopped early
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Deeper than the configured ceiling
    DepthExceeded,
    /// No course code in the string
    Unparseable,
    /// Listed in the denylist
    Denylisted,
    /// The catalog call failed
    LookupFailed(String),
    /// The catalog had no record
    NotFound,
    /// The extractor call failed
    ExtractFailed(String),
}

/// A pruned branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Course string as it was dequeued
    pub course: String,
    /// Recursion depth (start course is 0)
    pub depth: usize,
    /// What stopped the branch
    pub reason: SkipReason,
}

/// Graph plus the branches that were pruned while building it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// The assembled graph
    #[serde(flatten)]
    pub graph: CourseGraph,
    /// Pruned branches in the order they were hit
    pub diagnostics: Vec<Diagnostic>,
}

// =============================================================================
// Crawl State
// =============================================================================

/// Mutable state of one build; never shared between builds
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: HashSet<String>,
    node_index: HashMap<String, usize>,
    nodes: Vec<CourseNode>,
    links: Vec<PrereqLink>,
    diagnostics: Vec<Diagnostic>,
}

impl CrawlState {
    /// Fresh state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `course` visited. Returns false if it already was.
    pub fn mark_visited(&mut self, course: &str) -> bool {
        self.visited.insert(course.trim().to_string())
    }

    /// Record a node unless one with the same id exists. Returns true when
    /// the node is new.
    pub fn record_node(&mut self, node: CourseNode) -> bool {
        if self.node_index.contains_key(&node.id) {
            return false;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Append a link; links are never deduplicated
    pub fn record_link(&mut self, link: PrereqLink) {
        self.links.push(link);
    }

    /// Note a pruned branch
    pub fn record_skip(&mut self, course: &str, depth: usize, reason: SkipReason) {
        self.diagnostics.push(Diagnostic {
            course: course.to_string(),
            depth,
            reason,
        });
    }

    /// Number of nodes recorded so far
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Consume the state into a report
    #[must_use]
    pub fn finish(self) -> BuildReport {
        BuildReport {
            graph: CourseGraph {
                nodes: self.nodes,
                links: self.links,
            },
            diagnostics: self.diagnostics,
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Crawls a catalog into a prerequisite graph
pub struct GraphBuilder {
    catalog: Arc<dyn CourseCatalog>,
    extractor: Arc<dyn PrereqExtractor>,
    options: CrawlConfig,
    denylist: HashSet<String>,
}

impl GraphBuilder {
    /// Create a builder over the given collaborators
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CourseCatalog>,
        extractor: Arc<dyn PrereqExtractor>,
        options: CrawlConfig,
    ) -> Self {
        let denylist = options
            .denylist
            .iter()
            .map(|entry| {
                CourseRef::parse(entry).map_or_else(
                    || entry.trim().to_ascii_uppercase(),
                    |c| c.canonical(options.suffix_policy),
                )
            })
            .collect();

        Self {
            catalog,
            extractor,
            options,
            denylist,
        }
    }

    /// The extractor used for prerequisite text
    #[must_use]
    pub fn extractor(&self) -> &Arc<dyn PrereqExtractor> {
        &self.extractor
    }

    /// Build the graph for `start`
    pub async fn build(&self, start: &str) -> CourseGraph {
        self.build_with_report(start).await.graph
    }

    /// Build the graph for `start`, keeping the list of pruned branches
    pub async fn build_with_report(&self, start: &str) -> BuildReport {
        info!("Building prerequisite graph for {:?}", start);

        let mut state = CrawlState::new();
        self.visit(&mut state, start.to_string(), 0).await;

        if state.node_count() == 0 && self.options.fallback_lookup {
            self.fallback(&mut state, start).await;
        }

        let report = state.finish();
        info!(
            nodes = report.graph.nodes.len(),
            links = report.graph.links.len(),
            pruned = report.diagnostics.len(),
            "Finished graph for {:?}",
            start
        );
        report
    }

    fn is_denylisted(&self, course: &CourseRef) -> bool {
        self.denylist
            .contains(&course.canonical(self.options.suffix_policy))
    }

    fn visit<'a>(
        &'a self,
        state: &'a mut CrawlState,
        raw: String,
        depth: usize,
    ) -> BoxFuture<'a, ()> {
        async move {
            if depth > self.options.max_depth {
                debug!("Depth {} exceeded at {}", depth, raw);
                state.record_skip(&raw, depth, SkipReason::DepthExceeded);
                return;
            }
            if !state.mark_visited(&raw) {
                return;
            }

            let Some(course) = CourseRef::parse(&raw) else {
                debug!("Skipping unparseable course {:?}", raw);
                state.record_skip(&raw, depth, SkipReason::Unparseable);
                return;
            };
            if self.is_denylisted(&course) {
                debug!("Skipping denylisted course {}", course);
                state.record_skip(&raw, depth, SkipReason::Denylisted);
                return;
            }

            let Some(record) = self.lookup(state, &raw, &course, depth).await else {
                return;
            };
            let id = self.record_node(state, &record);

            let Some(text) = record.prerequisite_text() else {
                return;
            };

            let candidates = match self.extractor.extract(text).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Prerequisite extraction failed for {}: {}", id, e);
                    state.record_skip(&raw, depth, SkipReason::ExtractFailed(e.to_string()));
                    return;
                }
            };
            debug!("{} requires {:?}", id, candidates);

            for candidate in candidates {
                let Some(prereq) = CourseRef::parse(&candidate) else {
                    state.record_skip(&candidate, depth + 1, SkipReason::Unparseable);
                    continue;
                };
                if self.options.denylist_policy == DenylistPolicy::Prune
                    && self.is_denylisted(&prereq)
                {
                    state.record_skip(&candidate, depth + 1, SkipReason::Denylisted);
                    continue;
                }

                state.record_link(PrereqLink::new(
                    prereq.canonical(self.options.suffix_policy),
                    id.clone(),
                ));
                self.visit(state, candidate, depth + 1).await;
            }
        }
        .boxed()
    }

    /// First catalog record for `course`, or `None` after noting why not
    async fn lookup(
        &self,
        state: &mut CrawlState,
        raw: &str,
        course: &CourseRef,
        depth: usize,
    ) -> Option<CourseRecord> {
        match self.catalog.lookup(&course.query(self.options.suffix_policy)).await {
            Ok(records) => {
                let first = records.into_iter().next();
                if first.is_none() {
                    debug!("No catalog record for {}", course);
                    state.record_skip(raw, depth, SkipReason::NotFound);
                }
                first
            }
            Err(e) => {
                warn!("Catalog lookup failed for {}: {}", course, e);
                state.record_skip(raw, depth, SkipReason::LookupFailed(e.to_string()));
                None
            }
        }
    }

    /// Record the node for a catalog record and return its canonical id
    fn record_node(&self, state: &mut CrawlState, record: &CourseRecord) -> String {
        let id = course::record_id(&record.dept, &record.number, self.options.suffix_policy);
        state.record_node(CourseNode {
            id: id.clone(),
            title: record.title.clone(),
            dept: record.dept.clone(),
            number: record.number.clone(),
        });
        id
    }

    /// Single direct lookup of the start course when the crawl found nothing
    async fn fallback(&self, state: &mut CrawlState, start: &str) {
        let Some(course) = CourseRef::parse(start) else {
            return;
        };
        if self.is_denylisted(&course) {
            return;
        }
        debug!("Crawl produced no nodes, looking up {} directly", course);
        if let Some(record) = self.lookup(state, start, &course, 0).await {
            self.record_node(state, &record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> CourseNode {
        CourseNode {
            id: id.into(),
            title: String::new(),
            dept: String::new(),
            number: String::new(),
        }
    }

    #[test]
    fn test_visited_check_and_mark() {
        let mut state = CrawlState::new();
        assert!(state.mark_visited("CMPT 225"));
        assert!(!state.mark_visited("CMPT 225"));
        assert!(!state.mark_visited(" CMPT 225 "));
        // raw strings, not canonical ids
        assert!(state.mark_visited("CMPT225"));
    }

    #[test]
    fn test_nodes_unique_in_insertion_order() {
        let mut state = CrawlState::new();
        assert!(state.record_node(node("MACM 101")));
        assert!(state.record_node(node("CMPT 125")));
        assert!(!state.record_node(node("MACM 101")));

        let report = state.finish();
        let ids: Vec<_> = report.graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["MACM 101", "CMPT 125"]);
    }

    #[test]
    fn test_links_not_deduplicated() {
        let mut state = CrawlState::new();
        state.record_link(PrereqLink::new("A 100", "B 200"));
        state.record_link(PrereqLink::new("A 100", "B 200"));
        assert_eq!(state.finish().graph.links.len(), 2);
    }

    #[test]
    fn test_report_serializes_flat() {
        let mut state = CrawlState::new();
        state.record_node(node("CMPT 225"));
        state.record_skip("CMPT 130", 1, SkipReason::NotFound);
        let json = serde_json::to_value(state.finish()).unwrap();
        assert!(json["nodes"].is_array());
        assert!(json["links"].is_array());
        assert_eq!(json["diagnostics"][0]["reason"]["kind"], "not_found");
    }
}
