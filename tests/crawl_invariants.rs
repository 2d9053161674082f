// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for the prerequisite crawler
//!
//! These tests verify the crawl guarantees:
//! 1. Branch failures prune only their branch
//! 2. Depth and cycle bounds always terminate the build
//! 3. Nodes are unique, links are recorded before recursion
//! 4. Denylist, suffix, and fallback policies behave as configured

use async_trait::async_trait;
use coursegraph::builder::{DenylistPolicy, GraphBuilder, SkipReason};
use coursegraph::catalog::{CatalogError, CourseCatalog, StaticCatalog};
use coursegraph::config::CrawlConfig;
use coursegraph::course::{CatalogQuery, SuffixPolicy};
use coursegraph::extract::{ExtractError, LlmExtractor, PatternExtractor, PrereqExtractor, TextGenerator};
use coursegraph::types::{CourseRecord, PrereqLink};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// =============================================================================
// Test Helpers
// =============================================================================

fn record(id: &str, title: &str, prerequisites: &str) -> CourseRecord {
    let (dept, number) = id.split_once(' ').unwrap();
    CourseRecord {
        dept: dept.into(),
        number: number.into(),
        title: title.into(),
        prerequisites: Some(prerequisites.into()),
    }
}

/// Catalog that serves fixed records, fails chosen lookups, and logs calls
#[derive(Default)]
struct MockCatalog {
    records: HashMap<String, CourseRecord>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockCatalog {
    fn with(records: Vec<CourseRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (format!("{} {}", r.dept, r.number), r))
                .collect(),
            ..Self::default()
        }
    }

    fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.into());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CourseCatalog for MockCatalog {
    async fn lookup(&self, query: &CatalogQuery) -> Result<Vec<CourseRecord>, CatalogError> {
        let key = format!("{} {}", query.dept, query.number);
        self.calls.lock().unwrap().push(key.clone());
        if self.failing.contains(&key) {
            return Err(CatalogError::Status(500));
        }
        Ok(self.records.get(&key).cloned().into_iter().collect())
    }
}

/// Catalog where course N always requires course N+1
struct EndlessCatalog;

#[async_trait]
impl CourseCatalog for EndlessCatalog {
    async fn lookup(&self, query: &CatalogQuery) -> Result<Vec<CourseRecord>, CatalogError> {
        let n: u32 = query.number.parse().unwrap();
        Ok(vec![record(
            &format!("LOOP {n}"),
            "Endless",
            &format!("LOOP {}", n + 1),
        )])
    }
}

struct BrokenExtractor;

#[async_trait]
impl PrereqExtractor for BrokenExtractor {
    async fn extract(&self, _text: &str) -> Result<Vec<String>, ExtractError> {
        Err(ExtractError::Status(502))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

fn options() -> CrawlConfig {
    CrawlConfig::default()
}

fn builder(catalog: Arc<dyn CourseCatalog>, options: CrawlConfig) -> GraphBuilder {
    GraphBuilder::new(catalog, Arc::new(PatternExtractor::new()), options)
}

fn ids(nodes: &[coursegraph::types::CourseNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.id.as_str()).collect()
}

fn cmpt_225_catalog() -> MockCatalog {
    MockCatalog::with(vec![
        record(
            "CMPT 225",
            "Data Structures and Programming",
            "CMPT 125 or CMPT 130, and MACM 101, all with a minimum grade of C-.",
        ),
        record("CMPT 125", "Introduction to Computing Science and Programming II", ""),
        record("MACM 101", "Discrete Mathematics I", ""),
    ])
    .failing("CMPT 130")
}

// =============================================================================
// End-to-end Scenario
// =============================================================================

#[tokio::test]
async fn test_cmpt_225_with_failed_branch() {
    let catalog = Arc::new(cmpt_225_catalog());
    let graph = builder(catalog.clone(), options()).build("CMPT 225").await;

    assert_eq!(ids(&graph.nodes), vec!["CMPT 225", "CMPT 125", "MACM 101"]);
    assert_eq!(
        graph.links,
        vec![
            PrereqLink::new("CMPT 125", "CMPT 225"),
            PrereqLink::new("CMPT 130", "CMPT 225"),
            PrereqLink::new("MACM 101", "CMPT 225"),
        ]
    );
    assert_eq!(graph.dangling_links().len(), 1);

    // depth-first, left to right, one lookup per course
    assert_eq!(catalog.calls(), vec!["CMPT 225", "CMPT 125", "CMPT 130", "MACM 101"]);
}

#[tokio::test]
async fn test_node_fields_come_from_record() {
    let catalog = Arc::new(MockCatalog::with(vec![record("CMPT 120", "Intro", "")]));
    let graph = builder(catalog, options()).build("cmpt120").await;

    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].id, "CMPT 120");
    assert_eq!(graph.nodes[0].title, "Intro");
    assert_eq!(graph.nodes[0].dept, "CMPT");
    assert_eq!(graph.nodes[0].number, "120");
}

#[tokio::test]
async fn test_diagnostics_name_pruned_branches() {
    let catalog = Arc::new(cmpt_225_catalog());
    let report = builder(catalog, options()).build_with_report("CMPT 225").await;

    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].course, "CMPT 130");
    assert_eq!(report.diagnostics[0].depth, 1);
    assert!(matches!(report.diagnostics[0].reason, SkipReason::LookupFailed(_)));
}

// =============================================================================
// Determinism
// =============================================================================

#[tokio::test]
async fn test_build_is_idempotent() {
    let catalog: Arc<dyn CourseCatalog> = Arc::new(cmpt_225_catalog());
    let builder = builder(catalog, options());

    let first = builder.build("CMPT 225").await;
    let second = builder.build("CMPT 225").await;

    let nodes = |g: &coursegraph::types::CourseGraph| g.nodes.iter().cloned().collect::<HashSet<_>>();
    let links = |g: &coursegraph::types::CourseGraph| g.links.iter().cloned().collect::<HashSet<_>>();
    assert_eq!(nodes(&first), nodes(&second));
    assert_eq!(links(&first), links(&second));
}

// =============================================================================
// Bounds
// =============================================================================

#[tokio::test]
async fn test_depth_bound_terminates_endless_chain() {
    let report = builder(Arc::new(EndlessCatalog), options())
        .build_with_report("LOOP 0")
        .await;

    // depths 0..=5 are expanded
    assert_eq!(
        ids(&report.graph.nodes),
        vec!["LOOP 0", "LOOP 1", "LOOP 2", "LOOP 3", "LOOP 4", "LOOP 5"]
    );
    assert_eq!(report.graph.links.len(), 6);
    assert_eq!(report.graph.links[5], PrereqLink::new("LOOP 6", "LOOP 5"));

    // no link is recorded by a branch deeper than the ceiling
    assert!(report.graph.links.iter().all(|l| l.target != "LOOP 6"));
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].reason, SkipReason::DepthExceeded);
    assert_eq!(report.diagnostics[0].depth, 6);
}

#[tokio::test]
async fn test_configured_depth_ceiling() {
    let options = CrawlConfig {
        max_depth: 1,
        ..options()
    };
    let graph = builder(Arc::new(EndlessCatalog), options).build("LOOP 0").await;

    assert_eq!(ids(&graph.nodes), vec!["LOOP 0", "LOOP 1"]);
    assert_eq!(
        graph.links,
        vec![PrereqLink::new("LOOP 1", "LOOP 0"), PrereqLink::new("LOOP 2", "LOOP 1")]
    );
}

#[tokio::test]
async fn test_two_course_cycle() {
    let catalog = Arc::new(MockCatalog::with(vec![
        record("AAA 100", "A", "AAA 200"),
        record("AAA 200", "B", "AAA 100"),
    ]));
    let graph = builder(catalog.clone(), options()).build("AAA 100").await;

    assert_eq!(ids(&graph.nodes), vec!["AAA 100", "AAA 200"]);
    assert_eq!(
        graph.links,
        vec![PrereqLink::new("AAA 200", "AAA 100"), PrereqLink::new("AAA 100", "AAA 200")]
    );
    assert_eq!(catalog.calls().len(), 2);
}

#[tokio::test]
async fn test_diamond_is_expanded_once() {
    let catalog = Arc::new(MockCatalog::with(vec![
        record("TOP 400", "Top", "LEFT 300 and RIGHT 300"),
        record("LEFT 300", "Left", "BASE 100"),
        record("RIGHT 300", "Right", "BASE 100"),
        record("BASE 100", "Base", ""),
    ]));
    let graph = builder(catalog.clone(), options()).build("TOP 400").await;

    assert_eq!(ids(&graph.nodes), vec!["TOP 400", "LEFT 300", "BASE 100", "RIGHT 300"]);
    assert_eq!(graph.links.len(), 4);
    assert!(graph.links.contains(&PrereqLink::new("BASE 100", "RIGHT 300")));
    assert_eq!(catalog.calls().iter().filter(|c| *c == "BASE 100").count(), 1);
}

// =============================================================================
// Upstream Failures
// =============================================================================

#[tokio::test]
async fn test_extractor_failure_prunes_branch() {
    let catalog: Arc<dyn CourseCatalog> = Arc::new(cmpt_225_catalog());
    let builder = GraphBuilder::new(catalog, Arc::new(BrokenExtractor), options());
    let report = builder.build_with_report("CMPT 225").await;

    assert_eq!(ids(&report.graph.nodes), vec!["CMPT 225"]);
    assert!(report.graph.links.is_empty());
    assert!(matches!(report.diagnostics[0].reason, SkipReason::ExtractFailed(_)));
}

/// Extractor that returns the same candidates for any text
struct FixedExtractor(Vec<&'static str>);

#[async_trait]
impl PrereqExtractor for FixedExtractor {
    async fn extract(&self, _text: &str) -> Result<Vec<String>, ExtractError> {
        Ok(self.0.iter().map(ToString::to_string).collect())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[tokio::test]
async fn test_unparseable_candidates_skipped_individually() {
    let catalog: Arc<dyn CourseCatalog> = Arc::new(MockCatalog::with(vec![
        record("CMPT 225", "Data Structures", "see calendar"),
        record("CMPT 125", "Intro II", ""),
        record("MACM 101", "Discrete Mathematics I", ""),
    ]));
    let extractor = Arc::new(FixedExtractor(vec!["???", "CMPT 125", "", "MACM 101"]));
    let report = GraphBuilder::new(catalog, extractor, options())
        .build_with_report("CMPT 225")
        .await;

    assert_eq!(ids(&report.graph.nodes), vec!["CMPT 225", "CMPT 125", "MACM 101"]);
    assert_eq!(
        report.graph.links,
        vec![PrereqLink::new("CMPT 125", "CMPT 225"), PrereqLink::new("MACM 101", "CMPT 225")]
    );

    let unparseable: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.reason == SkipReason::Unparseable)
        .collect();
    assert_eq!(unparseable.len(), 2);
    assert!(unparseable.iter().all(|d| d.depth == 1));
    assert_eq!(unparseable[0].course, "???");
    assert_eq!(unparseable[1].course, "");
}

#[tokio::test]
async fn test_unparseable_start_yields_empty_graph() {
    let catalog = Arc::new(MockCatalog::default());
    let graph = builder(catalog.clone(), options()).build("12345").await;

    assert!(graph.is_empty());
    assert!(graph.links.is_empty());
    assert!(catalog.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_start_course() {
    let catalog = Arc::new(MockCatalog::default());
    let report = builder(catalog.clone(), options()).build_with_report("ZZZZ 999").await;

    assert!(report.graph.is_empty());
    // crawl lookup plus the fallback lookup
    assert_eq!(catalog.calls(), vec!["ZZZZ 999", "ZZZZ 999"]);
    assert!(report.diagnostics.iter().all(|d| d.reason == SkipReason::NotFound));
}

// =============================================================================
// Policies
// =============================================================================

fn systems_catalog() -> MockCatalog {
    MockCatalog::with(vec![
        record("CMPT 201", "Systems Programming", "CMPT 300 or CMPT 225"),
        record("CMPT 300", "Operating Systems I", "CMPT 225"),
        record("CMPT 225", "Data Structures and Programming", ""),
    ])
}

#[tokio::test]
async fn test_denylist_skip_keeps_dangling_link() {
    let catalog = Arc::new(systems_catalog());
    let graph = builder(catalog.clone(), options()).build("CMPT 201").await;

    assert_eq!(ids(&graph.nodes), vec!["CMPT 201", "CMPT 225"]);
    assert_eq!(
        graph.links,
        vec![PrereqLink::new("CMPT 300", "CMPT 201"), PrereqLink::new("CMPT 225", "CMPT 201")]
    );
    assert!(!catalog.calls().contains(&"CMPT 300".to_string()));
}

#[tokio::test]
async fn test_denylist_prune_drops_link() {
    let options = CrawlConfig {
        denylist_policy: DenylistPolicy::Prune,
        ..options()
    };
    let graph = builder(Arc::new(systems_catalog()), options).build("CMPT 201").await;

    assert_eq!(ids(&graph.nodes), vec!["CMPT 201", "CMPT 225"]);
    assert_eq!(graph.links, vec![PrereqLink::new("CMPT 225", "CMPT 201")]);
}

#[tokio::test]
async fn test_denylisted_start_course() {
    let catalog = Arc::new(systems_catalog());
    let graph = builder(catalog.clone(), options()).build("CMPT 300").await;

    assert!(graph.is_empty());
    assert!(catalog.calls().is_empty(), "fallback must respect the denylist");
}

#[tokio::test]
async fn test_empty_denylist_expands_everything() {
    let options = CrawlConfig {
        denylist: vec![],
        ..options()
    };
    let graph = builder(Arc::new(systems_catalog()), options).build("CMPT 201").await;
    assert_eq!(ids(&graph.nodes), vec!["CMPT 201", "CMPT 300", "CMPT 225"]);
}

#[tokio::test]
async fn test_suffix_policy_keep() {
    let catalog = Arc::new(MockCatalog::with(vec![
        record("CMPT 376W", "Technical Writing", "CMPT 105W"),
        record("CMPT 105W", "Social Issues", ""),
    ]));
    let graph = builder(catalog.clone(), options()).build("CMPT 376W").await;

    assert_eq!(ids(&graph.nodes), vec!["CMPT 376W", "CMPT 105W"]);
    assert_eq!(graph.links, vec![PrereqLink::new("CMPT 105W", "CMPT 376W")]);
    assert_eq!(catalog.calls(), vec!["CMPT 376W", "CMPT 105W"]);
}

#[tokio::test]
async fn test_suffix_policy_drop() {
    let catalog = Arc::new(MockCatalog::with(vec![
        record("CMPT 376", "Technical Writing", "CMPT 105W"),
        record("CMPT 105", "Social Issues", ""),
    ]));
    let options = CrawlConfig {
        suffix_policy: SuffixPolicy::Drop,
        ..options()
    };
    let graph = builder(catalog.clone(), options).build("CMPT 376W").await;

    assert_eq!(ids(&graph.nodes), vec!["CMPT 376", "CMPT 105"]);
    assert_eq!(graph.links, vec![PrereqLink::new("CMPT 105", "CMPT 376")]);
    assert_eq!(catalog.calls(), vec!["CMPT 376", "CMPT 105"]);
}

#[tokio::test]
async fn test_fallback_single_node() {
    let catalog = Arc::new(MockCatalog::with(vec![record("CMPT 120", "Intro", "")]));
    let graph = builder(catalog, options()).build("CMPT 120").await;

    assert_eq!(ids(&graph.nodes), vec!["CMPT 120"]);
    assert!(graph.links.is_empty());
}

/// Catalog that fails the first lookup of each course and succeeds after
struct FlakyCatalog {
    inner: MockCatalog,
    seen: Mutex<HashSet<String>>,
}

#[async_trait]
impl CourseCatalog for FlakyCatalog {
    async fn lookup(&self, query: &CatalogQuery) -> Result<Vec<CourseRecord>, CatalogError> {
        let key = format!("{} {}", query.dept, query.number);
        if self.seen.lock().unwrap().insert(key) {
            return Err(CatalogError::Status(503));
        }
        self.inner.lookup(query).await
    }
}

#[tokio::test]
async fn test_fallback_lookup_after_failed_crawl() {
    let flaky = || FlakyCatalog {
        inner: MockCatalog::with(vec![record("CMPT 225", "Data Structures", "CMPT 125")]),
        seen: Mutex::new(HashSet::new()),
    };

    let graph = builder(Arc::new(flaky()), options()).build("CMPT 225").await;
    assert_eq!(ids(&graph.nodes), vec!["CMPT 225"]);
    assert!(graph.links.is_empty(), "fallback adds the start course alone");

    let disabled = CrawlConfig {
        fallback_lookup: false,
        ..options()
    };
    let graph = builder(Arc::new(flaky()), disabled).build("CMPT 225").await;
    assert!(graph.is_empty());
}

// =============================================================================
// Strategies
// =============================================================================

struct FencedModel;

#[async_trait]
impl TextGenerator for FencedModel {
    async fn generate(&self, prompt: &str) -> Result<String, ExtractError> {
        if prompt.ends_with("MATH 12 with B") {
            Ok("```json\n[\"CMPT 125\", \"MATH 12\"]\n```".into())
        } else {
            Ok("no courses here".into())
        }
    }
}

#[tokio::test]
async fn test_llm_strategy_drives_crawl() {
    let catalog: Arc<dyn CourseCatalog> = Arc::new(MockCatalog::with(vec![
        record("CMPT 225", "Data Structures", "CMPT 125 or MATH 12 with B"),
        record("CMPT 125", "Intro II", "Whatever the model says"),
    ]));
    let extractor = Arc::new(LlmExtractor::new(Arc::new(FencedModel)));
    let graph = GraphBuilder::new(catalog, extractor, options()).build("CMPT 225").await;

    assert_eq!(ids(&graph.nodes), vec!["CMPT 225", "CMPT 125"]);
    assert_eq!(graph.links, vec![PrereqLink::new("CMPT 125", "CMPT 225")]);
}

#[tokio::test]
async fn test_static_catalog_crawl() {
    let catalog = StaticCatalog::from_json(
        r#"[
            {"dept": "MACM", "number": "201", "title": "Discrete Mathematics II", "prerequisites": "MACM 101"},
            {"dept": "MACM", "number": "101", "title": "Discrete Mathematics I", "prerequisites": "BC Math 12 or MATH 100"},
            {"dept": "MATH", "number": "100", "title": "Precalculus", "prerequisites": null}
        ]"#,
    )
    .unwrap();
    let graph = builder(Arc::new(catalog), options()).build("MACM 201").await;

    assert_eq!(ids(&graph.nodes), vec!["MACM 201", "MACM 101", "MATH 100"]);
    assert_eq!(
        graph.links,
        vec![PrereqLink::new("MACM 101", "MACM 201"), PrereqLink::new("MATH 100", "MACM 101")]
    );
}
