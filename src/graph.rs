// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph analysis and export for built prerequisite graphs

use crate::types::{CourseGraph, CourseNode};
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Whether a tree entry could be expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEntryKind {
    /// A course with a node; its prerequisites follow
    Course,
    /// A course already shown higher up the tree
    Repeated,
    /// Referenced by a link but never resolved to a node
    Unresolved,
}

/// One line of a rendered prerequisite tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Box-drawing prefix (empty for the root)
    pub prefix: String,
    /// Canonical course id
    pub id: String,
    /// Course title when known
    pub title: Option<String>,
    /// What kind of entry this is
    pub kind: TreeEntryKind,
}

/// A built graph with petgraph backing for algorithms
pub struct PrereqGraph {
    /// The underlying directed graph; edges point prerequisite -> dependent
    graph: DiGraph<String, ()>,
    /// The graph as produced by the builder
    pub courses: CourseGraph,
}

impl PrereqGraph {
    /// Index a built graph. Link endpoints without a node become
    /// unresolved vertices.
    #[must_use]
    pub fn new(courses: CourseGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices: HashMap<String, NodeIndex> = HashMap::new();

        for node in &courses.nodes {
            let idx = graph.add_node(node.id.clone());
            node_indices.insert(node.id.clone(), idx);
        }

        for link in &courses.links {
            let from = *node_indices
                .entry(link.source.clone())
                .or_insert_with(|| graph.add_node(link.source.clone()));
            let to = *node_indices
                .entry(link.target.clone())
                .or_insert_with(|| graph.add_node(link.target.clone()));
            graph.add_edge(from, to, ());
        }

        Self { graph, courses }
    }

    /// Ids referenced by links that have no node, in first-seen order
    #[must_use]
    pub fn unresolved_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.courses
            .links
            .iter()
            .flat_map(|l| [l.source.as_str(), l.target.as_str()])
            .filter(|id| !self.courses.contains_node(id) && seen.insert(*id))
            .collect()
    }

    /// Direct prerequisites of `id`, in link order without repeats
    #[must_use]
    pub fn prerequisites_of(&self, id: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.courses
            .links
            .iter()
            .filter(|l| l.target == id && seen.insert(l.source.as_str()))
            .map(|l| l.source.as_str())
            .collect()
    }

    /// True when some course transitively requires itself
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Courses ordered so every prerequisite precedes the courses that
    /// require it. `None` when the graph has a cycle.
    #[must_use]
    pub fn study_order(&self) -> Option<Vec<&str>> {
        toposort(&self.graph, None)
            .ok()
            .map(|order| order.into_iter().map(|idx| self.graph[idx].as_str()).collect())
    }

    /// Prerequisite tree rooted at `root`, depth-first in link order
    #[must_use]
    pub fn tree(&self, root: &str) -> Vec<TreeEntry> {
        let mut entries = Vec::new();
        let mut shown = HashSet::new();
        self.push_tree(root, String::new(), String::new(), &mut shown, &mut entries);
        entries
    }

    fn push_tree(
        &self,
        id: &str,
        prefix: String,
        child_prefix: String,
        shown: &mut HashSet<String>,
        entries: &mut Vec<TreeEntry>,
    ) {
        let node = self.courses.node(id);
        let kind = match node {
            None => TreeEntryKind::Unresolved,
            Some(_) if shown.contains(id) => TreeEntryKind::Repeated,
            Some(_) => TreeEntryKind::Course,
        };
        entries.push(TreeEntry {
            prefix,
            id: id.to_string(),
            title: node.map(|n: &CourseNode| n.title.clone()),
            kind,
        });
        if kind != TreeEntryKind::Course {
            return;
        }
        shown.insert(id.to_string());

        let children = self.prerequisites_of(id);
        let last = children.len().saturating_sub(1);
        for (i, child) in children.into_iter().enumerate() {
            let (branch, next) = if i == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            self.push_tree(
                child,
                format!("{child_prefix}{branch}"),
                format!("{child_prefix}{next}"),
                shown,
                entries,
            );
        }
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph prerequisites {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for node in &self.courses.nodes {
            let label = format!("{}\\n{}", node.id, escape(&node.title));
            dot.push_str(&format!("  \"{}\" [label=\"{}\"];\n", node.id, label));
        }
        for id in self.unresolved_ids() {
            dot.push_str(&format!("  \"{id}\" [style=dashed];\n"));
        }

        dot.push('\n');

        for link in &self.courses.links {
            dot.push_str(&format!("  \"{}\" -> \"{}\";\n", link.source, link.target));
        }

        dot.push_str("}\n");
        dot
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
