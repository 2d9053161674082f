// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Coursegraph library - recursive course prerequisite graphs
//!
//! This crate resolves a university course's prerequisite chain into a
//! directed graph by crawling a course catalog, extracting prerequisite
//! course codes from free text, and recursing under depth and visitation
//! bounds.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod course;
pub mod extract;
pub mod graph;
pub mod server;

/// Core data types exchanged between the crawler and its consumers
pub mod types {
    use serde::{Deserialize, Deserializer, Serialize};
    use std::collections::HashSet;

    // =========================================================================
    // Catalog Records
    // =========================================================================

    /// One entry returned by the course catalog
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CourseRecord {
        /// Department code as reported by the catalog
        pub dept: String,
        /// Course number as reported by the catalog (may carry a suffix)
        pub number: String,
        /// Human-readable title
        #[serde(default, deserialize_with = "null_as_empty")]
        pub title: String,
        /// Free-text prerequisite description
        #[serde(default)]
        pub prerequisites: Option<String>,
    }

    impl CourseRecord {
        /// Prerequisite text, if present and not blank
        #[must_use]
        pub fn prerequisite_text(&self) -> Option<&str> {
            self.prerequisites
                .as_deref()
                .filter(|text| !text.trim().is_empty())
        }
    }

    fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }

    // =========================================================================
    // Graph Output
    // =========================================================================

    /// A course vertex in the prerequisite graph
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CourseNode {
        /// Canonical course id, unique per graph
        pub id: String,
        /// Course title from the catalog record
        pub title: String,
        /// Department copied from the catalog record
        pub dept: String,
        /// Number copied from the catalog record
        pub number: String,
    }

    /// Directed prerequisite relationship: `source` is required by `target`
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PrereqLink {
        /// Id of the prerequisite course
        pub source: String,
        /// Id of the course that requires it
        pub target: String,
    }

    impl PrereqLink {
        /// Create a link from a prerequisite to the course requiring it
        #[must_use]
        pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
            Self {
                source: source.into(),
                target: target.into(),
            }
        }
    }

    /// The assembled graph handed to the presentation layer
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CourseGraph {
        /// Course nodes in crawl insertion order
        #[serde(default)]
        pub nodes: Vec<CourseNode>,
        /// Prerequisite links, possibly referencing ids without a node
        #[serde(default)]
        pub links: Vec<PrereqLink>,
    }

    impl CourseGraph {
        /// Look up a node by canonical id
        #[must_use]
        pub fn node(&self, id: &str) -> Option<&CourseNode> {
            self.nodes.iter().find(|n| n.id == id)
        }

        /// Check whether a node with this id exists
        #[must_use]
        pub fn contains_node(&self, id: &str) -> bool {
            self.node(id).is_some()
        }

        /// True when the crawl produced no nodes at all
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.nodes.is_empty()
        }

        /// Links whose source or target has no corresponding node
        #[must_use]
        pub fn dangling_links(&self) -> Vec<&PrereqLink> {
            let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
            self.links
                .iter()
                .filter(|l| !ids.contains(l.source.as_str()) || !ids.contains(l.target.as_str()))
                .collect()
        }

        /// Copy of the graph with dangling links removed, for renderers that
        /// cannot tolerate unknown endpoints
        #[must_use]
        pub fn without_dangling_links(&self) -> Self {
            let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
            Self {
                nodes: self.nodes.clone(),
                links: self
                    .links
                    .iter()
                    .filter(|l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()))
                    .cloned()
                    .collect(),
            }
        }
    }

}

/// Prelude for common imports
pub mod prelude {
    pub use crate::builder::{BuildReport, GraphBuilder};
    pub use crate::course::{CourseRef, SuffixPolicy};
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
