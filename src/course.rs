// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Course code parsing and canonical ids

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static COURSE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z]+)\s*([0-9]+)([A-Za-z]*)").expect("course code pattern compiles")
});

/// Whether the trailing suffix letters take part in a course's identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixPolicy {
    /// "CMPT 105W" and "CMPT 105" are different courses
    #[default]
    Keep,
    /// The suffix is dropped from ids and catalog queries
    Drop,
}

/// Normalized identity of a course
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseRef {
    /// Uppercase alphabetic department code
    pub department: String,
    /// Digit string, preserved as written
    pub number: String,
    /// Uppercase trailing letters, possibly empty
    pub suffix: String,
}

/// Department and number as sent to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Department code
    pub dept: String,
    /// Number, including the suffix under [`SuffixPolicy::Keep`]
    pub number: String,
}

impl CourseRef {
    /// Parse the first department/number pair found in `text`.
    ///
    /// Returns `None` when the text holds no letters-then-digits run, which
    /// callers treat as "skip", never as a failure.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let caps = COURSE_CODE.captures(text.trim())?;
        Some(Self {
            department: caps[1].to_ascii_uppercase(),
            number: caps[2].to_string(),
            suffix: caps[3].to_ascii_uppercase(),
        })
    }

    /// Canonical id under the given suffix policy
    #[must_use]
    pub fn canonical(&self, policy: SuffixPolicy) -> String {
        format!("{} {}", self.department, self.number_with(policy))
    }

    /// Catalog query parameters under the given suffix policy
    #[must_use]
    pub fn query(&self, policy: SuffixPolicy) -> CatalogQuery {
        CatalogQuery {
            dept: self.department.clone(),
            number: self.number_with(policy),
        }
    }

    fn number_with(&self, policy: SuffixPolicy) -> String {
        match policy {
            SuffixPolicy::Keep => format!("{}{}", self.number, self.suffix),
            SuffixPolicy::Drop => self.number.clone(),
        }
    }
}

impl fmt::Display for CourseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.department, self.number, self.suffix)
    }
}

/// Canonical id for a catalog record's own department and number fields.
///
/// Records whose fields do not form a course code fall back to a plain
/// uppercase join so the node is still recorded.
#[must_use]
pub fn record_id(dept: &str, number: &str, policy: SuffixPolicy) -> String {
    let joined = format!("{} {}", dept.trim(), number.trim());
    CourseRef::parse(&joined).map_or_else(|| joined.to_ascii_uppercase(), |c| c.canonical(policy))
}
