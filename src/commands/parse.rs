// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Parse command - shows how a string normalizes to a course id

use crate::course::{CourseRef, SuffixPolicy};
use anyhow::Result;
use owo_colors::OwoColorize;
use serde_json::json;

/// Run the parse command
pub fn run(text: &str, policy: SuffixPolicy, as_json: bool, color: bool) -> Result<()> {
    let course = CourseRef::parse(text)
        .ok_or_else(|| anyhow::anyhow!("No course code found in {:?}", text))?;
    let id = course.canonical(policy);

    if as_json {
        let value = json!({
            "id": id,
            "department": course.department,
            "number": course.number,
            "suffix": course.suffix,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if color {
        println!("{}", id.bold());
    } else {
        println!("{id}");
    }
    println!("  department: {}", course.department);
    println!("  number:     {}", course.number);
    if !course.suffix.is_empty() {
        println!("  suffix:     {}", course.suffix);
    }
    Ok(())
}
