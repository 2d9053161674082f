// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use coursegraph::course::{CourseRef, SuffixPolicy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Some(course) = CourseRef::parse(text) {
        for policy in [SuffixPolicy::Keep, SuffixPolicy::Drop] {
            let id = course.canonical(policy);
            let again = CourseRef::parse(&id).expect("canonical id parses");
            assert_eq!(again.canonical(policy), id);
        }
    }
});
