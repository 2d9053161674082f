// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use coursegraph::course::CourseRef;
use coursegraph::extract::llm::decode_reply;
use coursegraph::extract::PatternExtractor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for code in PatternExtractor::new().scan(text).iter().chain(&decode_reply(text)) {
        assert!(CourseRef::parse(code).is_some());
    }
});
