// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page references in user messages ("explain page 12").

use std::sync::LazyLock;

use regex::Regex;

static PAGE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"page\s+(\d+)").ok());

/// Page label referenced by `message`, if any.
///
/// Matching is case-insensitive and takes the first `page <digits>`
/// occurrence. The digits are returned exactly as written, so `page 007`
/// filters on the label `"007"`.
pub fn extract_page_filter(message: &str) -> Option<String> {
    let pattern = PAGE_PATTERN.as_ref()?;
    let lower = message.to_lowercase();
    let captures = pattern.captures(&lower)?;
    Some(captures.get(1)?.as_str().to_string())
}
