//! Availability detection heuristic.
//!
//! The monitored page's markup for "available" is unreliable, while the
//! "Unavailable: Category N" marker is the one dependable signal. The rules
//! below therefore run in a fixed order and the first match wins:
//!
//! 1. an explicit unavailability marker for the category beats everything,
//! 2. a category mention with a booking action in its immediate vicinity is
//!    a strong positive,
//! 3. a category mention anywhere, with no unavailability marker and at
//!    least one booking affordance on the page, is a weak last-resort
//!    positive,
//! 4. otherwise the category is simply not on the page.
//!
//! Rule 3 is deliberately the lowest-priority signal; do not promote it.

use regex::{Regex, RegexBuilder};

use crate::models::Availability;

/// Characters of context inspected on each side of a category mention when
/// looking for a nearby booking action (rule 2).
const VICINITY: usize = 120;

/// Evidence snippets are capped so log lines stay readable.
const MAX_EVIDENCE_LEN: usize = 160;

/// What the classifier concluded for one category, with the text snippet
/// that triggered the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: Availability,
    pub evidence: Option<String>,
}

impl Classification {
    fn unknown() -> Self {
        Self {
            status: Availability::Unknown,
            evidence: None,
        }
    }

    fn with_evidence(status: Availability, snippet: &str) -> Self {
        Self {
            status,
            evidence: Some(condense(snippet)),
        }
    }
}

/// Compiled patterns for a single category number.
struct CategoryMatchers {
    unavailable: Regex,
    mention: Regex,
    booking_action: Regex,
    booking_affordance: Regex,
}

impl CategoryMatchers {
    fn new(category: u32) -> Self {
        // Trailing \b keeps category 3 from matching "Category 34".
        let unavailable = case_insensitive(&format!(r"unavailable\s*:\s*category\s+{category}\b"));
        let mention = case_insensitive(&format!(r"category\s+{category}\b"));
        let booking_action = case_insensitive(r"\b(book\s+now|reserve|buy\s+tickets?|book)\b");
        let booking_affordance = case_insensitive(r"\b(reserve|book)\b");

        Self {
            unavailable,
            mention,
            booking_action,
            booking_affordance,
        }
    }
}

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("hard-coded pattern")
}

/// Classify the rendered page text for one category.
///
/// Pure and deterministic: identical input text always yields an identical
/// verdict, so the heuristic can be unit tested without a live page.
pub fn classify(page_text: &str, category: u32) -> Classification {
    // An empty or error page must not fall through to rule 3 and produce a
    // false positive from the absence of an unavailability marker.
    if page_text.trim().is_empty() {
        return Classification::unknown();
    }

    let matchers = CategoryMatchers::new(category);

    // Rule 1: explicit unavailability marker.
    if let Some(found) = matchers.unavailable.find(page_text) {
        let snippet = vicinity(page_text, found.start(), found.end());
        return Classification::with_evidence(Availability::Unavailable, snippet);
    }

    // Rule 2: category mention with a booking action close by.
    for mention in matchers.mention.find_iter(page_text) {
        let snippet = vicinity(page_text, mention.start(), mention.end());
        if matchers.booking_action.is_match(snippet) {
            return Classification::with_evidence(Availability::Available, snippet);
        }
    }

    // Rule 3: category mentioned, no unavailability marker anywhere, and the
    // page shows some booking affordance. Weak signal, kept last on purpose.
    if let Some(mention) = matchers.mention.find(page_text) {
        if matchers.booking_affordance.is_match(page_text) {
            let snippet = vicinity(page_text, mention.start(), mention.end());
            return Classification::with_evidence(Availability::Available, snippet);
        }
    }

    Classification::unknown()
}

/// Slice a window of `VICINITY` characters around a match, clamped to UTF-8
/// boundaries.
fn vicinity(text: &str, start: usize, end: usize) -> &str {
    let mut lo = start.saturating_sub(VICINITY);
    while !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = end.saturating_add(VICINITY).min(text.len());
    while !text.is_char_boundary(hi) {
        hi += 1;
    }
    &text[lo..hi]
}

/// Collapse runs of whitespace and cap the snippet length.
fn condense(snippet: &str) -> String {
    let mut out = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
    if out.len() > MAX_EVIDENCE_LEN {
        let mut cut = MAX_EVIDENCE_LEN;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
    }
    out
}
