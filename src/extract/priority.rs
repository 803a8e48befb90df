//! Priority inference from urgency language.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ExtractorConfig;
use crate::tasks::model::Priority;

/// Urgency adverbs that qualify an action without being part of it.
static URGENCY_ADVERBS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i),?\s*\b(?:asap|as soon as possible|urgently|immediately|right away|if possible|when you can|when you have time|when you get a chance|whenever you can|no rush)\b",
    )
    .expect("urgency pattern must compile")
});

/// Whether `phrase` occurs in `haystack` on word boundaries.
///
/// Both sides are expected lowercase.
pub(crate) fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn any_phrase(haystack: &str, phrases: &[String]) -> bool {
    phrases
        .iter()
        .any(|p| contains_phrase(haystack, &p.to_lowercase()))
}

/// Priority implied by `text`.
///
/// Checked critical first, then low (so "low priority" beats the bare
/// "priority" in the high list), then high. No urgency language means
/// medium.
pub fn infer_priority(text: &str, config: &ExtractorConfig) -> Priority {
    let lower = text.to_lowercase();
    if any_phrase(&lower, &config.critical_words) {
        Priority::Critical
    } else if any_phrase(&lower, &config.low_words) {
        Priority::Low
    } else if any_phrase(&lower, &config.high_words) {
        Priority::High
    } else {
        Priority::Medium
    }
}

/// Drop urgency adverbs ("asap", "right away") from a title.
pub(crate) fn strip_urgency(text: &str) -> String {
    URGENCY_ADVERBS.replace_all(text, "").into_owned()
}
