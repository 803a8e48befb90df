//! Assignee detection — who an action item belongs to.

use std::sync::LazyLock;

use regex::Regex;

/// Capitalized words that start sentences without naming a person.
const STOP_WORDS: &[&str] = &[
    "a", "all", "also", "and", "anyone", "as", "but", "can", "could", "everyone", "everybody",
    "finally", "first", "folks", "guys", "he", "hello", "hey", "hi", "however", "i", "if", "it",
    "let", "maybe", "meanwhile", "next", "no", "nobody", "now", "ok", "okay", "overall", "please",
    "she", "so", "somebody", "someone", "team", "thanks", "that", "the", "then", "there", "these",
    "they", "this", "those", "today", "tomorrow", "we", "what", "when", "who", "yes", "you",
    // Sentence adverbs and ordinals.
    "additionally", "afterwards", "again", "besides", "consequently", "further", "furthermore",
    "hence", "instead", "lastly", "later", "likewise", "moreover", "otherwise", "plus",
    "regardless", "second", "secondly", "separately", "similarly", "still", "third", "thirdly",
    "thus", "tonight", "yesterday", "firstly", "ideally", "importantly", "honestly", "anyway",
    // Calendar words.
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "january",
    "february", "march", "april", "may", "june", "july", "august", "september", "october",
    "november", "december", "weekend",
    // Groups of people.
    "clients", "customers", "developers", "employees", "engineers", "managers", "members",
    "partners", "people", "stakeholders", "staff", "students", "users", "vendors", "teams",
];

/// "Bob will ...", "Sarah Chen needs to ...".
static OWNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Z][a-z]+(?:\s[A-Z][a-z]+)?)\s+(?:will|to|should|needs\s+to|need\s+to|must|has\s+to|is\s+going\s+to|can)\s+(.+)$",
    )
    .expect("owner pattern must compile")
});

/// "I'll ...", "I will ...", "I need to ...".
static SELF_OWNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^i(?:['\u{2019}]ll|\s+will|['\u{2019}]m\s+going\s+to|\s+am\s+going\s+to|\s+can|\s+need\s+to|\s+should)\s+(.+)$",
    )
    .expect("self owner pattern must compile")
});

/// "Bob, please ..." / "Bob, can you ...".
static ADDRESSEE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][a-z]+),\s*(.+)$").expect("addressee pattern must compile")
});

static ASSIGNED_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bassign(?:ed)?\s+(?:this\s+|it\s+)?to\s+@?([A-Za-z][\w.-]*)")
        .expect("assignment pattern must compile")
});

static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)@([A-Za-z][\w.-]*)").expect("mention pattern must compile")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[\w.+-]+@[\w-]+(?:\.[\w-]+)+\b").expect("email pattern must compile")
});

/// Who an action sentence names as its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Owner {
    /// A named person ("Bob will ...", "Bob, please ...").
    Named(String),
    /// The person speaking or writing ("I'll ...").
    Speaker,
}

/// Whether every word of `name` could be part of a person's name.
fn is_name(name: &str) -> bool {
    name.split_whitespace()
        .all(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
}

/// Split a leading non-name word and comma ("Additionally, ", "Friday, ")
/// off a sentence.
pub(crate) fn take_connective(text: &str) -> Option<&str> {
    let caps = ADDRESSEE.captures(text)?;
    if is_name(caps.get(1)?.as_str()) {
        return None;
    }
    Some(caps.get(2)?.as_str())
}

/// Split a leading "Name, " address off a sentence.
pub(crate) fn take_addressee(text: &str) -> Option<(String, &str)> {
    let caps = ADDRESSEE.captures(text)?;
    let name = caps.get(1)?.as_str();
    if !is_name(name) {
        return None;
    }
    Some((name.to_string(), caps.get(2)?.as_str()))
}

/// Split a leading owner clause off a sentence, returning the owner and
/// the action that follows.
pub(crate) fn take_owner(text: &str) -> Option<(Owner, &str)> {
    if let Some(caps) = SELF_OWNER.captures(text) {
        return Some((Owner::Speaker, caps.get(1)?.as_str()));
    }
    let caps = OWNER.captures(text)?;
    let name = caps.get(1)?.as_str();
    if !is_name(name) {
        return None;
    }
    Some((Owner::Named(name.to_string()), caps.get(2)?.as_str()))
}

fn trim_handle(handle: &str) -> String {
    handle.trim_end_matches(['.', '-']).to_string()
}

/// Resolve the assignee of an action item.
///
/// An owner named in the sentence wins. After that come explicit
/// assignment, @mentions and email addresses in `text`. "I'll" items go
/// to the transcript speaker, else the sender.
pub(crate) fn resolve(
    text: &str,
    owner: Option<&Owner>,
    speaker: Option<&str>,
    sender: Option<&str>,
) -> Option<String> {
    match owner {
        Some(Owner::Named(name)) => return Some(name.clone()),
        Some(Owner::Speaker) => return speaker.or(sender).map(str::to_string),
        None => {}
    }

    if let Some(caps) = ASSIGNED_TO.captures(text)
        && let Some(m) = caps.get(1)
        && is_name(m.as_str())
        && m.as_str() != "me"
    {
        return Some(trim_handle(m.as_str()));
    }
    if let Some(m) = MENTION.captures(text).and_then(|c| c.get(1)) {
        return Some(trim_handle(m.as_str()));
    }
    EMAIL.find(text).map(|m| m.as_str().to_string())
}
