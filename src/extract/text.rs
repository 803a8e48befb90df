//! Text handling for extraction: cleanup, line segmentation, sentence
//! splitting, action detection and title shaping.

use std::sync::LazyLock;

use regex::Regex;

use crate::extract::assignee::{self, Owner};
use crate::extract::dates::strip_date_phrases;
use crate::extract::priority::strip_urgency;

/// Verbs an action item may start with, lowercase.
const ACTION_VERBS: &[&str] = &[
    "add", "analyze", "analyse", "approve", "arrange", "ask", "assign", "audit", "book", "build",
    "buy", "call", "cancel", "check", "clean", "collect", "compile", "complete", "configure",
    "confirm", "contact", "coordinate", "create", "debug", "decide", "define", "deploy", "design",
    "develop", "document", "draft", "email", "ensure", "estimate", "evaluate", "explore",
    "finalize", "finish", "fix", "follow", "gather", "get", "handle", "hire", "implement",
    "improve", "install", "interview", "investigate", "invite", "launch", "migrate", "monitor",
    "move", "notify", "organize", "outline", "pay", "pick", "prepare", "present", "prioritize",
    "publish", "reach", "refactor", "register", "remove", "renew", "reply", "request", "research",
    "reserve", "resolve", "respond", "review", "revise", "rewrite", "rotate", "run", "schedule",
    "send", "set", "setup", "share", "ship", "sign", "start", "submit", "summarize", "sync",
    "test", "track", "train", "translate", "update", "upgrade", "upload", "verify", "write",
];

/// Lead-ins stripped before looking for the verb, lowercase, longest first
/// within each family.
const LEAD_INS: &[&str] = &[
    "action item:",
    "action:",
    "todo:",
    "to do:",
    "to-do:",
    "reminder:",
    "i need you to",
    "we need to",
    "we should",
    "we must",
    "we'll",
    "we will",
    "let's",
    "lets",
    "can you please",
    "could you please",
    "can you",
    "could you",
    "would you",
    "will you",
    "please",
    "kindly",
    "make sure to",
    "make sure you",
    "don't forget to",
    "remember to",
    "be sure to",
    "also,",
    "also",
    "and",
    "then",
    "first,",
    "finally,",
    "next,",
];

/// Clauses that end a title: what follows is commentary.
const TITLE_BREAKS: &[&str] = &[
    " - ",
    " \u{2013} ",
    " \u{2014} ",
    ";",
    " (",
    ", this is",
    ", it's",
    ", it is",
    ", which",
    ", since",
    ", because",
    ", so that",
];

/// Sentence-final words that end in a period without ending the sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "mr", "mrs", "ms", "dr", "jr", "sr", "st", "inc", "approx", "jan",
    "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

/// First words of a colon line that introduces a list rather than
/// naming something ("A few things for this week:").
const LIST_INTRO_WORDS: &[&str] = &[
    "a", "an", "below", "couple", "few", "following", "here", "here's", "just", "quick", "some",
    "the", "these", "this", "today's", "we", "i",
];

/// Nouns that mark a colon line as a list intro wherever they appear.
const LIST_NOUNS: &[&str] = &["bits", "items", "points", "reminders", "stuff", "things"];

/// Labels that look like "Name:" but introduce a field, not a speaker.
const FIELD_LABELS: &[&str] = &[
    "action", "agenda", "attendees", "background", "cc", "context", "date", "deadline", "due",
    "fyi", "goal", "goals", "note", "notes", "owner", "priority", "ps", "re", "reminder", "status",
    "subject", "summary", "to", "todo", "topic", "update", "when", "where",
];

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*\u{2022}+]\s+(?:\[[ xX]?\]\s+)?|\d{1,2}[.)]\s+|\[[ xX]?\]\s+)")
        .expect("bullet pattern must compile")
});

static PROJECT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^project\s*:\s*(.+)$").expect("project heading pattern must compile")
});

static MARKDOWN_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#{1,6}\s+(.+)$").expect("markdown heading pattern must compile")
});

static SPEAKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Za-z'-]*(?:\s[A-Z][A-Za-z'-]*)?)\s*:\s+(.+)$")
        .expect("speaker pattern must compile")
});

// ── Cleanup ─────────────────────────────────────────────────────────

/// Normalize line endings.
pub(crate) fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strip quoted reply text from an email body.
///
/// Removes lines starting with `>`, and everything after an
/// "On ... wrote:" attribution or an "Original Message" separator.
pub fn strip_quoted_text(body: &str) -> String {
    let mut result = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('>') {
            continue;
        }

        // "On Mon, Jan 1, 2026 at 10:00 AM Alice <alice@ex.com> wrote:"
        if trimmed.starts_with("On ") && trimmed.ends_with("wrote:") {
            break;
        }

        if trimmed.starts_with("---") && trimmed.contains("Original Message") {
            break;
        }

        result.push(line);
    }

    while result.last().is_some_and(|l| l.trim().is_empty()) {
        result.pop();
    }

    result.join("\n")
}

// ── Segmentation ────────────────────────────────────────────────────

/// A heading that may name a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Heading {
    pub name: String,
    /// "Action items", "Next steps": labels a list without naming a project.
    pub generic: bool,
    /// Markdown and `Project:` headings hold until the next heading;
    /// a bare "Label:" heading ends at the next prose paragraph.
    pub sticky: bool,
}

/// A run of text sharing heading, speaker and paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub text: String,
    /// Index into the heading list.
    pub heading: Option<usize>,
    pub speaker: Option<String>,
    /// Paragraph id. Context sentences only attach within one paragraph.
    pub block: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Segmented {
    pub headings: Vec<Heading>,
    pub segments: Vec<Segment>,
}

enum Line<'a> {
    Blank,
    Heading { name: &'a str, sticky: bool },
    Bullet(&'a str),
    Speaker { name: &'a str, text: &'a str },
    Prose(&'a str),
}

fn classify_line(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Some(m) = BULLET.find(line) {
        return Line::Bullet(line[m.end()..].trim());
    }
    if let Some(caps) = PROJECT_HEADING.captures(trimmed)
        && let Some(name) = caps.get(1)
    {
        return Line::Heading {
            name: name.as_str().trim(),
            sticky: true,
        };
    }
    if let Some(caps) = MARKDOWN_HEADING.captures(trimmed)
        && let Some(name) = caps.get(1)
    {
        return Line::Heading {
            name: name.as_str().trim().trim_end_matches(':'),
            sticky: true,
        };
    }
    if let Some(label) = trimmed.strip_suffix(':')
        && !label.is_empty()
        && label.split_whitespace().count() <= 6
    {
        return Line::Heading {
            name: label.trim().trim_matches('*'),
            sticky: false,
        };
    }
    if let Some(caps) = SPEAKER.captures(trimmed)
        && let (Some(name), Some(text)) = (caps.get(1), caps.get(2))
        && !FIELD_LABELS.contains(&name.as_str().to_lowercase().as_str())
    {
        return Line::Speaker {
            name: name.as_str(),
            text: text.as_str(),
        };
    }
    Line::Prose(trimmed)
}

fn is_generic_heading(name: &str, generic: &[String]) -> bool {
    let lower = name.to_lowercase();
    let lower = lower.trim_matches(|c: char| !c.is_alphanumeric());
    generic.iter().any(|g| {
        let g = g.to_lowercase();
        lower == g || lower.starts_with(&format!("{g} "))
    })
}

/// Whether a bare "Label:" line reads as a list intro, not a name.
fn is_list_intro(label: &str) -> bool {
    let words: Vec<String> = label
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'').to_lowercase())
        .collect();
    words
        .first()
        .is_some_and(|w| LIST_INTRO_WORDS.contains(&w.as_str()))
        || words.iter().any(|w| LIST_NOUNS.contains(&w.as_str()))
}

/// Split text into segments: one per bullet, one per prose paragraph
/// or speaker turn.
pub(crate) fn segment(text: &str, generic_headings: &[String]) -> Segmented {
    let mut out = Segmented::default();
    let mut heading: Option<usize> = None;
    let mut speaker: Option<String> = None;
    let mut block = 0usize;
    let mut after_blank = false;
    // Prose keeps appending to the last segment while this is set.
    let mut prose_open = false;

    for line in text.lines() {
        let kind = classify_line(line);

        if !matches!(kind, Line::Blank)
            && after_blank
            && matches!(kind, Line::Prose(_) | Line::Speaker { .. })
            && heading.is_some_and(|h| !out.headings[h].sticky)
        {
            heading = None;
        }

        match kind {
            Line::Blank => {
                after_blank = true;
                prose_open = false;
                continue;
            }
            Line::Heading { name, sticky } => {
                out.headings.push(Heading {
                    name: name.to_string(),
                    generic: is_generic_heading(name, generic_headings)
                        || (!sticky && is_list_intro(name)),
                    sticky,
                });
                heading = Some(out.headings.len() - 1);
                speaker = None;
                prose_open = false;
            }
            Line::Bullet(text) => {
                block += 1;
                out.segments.push(Segment {
                    text: text.to_string(),
                    heading,
                    speaker: speaker.clone(),
                    block,
                });
                prose_open = false;
            }
            Line::Speaker { name, text } => {
                block += 1;
                speaker = Some(name.to_string());
                out.segments.push(Segment {
                    text: text.to_string(),
                    heading,
                    speaker: speaker.clone(),
                    block,
                });
                prose_open = true;
            }
            Line::Prose(text) => {
                if prose_open && let Some(last) = out.segments.last_mut() {
                    last.text.push(' ');
                    last.text.push_str(text);
                } else {
                    block += 1;
                    out.segments.push(Segment {
                        text: text.to_string(),
                        heading,
                        speaker: speaker.clone(),
                        block,
                    });
                    prose_open = true;
                }
            }
        }
        after_blank = false;
    }

    out
}

// ── Sentences ───────────────────────────────────────────────────────

/// Whether the period closing `before` belongs to an abbreviation or an
/// initial rather than ending the sentence.
///
/// A lone capital is an initial only when a capitalized word that is not
/// an action verb follows ("J. Smith"), so "plan B. Fix the bug" splits.
fn ends_with_abbreviation(before: &str, after: &str) -> bool {
    let Some(word) = before.split_whitespace().last() else {
        return false;
    };
    let word = word.trim_start_matches(|c: char| !c.is_alphanumeric());
    let next = after
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .unwrap_or("");
    let next_is_capitalized = next.starts_with(|c: char| c.is_uppercase());

    let mut letters = word.chars();
    if let (Some(letter), None) = (letters.next(), letters.next()) {
        return letter.is_uppercase()
            && next_is_capitalized
            && !ACTION_VERBS.contains(&next.to_lowercase().as_str());
    }

    let lower = word.to_lowercase();
    if lower == "etc" {
        return !next_is_capitalized;
    }
    ABBREVIATIONS.contains(&lower.as_str())
}

/// Split at `.`, `!` or `?` followed by whitespace or end of text.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        if chars.peek().is_some_and(|(_, next)| !next.is_whitespace()) {
            continue;
        }
        if ch == '.' && ends_with_abbreviation(&text[start..pos], &text[pos + 1..]) {
            continue;
        }
        let end = pos + ch.len_utf8();
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            out.push(sentence);
        }
        start = end;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

// ── Action detection ────────────────────────────────────────────────

/// An actionable sentence, reduced to the part that starts with the verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Action<'a> {
    pub body: &'a str,
    pub owner: Option<Owner>,
}

/// Strip one lead-in from the front of `text`, if present.
fn strip_lead_in(text: &str) -> Option<&str> {
    let lower = text.to_lowercase();
    LEAD_INS.iter().find_map(|lead| {
        let rest = lower.strip_prefix(lead)?;
        let boundary = lead.ends_with([':', ',']) || rest.starts_with(char::is_whitespace);
        if !boundary {
            return None;
        }
        // Lowercasing can change byte lengths; only trust ASCII prefixes.
        text.get(lead.len()..)
            .filter(|_| text.is_char_boundary(lead.len()) && text[..lead.len()].is_ascii())
            .map(str::trim_start)
    })
}

fn starts_with_verb(text: &str) -> bool {
    let Some(first) = text.split_whitespace().next() else {
        return false;
    };
    if first.ends_with(':') {
        return false;
    }
    let word: String = first
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    ACTION_VERBS.contains(&word.as_str())
}

/// Decide whether `sentence` is an action item.
///
/// Lead-ins ("please", "can you", "Bob,") and owner clauses ("Bob will",
/// "I'll") are peeled off; what remains must start with an action verb.
pub(crate) fn parse_action(sentence: &str) -> Option<Action<'_>> {
    let mut text = sentence.trim();
    let mut owner = None;

    // A handful of passes covers "Also, Bob, can you please ...".
    for _ in 0..5 {
        if let Some(rest) = strip_lead_in(text) {
            text = rest;
            continue;
        }
        // "Upgrade to v2" is an action, not an owner named Upgrade.
        if starts_with_verb(text) {
            break;
        }
        if owner.is_none()
            && let Some((name, rest)) = assignee::take_addressee(text)
        {
            owner = Some(Owner::Named(name));
            text = rest;
            continue;
        }
        if let Some(rest) = assignee::take_connective(text) {
            text = rest;
            continue;
        }
        if owner.is_none()
            && let Some((found, rest)) = assignee::take_owner(text)
        {
            owner = Some(found);
            text = rest;
            continue;
        }
        break;
    }

    starts_with_verb(text).then_some(Action { body: text, owner })
}

// ── Titles ──────────────────────────────────────────────────────────

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out = String::new();
    for word in text.split_whitespace() {
        let needed = if out.is_empty() {
            word.chars().count()
        } else {
            out.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        text.chars().take(max_chars).collect()
    } else {
        out
    }
}

/// Imperative title for an action body.
///
/// First clause only, without date phrases or urgency adverbs,
/// capitalized and cut to `max_chars` on a word boundary.
pub(crate) fn make_title(body: &str, max_chars: usize) -> String {
    let lower = body.to_lowercase();
    let cut = TITLE_BREAKS
        .iter()
        .filter_map(|b| lower.find(b))
        .min()
        .filter(|&i| body.is_char_boundary(i))
        .unwrap_or(body.len());

    let clause = strip_urgency(&strip_date_phrases(&body[..cut]));
    let clause = clause
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | ':' | ';') || c.is_whitespace());

    truncate_at_word(&capitalize(clause), max_chars)
}
