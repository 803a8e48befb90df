//! Content extraction — free text to structured project and task drafts.
//!
//! A deterministic rule engine:
//! 1. Clean up (line endings, quoted email replies)
//! 2. Segment into headings, bullets, speaker turns and paragraphs
//! 3. Find action items sentence by sentence; trailing non-actionable
//!    sentences in the same paragraph become their context
//! 4. Infer title, priority, due date and assignee per item
//! 5. Group by heading or shared deliverable
//!
//! Extraction never fails. Input with nothing actionable yields empty
//! sequences and a summary saying so.

mod assignee;
pub mod dates;
pub mod email;
mod grouping;
pub mod persist;
pub mod priority;
mod text;
pub mod types;

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::extract::assignee::Owner;
use crate::extract::grouping::Candidate;

pub use email::{ParsedEmail, parse_raw_email};
pub use persist::{PersistFailure, PersistReport, persist_extracted};
pub use text::strip_quoted_text;
pub use types::{ContentMetadata, ContentType, ExtractedContent, ProjectDraft, TaskDraft};

/// An action item while its context is still being collected.
struct PendingItem {
    title: String,
    sentences: Vec<String>,
    owner: Option<Owner>,
    speaker: Option<String>,
    heading: Option<usize>,
}

/// Rule-based extractor. Holds only configuration; safe to share.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract against today's local date.
    pub fn extract(&self, raw: &str, metadata: Option<&ContentMetadata>) -> ExtractedContent {
        self.extract_on(raw, metadata, chrono::Local::now().date_naive())
    }

    /// Parse a raw RFC 822 message and extract from its body.
    pub fn extract_email(&self, raw: &[u8]) -> Option<ExtractedContent> {
        let email = parse_raw_email(raw)?;
        Some(self.extract(&email.body, Some(&email.metadata)))
    }

    /// Extract with an explicit fallback reference date.
    ///
    /// `metadata.received_on` wins over `today` when present.
    pub fn extract_on(
        &self,
        raw: &str,
        metadata: Option<&ContentMetadata>,
        today: NaiveDate,
    ) -> ExtractedContent {
        let reference = metadata.and_then(|m| m.received_on).unwrap_or(today);
        let sender = metadata.and_then(|m| m.sender.as_deref());

        let mut body = text::normalize(raw);
        if metadata.is_some_and(|m| m.content_type == ContentType::Email) {
            body = strip_quoted_text(&body);
        }

        let segmented = text::segment(&body, &self.config.generic_headings);
        let items = self.collect_items(&segmented.segments);

        let candidates = items
            .into_iter()
            .map(|item| {
                let description = item.sentences.join(" ");
                Candidate {
                    draft: TaskDraft {
                        priority: priority::infer_priority(&description, &self.config),
                        due_date: dates::find_due_date(&description, reference),
                        assignee: assignee::resolve(
                            &description,
                            item.owner.as_ref(),
                            item.speaker.as_deref(),
                            sender,
                        ),
                        title: item.title,
                        description: Some(description),
                    },
                    heading: item.heading,
                }
            })
            .collect();

        let (projects, standalone_tasks) = grouping::group(candidates, &segmented.headings);
        let summary = summarize(&projects, &standalone_tasks, metadata);

        debug!(
            projects = projects.len(),
            standalone = standalone_tasks.len(),
            reference = %reference,
            "Extracted content"
        );

        ExtractedContent {
            projects,
            standalone_tasks,
            summary,
        }
    }

    fn collect_items(&self, segments: &[text::Segment]) -> Vec<PendingItem> {
        let mut items: Vec<PendingItem> = Vec::new();
        let mut seen = HashSet::new();
        // Item still accepting context, and the paragraph it lives in.
        let mut open: Option<(usize, usize)> = None;

        for segment in segments {
            for sentence in text::split_sentences(&segment.text) {
                let Some(action) = text::parse_action(sentence) else {
                    match open {
                        Some((idx, block)) if block == segment.block => {
                            items[idx].sentences.push(sentence.to_string());
                        }
                        _ => open = None,
                    }
                    continue;
                };

                let title = text::make_title(action.body, self.config.max_title_chars);
                if title.is_empty() || !seen.insert(title.to_lowercase()) {
                    open = None;
                    continue;
                }

                items.push(PendingItem {
                    title,
                    sentences: vec![sentence.to_string()],
                    owner: action.owner,
                    speaker: segment.speaker.clone(),
                    heading: segment.heading,
                });
                open = Some((items.len() - 1, segment.block));
            }
        }

        items
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn summarize(
    projects: &[ProjectDraft],
    standalone: &[TaskDraft],
    metadata: Option<&ContentMetadata>,
) -> String {
    let source = match metadata {
        Some(m) => format!("the {}", m.content_type),
        None => "the text".to_string(),
    };

    let total = projects.iter().map(|p| p.tasks.len()).sum::<usize>() + standalone.len();
    if total == 0 {
        return format!("No actionable items found in {source}.");
    }

    let mut summary = format!("Extracted {}", plural(total, "task"));
    if !projects.is_empty() {
        summary.push_str(&format!(" across {}", plural(projects.len(), "project")));
    }
    summary.push_str(&format!(" from {source}"));
    if let Some(subject) = metadata.and_then(|m| m.subject.as_deref()) {
        summary.push_str(&format!(" \"{subject}\""));
    }
    if let Some(sender) = metadata.and_then(|m| m.sender.as_deref()) {
        summary.push_str(&format!(" from {sender}"));
    }
    summary.push('.');
    summary
}
