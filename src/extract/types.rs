//! Shared types for content extraction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tasks::model::Priority;

// ── Input metadata ──────────────────────────────────────────────────

/// What kind of text is being extracted from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Email,
    Transcript,
    #[default]
    Document,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Transcript => "transcript",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional context about the text: where it came from and when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub content_type: ContentType,
    /// Email sender or meeting organizer. Owner of "I'll ..." items when
    /// no transcript speaker is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Reference date relative phrases resolve against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_on: Option<NaiveDate>,
}

impl ContentMetadata {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            ..Default::default()
        }
    }

    pub fn email() -> Self {
        Self::new(ContentType::Email)
    }

    pub fn transcript() -> Self {
        Self::new(ContentType::Transcript)
    }

    /// Builder: set sender.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Builder: set subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Builder: set the reference date.
    pub fn received_on(mut self, date: NaiveDate) -> Self {
        self.received_on = Some(date);
        self
    }
}

// ── Output ──────────────────────────────────────────────────────────

/// One action item, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Name, handle or email address of whoever owns the item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

/// A group of related action items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tasks in extraction order.
    pub tasks: Vec<TaskDraft>,
}

/// Everything extracted from one block of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub projects: Vec<ProjectDraft>,
    pub standalone_tasks: Vec<TaskDraft>,
    /// One line describing the extraction. Never empty.
    pub summary: String,
}

impl ExtractedContent {
    /// Nested plus standalone tasks.
    pub fn total_tasks(&self) -> usize {
        self.projects.iter().map(|p| p.tasks.len()).sum::<usize>() + self.standalone_tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_tasks() == 0
    }

    /// Every task draft, nested ones first, in extraction order per group.
    pub fn all_tasks(&self) -> impl Iterator<Item = &TaskDraft> {
        self.projects
            .iter()
            .flat_map(|p| p.tasks.iter())
            .chain(self.standalone_tasks.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            description: None,
            priority: Priority::Medium,
            due_date: None,
            assignee: None,
        }
    }

    #[test]
    fn total_counts_nested_and_standalone() {
        let content = ExtractedContent {
            projects: vec![ProjectDraft {
                name: "Launch".into(),
                description: None,
                tasks: vec![draft("a"), draft("b")],
            }],
            standalone_tasks: vec![draft("c")],
            summary: "x".into(),
        };
        assert_eq!(content.total_tasks(), 3);
        assert_eq!(content.all_tasks().count(), 3);
        assert!(!content.is_empty());
    }

    #[test]
    fn draft_serializes_without_absent_fields() {
        let json = serde_json::to_value(draft("Ship it")).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Ship it", "priority": "medium"}));
    }

    #[test]
    fn metadata_builders() {
        let meta = ContentMetadata::email()
            .with_sender("alice@example.com")
            .with_subject("Q3");
        assert_eq!(meta.content_type, ContentType::Email);
        assert_eq!(meta.sender.as_deref(), Some("alice@example.com"));
        assert_eq!(meta.subject.as_deref(), Some("Q3"));
        assert_eq!(ContentMetadata::default().content_type, ContentType::Document);
    }
}
