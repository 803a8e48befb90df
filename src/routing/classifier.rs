//! Keyword classifier — maps a task's text to a work category.
//!
//! Category sets are checked in a fixed order and the first set with a
//! hit wins, regardless of where the keyword sits in the text:
//! "fix the failing test" is development, not testing.

use serde::{Deserialize, Serialize};

use crate::tasks::model::Task;

/// Kind of work a task represents.
///
/// Variant order is the classifier's check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Development,
    Documentation,
    Testing,
    Research,
    Unknown,
}

impl Category {
    /// Categories that have a handler, in check order.
    pub const ROUTABLE: [Category; 4] = [
        Category::Development,
        Category::Documentation,
        Category::Testing,
        Category::Research,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Documentation => "documentation",
            Self::Testing => "testing",
            Self::Research => "research",
            Self::Unknown => "unknown",
        }
    }

    /// Keywords that select this category. Empty for `Unknown`.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Development => &["code", "implement", "fix", "bug", "develop"],
            Self::Documentation => &["document", "readme", "guide", "write"],
            Self::Testing => &["test", "qa", "verify", "check"],
            Self::Research => &["research", "analyze", "investigate", "explore"],
            Self::Unknown => &[],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify free text into a category.
///
/// Matching is substring containment on the lowercased text, so
/// "developer" hits "develop" and "checklist" hits "check".
pub fn classify(title: &str, description: &str) -> Category {
    let text = format!("{title} {description}").to_lowercase();

    Category::ROUTABLE
        .into_iter()
        .find(|category| category.keywords().iter().any(|kw| text.contains(kw)))
        .unwrap_or(Category::Unknown)
}

/// Classify a task record by its title and description.
pub fn classify_task(task: &Task) -> Category {
    classify(&task.title, &task.description)
}
