//! Grouping of action items into project drafts.
//!
//! Items under a named heading belong to that heading's project. Other
//! items that name the same deliverable ("for the Q3 launch") are grouped
//! once at least two of them share it. Everything else stays standalone.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::extract::text::Heading;
use crate::extract::types::{ProjectDraft, TaskDraft};

static DELIVERABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:for|of|on|about)\s+(?:the\s+|our\s+|this\s+)?((?:[a-z0-9][\w'-]*\s+){0,3}?(?:launch|release|migration|project|rollout|redesign|integration|upgrade|campaign|onboarding|conference|event|proposal|audit|demo))\b",
    )
    .expect("deliverable pattern must compile")
});

/// Minimum items sharing a deliverable before they form a project.
const MIN_DELIVERABLE_ITEMS: usize = 2;

/// An extracted item with the heading it appeared under.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub draft: TaskDraft,
    pub heading: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Heading(usize),
    Deliverable(String),
}

/// Lowercased deliverable phrase an item mentions, if any.
fn deliverable_of(draft: &TaskDraft) -> Option<String> {
    let text = match &draft.description {
        Some(desc) => format!("{} {desc}", draft.title),
        None => draft.title.clone(),
    };
    DELIVERABLE
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
}

fn title_case(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Split candidates into project drafts and standalone drafts.
///
/// Projects appear in the order of their first item; tasks keep
/// extraction order within each group.
pub(crate) fn group(
    candidates: Vec<Candidate>,
    headings: &[Heading],
) -> (Vec<ProjectDraft>, Vec<TaskDraft>) {
    let deliverables: Vec<Option<String>> = candidates
        .iter()
        .map(|c| deliverable_of(&c.draft))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (candidate, deliverable) in candidates.iter().zip(&deliverables) {
        if candidate.heading.is_some_and(|h| !headings[h].generic) {
            continue;
        }
        if let Some(d) = deliverable {
            *counts.entry(d.as_str()).or_default() += 1;
        }
    }

    let mut projects: Vec<(GroupKey, ProjectDraft)> = Vec::new();
    let mut standalone = Vec::new();

    for (candidate, deliverable) in candidates.into_iter().zip(&deliverables) {
        let key = match candidate.heading {
            Some(h) if !headings[h].generic => Some(GroupKey::Heading(h)),
            _ => deliverable
                .as_deref()
                .filter(|d| counts.get(d).copied().unwrap_or(0) >= MIN_DELIVERABLE_ITEMS)
                .map(|d| GroupKey::Deliverable(d.to_string())),
        };

        let Some(key) = key else {
            standalone.push(candidate.draft);
            continue;
        };

        match projects.iter_mut().find(|(k, _)| *k == key) {
            Some((_, project)) => project.tasks.push(candidate.draft),
            None => {
                let name = match &key {
                    GroupKey::Heading(h) => headings[*h].name.clone(),
                    GroupKey::Deliverable(phrase) => title_case(phrase),
                };
                projects.push((
                    key,
                    ProjectDraft {
                        name,
                        description: None,
                        tasks: vec![candidate.draft],
                    },
                ));
            }
        }
    }

    (projects.into_iter().map(|(_, p)| p).collect(), standalone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::model::Priority;

    fn candidate(title: &str, heading: Option<usize>) -> Candidate {
        Candidate {
            draft: TaskDraft {
                title: title.into(),
                description: Some(format!("{title}.")),
                priority: Priority::Medium,
                due_date: None,
                assignee: None,
            },
            heading,
        }
    }

    fn heading(name: &str, generic: bool) -> Heading {
        Heading {
            name: name.into(),
            generic,
            sticky: true,
        }
    }

    #[test]
    fn named_heading_forms_project() {
        let headings = [heading("Website redesign", false)];
        let (projects, standalone) = group(
            vec![
                candidate("Draft the wireframes", Some(0)),
                candidate("Call the dentist", None),
            ],
            &headings,
        );
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Website redesign");
        assert_eq!(projects[0].tasks.len(), 1);
        assert_eq!(standalone.len(), 1);
    }

    #[test]
    fn generic_heading_stays_standalone() {
        let headings = [heading("Action items", true)];
        let (projects, standalone) = group(
            vec![
                candidate("Send the notes", Some(0)),
                candidate("Book a room", Some(0)),
            ],
            &headings,
        );
        assert!(projects.is_empty());
        assert_eq!(standalone.len(), 2);
    }

    #[test]
    fn shared_deliverable_forms_project() {
        let (projects, standalone) = group(
            vec![
                candidate("Prepare slides for the Q3 product launch", None),
                candidate("Research payment providers", None),
                candidate("Book the venue for the Q3 product launch", None),
            ],
            &[],
        );
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Q3 Product Launch");
        assert_eq!(
            projects[0]
                .tasks
                .iter()
                .map(|t| t.title.as_str())
                .collect::<Vec<_>>(),
            vec![
                "Prepare slides for the Q3 product launch",
                "Book the venue for the Q3 product launch"
            ]
        );
        assert_eq!(standalone.len(), 1);
    }

    #[test]
    fn single_deliverable_mention_stays_standalone() {
        let (projects, standalone) =
            group(vec![candidate("Write notes for the release", None)], &[]);
        assert!(projects.is_empty());
        assert_eq!(standalone.len(), 1);
    }
}
