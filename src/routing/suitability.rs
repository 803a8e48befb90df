//! Suitability filter — decides which tasks can be handed to a handler.
//!
//! Only unassigned `todo` tasks are considered. Anything already assigned
//! or in flight is left alone entirely: it lands in neither bucket.

use std::collections::BTreeMap;

use tracing::debug;

use crate::routing::classifier::{Category, classify_task};
use crate::tasks::model::{Task, TaskStatus};

/// Partition of a task batch into automatable work and work a human
/// should look at.
#[derive(Debug, Clone, Default)]
pub struct AutomationPlan {
    /// Automatable tasks keyed by category, input order kept per bucket.
    /// Never contains `Category::Unknown`.
    pub automatable: BTreeMap<Category, Vec<Task>>,
    /// Candidate tasks the classifier could not place.
    pub needs_attention: Vec<Task>,
}

impl AutomationPlan {
    /// Total number of automatable tasks across all buckets.
    pub fn automatable_count(&self) -> usize {
        self.automatable.values().map(Vec::len).sum()
    }

    /// Tasks in one bucket, empty if the bucket is absent.
    pub fn bucket(&self, category: Category) -> &[Task] {
        self.automatable
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate automatable tasks as `(category, task)` in category order.
    pub fn iter_automatable(&self) -> impl Iterator<Item = (Category, &Task)> {
        self.automatable
            .iter()
            .flat_map(|(category, tasks)| tasks.iter().map(move |t| (*category, t)))
    }
}

/// Whether a task is a candidate for automation at all.
pub fn is_candidate(task: &Task) -> bool {
    task.status == TaskStatus::Todo && task.assignee_id.is_none()
}

/// Split a batch of tasks into automatable buckets and a needs-attention list.
pub fn find_automatable(tasks: impl IntoIterator<Item = Task>) -> AutomationPlan {
    let mut plan = AutomationPlan::default();

    for task in tasks {
        if !is_candidate(&task) {
            debug!(task_id = %task.id, status = %task.status, "Skipping task outside automation scope");
            continue;
        }

        match classify_task(&task) {
            Category::Unknown => plan.needs_attention.push(task),
            category => plan.automatable.entry(category).or_default().push(task),
        }
    }

    plan
}
