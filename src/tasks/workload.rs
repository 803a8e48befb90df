//! Workload metrics over a batch of tasks.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::tasks::model::{Priority, Task, TaskStatus};

/// Days ahead that count as "due this week".
const DUE_SOON_WINDOW_DAYS: i64 = 7;

/// Counts describing how much work a person or team is carrying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkloadMetrics {
    pub total_tasks: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    /// Due strictly before `today`.
    pub overdue: usize,
    /// Due between `today` and seven days out, inclusive.
    pub due_this_week: usize,
}

impl WorkloadMetrics {
    pub fn status_count(&self, status: TaskStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        self.by_priority.get(priority.as_str()).copied().unwrap_or(0)
    }
}

/// Compute workload metrics for `tasks` relative to `today`.
pub fn analyze_workload(tasks: &[Task], today: NaiveDate) -> WorkloadMetrics {
    let horizon = today + Duration::days(DUE_SOON_WINDOW_DAYS);
    let mut metrics = WorkloadMetrics {
        total_tasks: tasks.len(),
        ..Default::default()
    };

    for task in tasks {
        *metrics
            .by_status
            .entry(task.status.as_str().to_string())
            .or_default() += 1;
        *metrics
            .by_priority
            .entry(task.priority.as_str().to_string())
            .or_default() += 1;

        if let Some(due) = task.due_date {
            if due < today {
                metrics.overdue += 1;
            } else if due <= horizon {
                metrics.due_this_week += 1;
            }
        }
    }

    metrics
}
