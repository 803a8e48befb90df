//! `TaskBackend` trait — the whole surface the router needs from storage.
//!
//! Fetch tasks by filter, create/update tasks and projects, append
//! comments. Transport, auth and retries live behind the implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::tasks::model::{Comment, Priority, Project, ProjectStatus, Task, TaskStatus};

/// Default page size for task listings.
pub const DEFAULT_TASK_LIMIT: usize = 100;

/// How many tasks `find_task` scans before giving up.
const FIND_SCAN_LIMIT: usize = 1000;

/// Filter for listing tasks. `None` fields do not constrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    /// Only tasks nobody is assigned to.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unassigned: bool,
    pub limit: usize,
    /// Tasks to skip before the page starts.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub offset: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            project_id: None,
            status: None,
            assignee_id: None,
            unassigned: false,
            limit: DEFAULT_TASK_LIMIT,
            offset: 0,
        }
    }
}

impl TaskFilter {
    /// Tasks in `status`.
    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Builder: cap the number of returned tasks.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Builder: only unassigned tasks.
    pub fn unassigned(mut self) -> Self {
        self.unassigned = true;
        self
    }

    /// Builder: tasks assigned to `user_id`.
    pub fn assigned_to(mut self, user_id: impl Into<String>) -> Self {
        self.assignee_id = Some(user_id.into());
        self
    }

    /// Whether `task` satisfies this filter (ignores `limit` and `offset`).
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && (!self.unassigned || task.assignee_id.is_none())
            && self
                .project_id
                .as_deref()
                .is_none_or(|p| task.project_id.as_deref() == Some(p))
            && self
                .assignee_id
                .as_deref()
                .is_none_or(|a| task.assignee_id.as_deref() == Some(a))
    }
}

/// Fields for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `None` for standalone tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
}

impl NewTask {
    /// A `todo` task with medium priority.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            project_id: None,
            priority: Priority::Medium,
            due_date: None,
            status: TaskStatus::Todo,
        }
    }
}

/// Partial update of a task. Only `Some` fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl TaskUpdate {
    /// Update that only changes status.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply this update to a task in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due_date {
            task.due_date = Some(due);
        }
    }
}

/// Fields for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub organization_id: String,
    pub status: ProjectStatus,
}

/// Storage collaborator used by the coordinator and handlers.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    // ── Tasks ───────────────────────────────────────────────────────

    /// List tasks matching `filter`, at most `filter.limit`.
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, BackendError>;

    /// Create a task and return the stored record.
    async fn create_task(&self, task: &NewTask) -> Result<Task, BackendError>;

    /// Apply `update` to a task and return the stored record.
    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task, BackendError>;

    /// Assign a user to a task.
    async fn assign_task(&self, task_id: &str, user_id: &str) -> Result<(), BackendError>;

    // ── Projects ────────────────────────────────────────────────────

    /// Create a project and return the stored record.
    async fn create_project(&self, project: &NewProject) -> Result<Project, BackendError>;

    /// List projects, most recent first.
    async fn list_projects(&self, limit: usize) -> Result<Vec<Project>, BackendError>;

    // ── Comments ────────────────────────────────────────────────────

    /// Append a comment to a task.
    async fn add_comment(&self, task_id: &str, content: &str) -> Result<Comment, BackendError>;

    /// Look up one task by id among the listed tasks.
    async fn find_task(&self, task_id: &str) -> Result<Task, BackendError> {
        let filter = TaskFilter::default().limit(FIND_SCAN_LIMIT);
        self.list_tasks(&filter)
            .await?
            .into_iter()
            .find(|t| t.id == task_id)
            .ok_or_else(|| BackendError::NotFound {
                entity: "task".into(),
                id: task_id.to_string(),
            })
    }
}

/// Page through `filter` from the first task, keeping what `keep`
/// accepts, until `wanted` tasks are kept or the listing runs out.
///
/// `filter.limit` is the page size. `None` for `wanted` collects
/// everything. A page with no unseen ids ends the walk, so a backend
/// that ignores `offset` is read once.
pub async fn collect_tasks(
    backend: &dyn TaskBackend,
    filter: &TaskFilter,
    wanted: Option<usize>,
    keep: impl Fn(&Task) -> bool + Send,
) -> Result<Vec<Task>, BackendError> {
    let page_size = filter.limit.max(1);
    let mut page_filter = TaskFilter {
        limit: page_size,
        offset: 0,
        ..filter.clone()
    };
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    loop {
        let page = backend.list_tasks(&page_filter).await?;
        let len = page.len();
        let mut fresh = 0;

        for task in page {
            if !seen.insert(task.id.clone()) {
                continue;
            }
            fresh += 1;
            if keep(&task) {
                kept.push(task);
                if wanted.is_some_and(|w| kept.len() >= w) {
                    return Ok(kept);
                }
            }
        }

        if len < page_size || fresh == 0 {
            return Ok(kept);
        }
        page_filter.offset += len;
    }
}
