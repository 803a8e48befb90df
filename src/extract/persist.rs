//! Persist extracted content through the storage collaborator.
//!
//! One project per draft (status `planning`), its tasks linked to the new
//! project id, standalone tasks with no project at all. A task with an
//! owner is assigned right after it is created, so routing leaves it to
//! that person. A failing item is recorded and the batch carries on.

use tracing::{info, warn};

use crate::backend::traits::{NewProject, NewTask, TaskBackend};
use crate::error::BackendError;
use crate::extract::types::{ExtractedContent, TaskDraft};
use crate::tasks::model::{Project, ProjectStatus, Task, TaskStatus};

/// One item that could not be saved.
#[derive(Debug)]
pub struct PersistFailure {
    /// Project name or task title.
    pub item: String,
    pub error: BackendError,
}

/// Outcome of persisting one `ExtractedContent`.
#[derive(Debug, Default)]
pub struct PersistReport {
    pub created_projects: Vec<Project>,
    pub created_tasks: Vec<Task>,
    pub errors: Vec<PersistFailure>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

fn new_task(draft: &TaskDraft, project_id: Option<&str>) -> NewTask {
    NewTask {
        title: draft.title.clone(),
        description: draft.description.clone(),
        project_id: project_id.map(str::to_string),
        priority: draft.priority,
        due_date: draft.due_date,
        status: TaskStatus::Todo,
    }
}

async fn save_task(
    backend: &dyn TaskBackend,
    draft: &TaskDraft,
    project_id: Option<&str>,
    report: &mut PersistReport,
) {
    let mut task = match backend.create_task(&new_task(draft, project_id)).await {
        Ok(task) => task,
        Err(e) => {
            warn!(title = %draft.title, error = %e, "Failed to create task");
            report.errors.push(PersistFailure {
                item: draft.title.clone(),
                error: e,
            });
            return;
        }
    };

    if let Some(ref assignee) = draft.assignee {
        match backend.assign_task(&task.id, assignee).await {
            Ok(()) => task.assignee_id = Some(assignee.clone()),
            Err(e) => {
                warn!(task_id = %task.id, assignee = %assignee, error = %e, "Failed to assign task");
                report.errors.push(PersistFailure {
                    item: format!("{} (assign to {assignee})", draft.title),
                    error: e,
                });
            }
        }
    }
    report.created_tasks.push(task);
}

/// Save every project and task in `content`.
pub async fn persist_extracted(
    backend: &dyn TaskBackend,
    content: &ExtractedContent,
    organization_id: &str,
) -> PersistReport {
    let mut report = PersistReport::default();

    for draft in &content.projects {
        let new_project = NewProject {
            name: draft.name.clone(),
            description: draft.description.clone(),
            organization_id: organization_id.to_string(),
            status: ProjectStatus::Planning,
        };

        let project = match backend.create_project(&new_project).await {
            Ok(project) => project,
            Err(e) => {
                // Its tasks would have nowhere to go.
                warn!(project = %draft.name, error = %e, "Failed to create project");
                report.errors.push(PersistFailure {
                    item: draft.name.clone(),
                    error: e,
                });
                continue;
            }
        };

        for task in &draft.tasks {
            save_task(backend, task, Some(&project.id), &mut report).await;
        }
        report.created_projects.push(project);
    }

    for task in &content.standalone_tasks {
        save_task(backend, task, None, &mut report).await;
    }

    info!(
        projects = report.created_projects.len(),
        tasks = report.created_tasks.len(),
        errors = report.errors.len(),
        "Persisted extracted content"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::extract::types::ProjectDraft;
    use crate::tasks::model::Priority;

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            description: None,
            priority: Priority::High,
            due_date: None,
            assignee: None,
        }
    }

    fn content() -> ExtractedContent {
        ExtractedContent {
            projects: vec![ProjectDraft {
                name: "Launch".into(),
                description: None,
                tasks: vec![draft("Book venue"), draft("Send invites")],
            }],
            standalone_tasks: vec![draft("Renew domain")],
            summary: "Extracted 3 tasks".into(),
        }
    }

    #[tokio::test]
    async fn nested_tasks_get_project_id_standalone_do_not() {
        let backend = InMemoryBackend::new();
        let report = persist_extracted(&backend, &content(), "org-1").await;

        assert!(report.is_complete());
        assert_eq!(report.created_projects.len(), 1);
        assert_eq!(report.created_projects[0].status, ProjectStatus::Planning);
        let project_id = report.created_projects[0].id.clone();

        let tasks = backend.tasks().await;
        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Todo));
        assert_eq!(tasks[0].project_id.as_deref(), Some(project_id.as_str()));
        assert_eq!(tasks[1].project_id.as_deref(), Some(project_id.as_str()));
        assert_eq!(tasks[2].project_id, None);
        assert_eq!(tasks[2].priority, Priority::High);
    }

    /// Rejects tasks whose title mentions "reject" and the user "nobody".
    struct PickyBackend(InMemoryBackend);

    #[async_trait::async_trait]
    impl TaskBackend for PickyBackend {
        async fn list_tasks(
            &self,
            filter: &crate::backend::traits::TaskFilter,
        ) -> Result<Vec<Task>, BackendError> {
            self.0.list_tasks(filter).await
        }
        async fn create_task(&self, task: &NewTask) -> Result<Task, BackendError> {
            if task.title.contains("reject") {
                return Err(BackendError::Upstream {
                    action: "create_task".into(),
                    status: 400,
                    body: "title rejected".into(),
                });
            }
            self.0.create_task(task).await
        }
        async fn update_task(
            &self,
            task_id: &str,
            update: &crate::backend::traits::TaskUpdate,
        ) -> Result<Task, BackendError> {
            self.0.update_task(task_id, update).await
        }
        async fn assign_task(&self, task_id: &str, user_id: &str) -> Result<(), BackendError> {
            if user_id == "nobody" {
                return Err(BackendError::NotFound {
                    entity: "user".into(),
                    id: user_id.into(),
                });
            }
            self.0.assign_task(task_id, user_id).await
        }
        async fn create_project(&self, project: &NewProject) -> Result<Project, BackendError> {
            self.0.create_project(project).await
        }
        async fn list_projects(&self, limit: usize) -> Result<Vec<Project>, BackendError> {
            self.0.list_projects(limit).await
        }
        async fn add_comment(
            &self,
            task_id: &str,
            content: &str,
        ) -> Result<crate::tasks::model::Comment, BackendError> {
            self.0.add_comment(task_id, content).await
        }
    }

    #[tokio::test]
    async fn failing_item_does_not_abort_batch() {
        let backend = PickyBackend(InMemoryBackend::new());
        let mut content = content();
        content.projects[0].tasks[0] = draft("Please reject me");

        let report = persist_extracted(&backend, &content, "org").await;
        assert_eq!(report.created_tasks.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].item, "Please reject me");
        assert!(report.errors[0].error.to_string().contains("title rejected"));
    }

    #[tokio::test]
    async fn owned_drafts_are_assigned() {
        let backend = InMemoryBackend::new();
        let mut content = content();
        content.standalone_tasks[0].assignee = Some("Bob".into());

        let report = persist_extracted(&backend, &content, "org").await;
        assert!(report.is_complete());
        assert_eq!(report.created_tasks[2].assignee_id.as_deref(), Some("Bob"));

        let stored = backend.tasks().await;
        assert_eq!(stored[2].assignee_id.as_deref(), Some("Bob"));
        assert_eq!(stored[0].assignee_id, None);
    }

    #[tokio::test]
    async fn failed_assignment_keeps_the_task() {
        let backend = PickyBackend(InMemoryBackend::new());
        let mut content = content();
        content.standalone_tasks[0].assignee = Some("nobody".into());

        let report = persist_extracted(&backend, &content, "org").await;
        assert_eq!(report.created_tasks.len(), 3);
        assert_eq!(report.created_tasks[2].assignee_id, None);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].item, "Renew domain (assign to nobody)");
    }

    #[tokio::test]
    async fn empty_content_creates_nothing() {
        let backend = InMemoryBackend::new();
        let report = persist_extracted(&backend, &ExtractedContent::default(), "org").await;
        assert!(report.created_tasks.is_empty());
        assert!(report.created_projects.is_empty());
        assert!(report.is_complete());
    }
}
