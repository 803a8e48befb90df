//! In-memory `TaskBackend` — used by tests and by the binary when no
//! remote backend is configured.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::traits::{NewProject, NewTask, TaskBackend, TaskFilter, TaskUpdate};
use crate::error::BackendError;
use crate::tasks::model::{Comment, Project, Task};

/// Prefix the storage side puts on every agent comment.
pub const AGENT_COMMENT_PREFIX: &str = "[AI Agent]: ";

#[derive(Debug, Default)]
struct State {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    comments: Vec<Comment>,
}

/// Vec-backed store guarded by a `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing tasks.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            state: RwLock::new(State {
                tasks: tasks.into_iter().collect(),
                ..Default::default()
            }),
        }
    }

    /// Snapshot of every stored task, in insertion order.
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    /// Snapshot of every stored project, in insertion order.
    pub async fn projects(&self) -> Vec<Project> {
        self.state.read().await.projects.clone()
    }

    /// Comments on one task, oldest first.
    pub async fn comments_for(&self, task_id: &str) -> Vec<Comment> {
        self.state
            .read()
            .await
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect()
    }
}

fn not_found(entity: &str, id: &str) -> BackendError {
    BackendError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

#[async_trait]
impl TaskBackend for InMemoryBackend {
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, BackendError> {
        Ok(self
            .state
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| filter.matches(t))
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect())
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task, BackendError> {
        let mut state = self.state.write().await;
        if let Some(ref project_id) = new.project_id
            && !state.projects.iter().any(|p| &p.id == project_id)
        {
            return Err(not_found("project", project_id));
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: new.title.clone(),
            description: new.description.clone().unwrap_or_default(),
            status: new.status,
            priority: new.priority,
            due_date: new.due_date,
            assignee_id: None,
            project_id: new.project_id.clone(),
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task, BackendError> {
        let mut state = self.state.write().await;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| not_found("task", task_id))?;
        update.apply_to(task);
        Ok(task.clone())
    }

    async fn assign_task(&self, task_id: &str, user_id: &str) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| not_found("task", task_id))?;
        task.assignee_id = Some(user_id.to_string());
        Ok(())
    }

    async fn create_project(&self, new: &NewProject) -> Result<Project, BackendError> {
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            description: new.description.clone(),
            status: new.status,
        };
        self.state.write().await.projects.push(project.clone());
        Ok(project)
    }

    async fn list_projects(&self, limit: usize) -> Result<Vec<Project>, BackendError> {
        Ok(self
            .state
            .read()
            .await
            .projects
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, task_id: &str, content: &str) -> Result<Comment, BackendError> {
        let mut state = self.state.write().await;
        if !state.tasks.iter().any(|t| t.id == task_id) {
            return Err(not_found("task", task_id));
        }
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            content: format!("{AGENT_COMMENT_PREFIX}{content}"),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }
}
