//! Work handlers — the side that actually carries out a work order.
//!
//! The router never waits on these. A handler reports back through the
//! task record itself: status updates and comments.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::traits::{TaskBackend, TaskUpdate};
use crate::error::{HandlerError, TaskError};
use crate::routing::dispatcher::WorkOrder;
use crate::tasks::model::{Task, TaskStatus};

/// What a handler did with one work order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReport {
    pub handler: String,
    pub task_id: String,
    /// Status the task was left in.
    pub final_status: TaskStatus,
}

/// Executes work orders for one handler name.
#[async_trait]
pub trait WorkHandler: Send + Sync {
    /// Handler name as it appears in work orders.
    fn name(&self) -> &str;

    /// Carry out one work order.
    async fn execute(&self, order: WorkOrder) -> Result<HandlerReport, HandlerError>;
}

/// Handler that walks a task through the status convention without
/// doing any domain work: `in_progress`, a comment carrying the
/// instructions, then `review`.
pub struct StatusTrackingHandler {
    name: String,
    backend: Arc<dyn TaskBackend>,
}

impl StatusTrackingHandler {
    pub fn new(name: impl Into<String>, backend: Arc<dyn TaskBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }

    /// Move `task` to `target`, refusing edges the state machine forbids.
    async fn transition(&self, task: &Task, target: TaskStatus) -> Result<Task, HandlerError> {
        if !task.status.can_transition_to(target) {
            return Err(TaskError::InvalidTransition {
                id: task.id.clone(),
                from: task.status,
                to: target,
            }
            .into());
        }
        debug!(task_id = %task.id, from = %task.status, to = %target, "Transitioning task");
        Ok(self
            .backend
            .update_task(&task.id, &TaskUpdate::status(target))
            .await?)
    }
}

#[async_trait]
impl WorkHandler for StatusTrackingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, order: WorkOrder) -> Result<HandlerReport, HandlerError> {
        if order.handler != self.name {
            return Err(HandlerError::ExecutionFailed {
                handler: self.name.clone(),
                task_id: order.task_id().to_string(),
                reason: format!("work order is addressed to {}", order.handler),
            });
        }

        let task = self.backend.find_task(order.task_id()).await?;
        let task = self.transition(&task, TaskStatus::InProgress).await?;

        self.backend
            .add_comment(
                &task.id,
                &format!("{} picked up this task.\n\n{}", self.name, order.instructions),
            )
            .await?;

        let task = self.transition(&task, TaskStatus::Review).await?;
        info!(handler = %self.name, task_id = %task.id, "Task ready for review");

        Ok(HandlerReport {
            handler: self.name.clone(),
            task_id: task.id,
            final_status: task.status,
        })
    }
}
