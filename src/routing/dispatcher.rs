//! Dispatcher — turns a classified task into a work order for its handler.
//!
//! The dispatcher only builds the order. Executing it belongs to the
//! handler the order names.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DispatchError;
use crate::routing::classifier::{Category, classify};
use crate::routing::handlers::{HandlerRegistry, HandlerSpec};
use crate::tasks::model::{Priority, Task};

/// The task fields a handler needs to act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub task_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
}

impl From<&Task> for DispatchRequest {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
        }
    }
}

/// Instructions for one handler to carry out one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub category: Category,
    /// Name of the handler that must execute this order.
    pub handler: String,
    pub task: DispatchRequest,
    pub instructions: String,
}

impl WorkOrder {
    pub fn task_id(&self) -> &str {
        &self.task.task_id
    }
}

/// Builds work orders from the handler registry.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Build the work order for `task` in `category`.
    pub fn dispatch(&self, task: &Task, category: Category) -> Result<WorkOrder, DispatchError> {
        self.dispatch_request(DispatchRequest::from(task), category)
    }

    /// Classify a dispatch request and build its work order.
    pub fn route(&self, request: DispatchRequest) -> Result<WorkOrder, DispatchError> {
        let category = classify(&request.title, &request.description);
        debug!(task_id = %request.task_id, category = %category, "Classified dispatch request");
        self.dispatch_request(request, category)
    }

    fn dispatch_request(
        &self,
        request: DispatchRequest,
        category: Category,
    ) -> Result<WorkOrder, DispatchError> {
        let Some(spec) = self.registry.for_category(category) else {
            info!(
                task_id = %request.task_id,
                category = %category,
                "No handler for category, task needs a human"
            );
            return Err(DispatchError::NoSuitableHandler {
                task_id: request.task_id,
            });
        };

        let instructions = render_instructions(&request, spec);
        debug!(task_id = %request.task_id, handler = spec.name, "Built work order");

        Ok(WorkOrder {
            category,
            handler: spec.name.to_string(),
            task: request,
            instructions,
        })
    }
}

/// Standard instruction template handed to every handler.
fn render_instructions(request: &DispatchRequest, spec: &HandlerSpec) -> String {
    let description = if request.description.trim().is_empty() {
        "(none)"
    } else {
        request.description.trim()
    };

    format!(
        "Please work on this task:\n\
         Task ID: {id}\n\
         Title: {title}\n\
         Description: {description}\n\
         Priority: {priority}\n\
         \n\
         Steps:\n\
         1. Update status to 'in_progress'\n\
         2. {work}\n\
         3. Add comments with your progress/findings\n\
         4. Update status to 'review' when complete",
        id = request.task_id,
        title = request.title,
        priority = request.priority,
        work = spec.work_step,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task::new("task-9", "Check the export totals")
            .with_description("Numbers drift after midnight")
            .with_priority(Priority::High)
    }

    #[test]
    fn testing_goes_to_qa() {
        let order = Dispatcher::default()
            .dispatch(&task(), Category::Testing)
            .unwrap();
        assert_eq!(order.handler, "QA");
        assert_eq!(order.category, Category::Testing);
        assert_eq!(order.task_id(), "task-9");
        assert!(order.instructions.contains("Check the export totals"));
    }

    #[test]
    fn each_category_maps_to_its_handler() {
        let dispatcher = Dispatcher::default();
        let expected = [
            (Category::Development, "Developer"),
            (Category::Documentation, "Writer"),
            (Category::Testing, "QA"),
            (Category::Research, "Research"),
        ];
        for (category, handler) in expected {
            let order = dispatcher.dispatch(&task(), category).unwrap();
            assert_eq!(order.handler, handler);
        }
    }

    #[test]
    fn unknown_fails_with_task_id() {
        let err = Dispatcher::default()
            .dispatch(&task(), Category::Unknown)
            .unwrap_err();
        match err {
            DispatchError::NoSuitableHandler { task_id } => assert_eq!(task_id, "task-9"),
            other => panic!("Expected NoSuitableHandler, got {other:?}"),
        }
    }

    #[test]
    fn unregistered_category_fails() {
        let dispatcher = Dispatcher::new(HandlerRegistry::empty());
        let err = dispatcher.dispatch(&task(), Category::Development).unwrap_err();
        assert!(matches!(err, DispatchError::NoSuitableHandler { .. }));
    }

    #[test]
    fn instructions_carry_task_fields_and_steps() {
        let order = Dispatcher::default()
            .dispatch(&task(), Category::Testing)
            .unwrap();
        let text = &order.instructions;
        assert!(text.contains("Task ID: task-9"));
        assert!(text.contains("Description: Numbers drift after midnight"));
        assert!(text.contains("Priority: high"));
        assert!(text.contains("1. Update status to 'in_progress'"));
        assert!(text.contains("3. Add comments with your progress/findings"));
        assert!(text.contains("4. Update status to 'review' when complete"));
    }

    #[test]
    fn empty_description_is_marked() {
        let order = Dispatcher::default()
            .dispatch(&Task::new("t", "Fix it"), Category::Development)
            .unwrap();
        assert!(order.instructions.contains("Description: (none)"));
    }

    #[test]
    fn route_classifies_request() {
        let request = DispatchRequest {
            task_id: "r1".into(),
            title: "Investigate slow queries".into(),
            description: String::new(),
            priority: Priority::Medium,
        };
        let order = Dispatcher::default().route(request).unwrap();
        assert_eq!(order.category, Category::Research);
        assert_eq!(order.handler, "Research");
    }

    #[test]
    fn route_unknown_request_fails() {
        let request = DispatchRequest {
            task_id: "r2".into(),
            title: "Book flights".into(),
            description: String::new(),
            priority: Priority::Low,
        };
        let err = Dispatcher::default().route(request).unwrap_err();
        assert!(matches!(err, DispatchError::NoSuitableHandler { task_id } if task_id == "r2"));
    }

    #[test]
    fn work_order_serializes_wire_shape() {
        let order = Dispatcher::default()
            .dispatch(&task(), Category::Testing)
            .unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["category"], "testing");
        assert_eq!(json["handler"], "QA");
        assert_eq!(json["task"]["task_id"], "task-9");
        assert!(json["instructions"].is_string());
    }
}
