//! Coordinator — ties the backend, the routing pipeline and the handlers
//! together.
//!
//! - `analyze()` — fetch unassigned `todo` tasks and build work orders
//! - `run_automation()` — analyze, then hand every order off
//! - `execute_task()` — route and hand off one task by id
//! - `process_content()` — extract drafts from text and persist them
//! - `process_email()` — the same for a raw RFC 822 message
//! - `workload()` — counts over every task, optionally for one assignee
//!
//! Handoffs are fire-and-forget: the work order goes to a spawned task
//! and the caller gets the `JoinHandle` back without waiting on it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backend::traits::{TaskBackend, TaskFilter, collect_tasks};
use crate::config::RouterConfig;
use crate::error::{DispatchError, Result};
use crate::extract::{
    ContentMetadata, ExtractedContent, Extractor, PersistReport, parse_raw_email, persist_extracted,
};
use crate::routing::dispatcher::{DispatchRequest, Dispatcher, WorkOrder};
use crate::routing::executor::{StatusTrackingHandler, WorkHandler};
use crate::routing::suitability::{find_automatable, is_candidate};
use crate::tasks::model::{Task, TaskStatus};
use crate::tasks::workload::{WorkloadMetrics, analyze_workload};

/// Work orders ready to hand off, plus what a human has to look at.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub orders: Vec<WorkOrder>,
    /// Unclassifiable tasks and tasks whose category has no handler.
    pub needs_attention: Vec<Task>,
}

/// Result of one automation pass.
#[derive(Debug, Default)]
pub struct AutomationRun {
    /// One handle per handed-off order. Awaiting them is optional.
    pub handoffs: Vec<JoinHandle<()>>,
    pub needs_attention: Vec<Task>,
    /// Orders no executor was attached for.
    pub undelivered: Vec<WorkOrder>,
}

pub struct Coordinator {
    backend: Arc<dyn TaskBackend>,
    dispatcher: Dispatcher,
    extractor: Extractor,
    handlers: HashMap<String, Arc<dyn WorkHandler>>,
    permits: Arc<Semaphore>,
    config: RouterConfig,
}

impl Coordinator {
    /// Standard handler registry, default extractor, no executors yet.
    pub fn new(backend: Arc<dyn TaskBackend>, config: RouterConfig) -> Self {
        Self {
            backend,
            dispatcher: Dispatcher::default(),
            extractor: Extractor::default(),
            handlers: HashMap::new(),
            permits: Arc::new(Semaphore::new(config.max_parallel_handoffs.max(1))),
            config,
        }
    }

    /// Builder: replace the dispatcher.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Builder: replace the extractor.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Builder: attach a `StatusTrackingHandler` for every registered handler.
    pub fn with_status_tracking_handlers(mut self) -> Self {
        for name in self.dispatcher.registry().names() {
            self.register_handler(Arc::new(StatusTrackingHandler::new(
                name,
                Arc::clone(&self.backend),
            )));
        }
        self
    }

    /// Attach an executor. Replaces any executor with the same name.
    pub fn register_handler(&mut self, handler: Arc<dyn WorkHandler>) {
        debug!(handler = handler.name(), "Registered work handler");
        self.handlers.insert(handler.name().to_string(), handler);
    }

    pub fn backend(&self) -> &Arc<dyn TaskBackend> {
        &self.backend
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    // ── Routing ─────────────────────────────────────────────────────

    /// Fetch candidate tasks and build a work order for each automatable one.
    pub async fn analyze(&self) -> Result<AnalysisReport> {
        // Backends that ignore `unassigned` still page past owned tasks.
        let budget = self.config.task_fetch_limit;
        let filter = TaskFilter::with_status(TaskStatus::Todo)
            .unassigned()
            .limit(budget);
        let tasks = collect_tasks(self.backend.as_ref(), &filter, Some(budget), is_candidate).await?;
        let fetched = tasks.len();

        let plan = find_automatable(tasks);
        let mut report = AnalysisReport {
            orders: Vec::with_capacity(plan.automatable_count()),
            needs_attention: plan.needs_attention.clone(),
        };

        for (category, task) in plan.iter_automatable() {
            match self.dispatcher.dispatch(task, category) {
                Ok(order) => report.orders.push(order),
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "Task needs a human");
                    report.needs_attention.push(task.clone());
                }
            }
        }

        info!(
            fetched,
            orders = report.orders.len(),
            needs_attention = report.needs_attention.len(),
            "Analysis complete"
        );
        Ok(report)
    }

    /// Hand `order` to its executor and return without waiting.
    ///
    /// Concurrency is bounded by `max_parallel_handoffs`; a handoff past
    /// the limit is spawned but waits for a permit before executing.
    pub fn hand_off(&self, order: WorkOrder) -> std::result::Result<JoinHandle<()>, DispatchError> {
        let handler = self
            .handlers
            .get(&order.handler)
            .cloned()
            .ok_or_else(|| DispatchError::HandlerUnavailable {
                handler: order.handler.clone(),
            })?;
        let permits = Arc::clone(&self.permits);

        info!(task_id = %order.task_id(), handler = %order.handler, "Handing off work order");

        Ok(tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                error!(task_id = %order.task_id(), "Handoff permits closed, dropping work order");
                return;
            };
            let task_id = order.task_id().to_string();
            match handler.execute(order).await {
                Ok(report) => info!(
                    task_id = %report.task_id,
                    handler = %report.handler,
                    status = %report.final_status,
                    "Handler finished"
                ),
                Err(e) => error!(task_id = %task_id, handler = handler.name(), error = %e, "Handler failed"),
            }
        }))
    }

    /// Analyze, then hand off every work order.
    pub async fn run_automation(&self) -> Result<AutomationRun> {
        let analysis = self.analyze().await?;
        let mut run = AutomationRun {
            needs_attention: analysis.needs_attention,
            ..Default::default()
        };

        for order in analysis.orders {
            match self.hand_off(order.clone()) {
                Ok(handle) => run.handoffs.push(handle),
                Err(e) => {
                    warn!(task_id = %order.task_id(), error = %e, "Work order not delivered");
                    run.undelivered.push(order);
                }
            }
        }

        info!(
            handed_off = run.handoffs.len(),
            undelivered = run.undelivered.len(),
            "Automation pass complete"
        );
        Ok(run)
    }

    /// Route one task by id and hand it off.
    ///
    /// Fails with `NoSuitableHandler` when the task classifies as unknown.
    pub async fn execute_task(&self, task_id: &str) -> Result<JoinHandle<()>> {
        let task = self.backend.find_task(task_id).await?;
        let order = self.dispatcher.route(DispatchRequest::from(&task))?;
        Ok(self.hand_off(order)?)
    }

    // ── Content ─────────────────────────────────────────────────────

    /// Extract drafts from `raw` and persist them.
    pub async fn process_content(
        &self,
        raw: &str,
        metadata: Option<&ContentMetadata>,
    ) -> (ExtractedContent, PersistReport) {
        let content = self.extractor.extract(raw, metadata);
        info!(tasks = content.total_tasks(), summary = %content.summary, "Extracted content");

        let report = persist_extracted(
            self.backend.as_ref(),
            &content,
            &self.config.organization_id,
        )
        .await;
        (content, report)
    }

    /// Parse a raw RFC 822 message, then extract and persist its body.
    ///
    /// `None` when the bytes are not a readable message.
    pub async fn process_email(&self, raw: &[u8]) -> Option<(ExtractedContent, PersistReport)> {
        let email = parse_raw_email(raw)?;
        debug!(sender = ?email.metadata.sender, subject = ?email.metadata.subject, "Parsed email");
        Some(self.process_content(&email.body, Some(&email.metadata)).await)
    }

    // ── Workload ────────────────────────────────────────────────────

    /// Workload over every task, or every task assigned to `assignee`,
    /// as of today.
    pub async fn workload(&self, assignee: Option<&str>) -> Result<WorkloadMetrics> {
        self.workload_on(assignee, chrono::Local::now().date_naive()).await
    }

    /// Workload relative to an explicit `today`.
    pub async fn workload_on(
        &self,
        assignee: Option<&str>,
        today: chrono::NaiveDate,
    ) -> Result<WorkloadMetrics> {
        let mut filter = TaskFilter::default().limit(self.config.task_fetch_limit);
        filter.assignee_id = assignee.map(str::to_string);
        let tasks = collect_tasks(self.backend.as_ref(), &filter, None, |_| true).await?;
        Ok(analyze_workload(&tasks, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::error::Error;
    use crate::routing::handlers::HandlerRegistry;

    fn backend_with(tasks: Vec<Task>) -> Arc<InMemoryBackend> {
        Arc::new(InMemoryBackend::with_tasks(tasks))
    }

    #[tokio::test]
    async fn analyze_builds_orders_and_flags_unknown() {
        let backend = backend_with(vec![
            Task::new("1", "Fix the checkout bug"),
            Task::new("2", "Write the API guide"),
            Task::new("3", "Plan the offsite"),
            Task::new("4", "Fix the header").with_assignee("someone"),
        ]);
        let coordinator = Coordinator::new(backend, RouterConfig::default());

        let report = coordinator.analyze().await.unwrap();
        let handlers: Vec<_> = report.orders.iter().map(|o| o.handler.as_str()).collect();
        assert_eq!(handlers, vec!["Developer", "Writer"]);
        assert_eq!(report.needs_attention.len(), 1);
        assert_eq!(report.needs_attention[0].id, "3");
    }

    #[tokio::test]
    async fn missing_handler_sends_task_to_human() {
        let backend = backend_with(vec![Task::new("1", "Verify the export")]);
        let coordinator = Coordinator::new(backend, RouterConfig::default())
            .with_dispatcher(Dispatcher::new(HandlerRegistry::empty()));

        let report = coordinator.analyze().await.unwrap();
        assert!(report.orders.is_empty());
        assert_eq!(report.needs_attention[0].id, "1");
    }

    #[tokio::test]
    async fn hand_off_without_executor_fails() {
        let backend = backend_with(vec![Task::new("1", "Fix the bug")]);
        let coordinator = Coordinator::new(backend, RouterConfig::default());
        let report = coordinator.analyze().await.unwrap();

        let err = coordinator
            .hand_off(report.orders[0].clone())
            .unwrap_err();
        assert!(matches!(err, DispatchError::HandlerUnavailable { .. }));
    }

    #[tokio::test]
    async fn execute_unknown_task_has_no_handler() {
        let backend = backend_with(vec![Task::new("t-9", "Plan the offsite")]);
        let coordinator =
            Coordinator::new(backend, RouterConfig::default()).with_status_tracking_handlers();

        let err = coordinator.execute_task("t-9").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Dispatch(DispatchError::NoSuitableHandler { ref task_id }) if task_id == "t-9"
        ));
    }

    #[tokio::test]
    async fn run_automation_moves_tasks_to_review() {
        let backend = backend_with(vec![
            Task::new("1", "Fix the checkout bug"),
            Task::new("2", "Investigate churn numbers"),
        ]);
        let coordinator = Coordinator::new(backend.clone(), RouterConfig::default())
            .with_status_tracking_handlers();

        let run = coordinator.run_automation().await.unwrap();
        assert_eq!(run.handoffs.len(), 2);
        assert!(run.undelivered.is_empty());
        futures::future::join_all(run.handoffs).await;

        for task in backend.tasks().await {
            assert_eq!(task.status, TaskStatus::Review, "task {}", task.id);
            assert_eq!(backend.comments_for(&task.id).await.len(), 1);
        }
    }

    #[tokio::test]
    async fn process_content_persists_drafts() {
        let backend = Arc::new(InMemoryBackend::new());
        let coordinator = Coordinator::new(backend.clone(), RouterConfig::default());

        let (content, report) = coordinator
            .process_content("Send the invoice. Book the flights.", None)
            .await;
        assert_eq!(content.total_tasks(), 2);
        assert_eq!(report.created_tasks.len(), 2);
        assert_eq!(backend.tasks().await.len(), 2);
    }

    #[tokio::test]
    async fn process_email_uses_sender_and_date() {
        let backend = Arc::new(InMemoryBackend::new());
        let coordinator = Coordinator::new(backend.clone(), RouterConfig::default());
        let raw = "From: Dana <dana@example.com>\r\n\
Subject: Contract\r\n\
Date: Mon, 3 Jun 2024 09:30:00 +0000\r\n\
Content-Type: text/plain\r\n\
\r\n\
I'll send the signed contract tomorrow.\r\n";

        let (content, report) = coordinator.process_email(raw.as_bytes()).await.unwrap();
        let task = &content.standalone_tasks[0];
        assert_eq!(task.assignee.as_deref(), Some("dana@example.com"));
        assert_eq!(task.due_date, chrono::NaiveDate::from_ymd_opt(2024, 6, 4));
        assert_eq!(report.created_tasks.len(), 1);
    }

    #[tokio::test]
    async fn analyze_pages_past_assigned_todo_tasks() {
        let mut tasks: Vec<_> = (0..100)
            .map(|i| Task::new(format!("owned-{i}"), "Fix something").with_assignee("user-1"))
            .collect();
        tasks.push(Task::new("free", "Fix the crash"));
        let coordinator = Coordinator::new(backend_with(tasks), RouterConfig::default());

        let report = coordinator.analyze().await.unwrap();
        assert_eq!(report.orders.len(), 1);
        assert_eq!(report.orders[0].task_id(), "free");
    }

    #[tokio::test]
    async fn analyze_stops_at_the_fetch_budget() {
        let tasks = (0..30).map(|i| Task::new(format!("t{i}"), "Fix it")).collect();
        let config = RouterConfig {
            task_fetch_limit: 10,
            ..RouterConfig::default()
        };
        let coordinator = Coordinator::new(backend_with(tasks), config);
        assert_eq!(coordinator.analyze().await.unwrap().orders.len(), 10);
    }

    #[tokio::test]
    async fn workload_counts_past_the_fetch_limit() {
        let tasks = (0..150).map(|i| Task::new(i.to_string(), "t")).collect();
        let coordinator = Coordinator::new(backend_with(tasks), RouterConfig::default());
        assert_eq!(coordinator.workload(None).await.unwrap().total_tasks, 150);
    }

    #[tokio::test]
    async fn workload_for_one_assignee() {
        let today = chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let backend = backend_with(vec![
            Task::new("1", "a").with_assignee("bob"),
            Task::new("2", "b")
                .with_assignee("bob")
                .with_due_date(chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            Task::new("3", "c").with_assignee("carol"),
            Task::new("4", "d"),
        ]);
        let coordinator = Coordinator::new(backend, RouterConfig::default());

        let bob = coordinator.workload_on(Some("bob"), today).await.unwrap();
        assert_eq!(bob.total_tasks, 2);
        assert_eq!(bob.overdue, 1);
        let everyone = coordinator.workload_on(None, today).await.unwrap();
        assert_eq!(everyone.total_tasks, 4);
    }

    #[tokio::test]
    async fn workload_counts_everything() {
        let backend = backend_with(vec![
            Task::new("1", "a"),
            Task::new("2", "b").with_status(TaskStatus::Done),
        ]);
        let coordinator = Coordinator::new(backend, RouterConfig::default());
        let metrics = coordinator.workload(None).await.unwrap();
        assert_eq!(metrics.total_tasks, 2);
        assert_eq!(metrics.status_count(TaskStatus::Done), 1);
    }
}
