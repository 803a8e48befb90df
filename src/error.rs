//! Error types for the task router.

use crate::tasks::model::TaskStatus;

/// Top-level error type for the router.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures reported by the storage collaborator.
///
/// The collaborator's own detail is carried verbatim. Nothing here is
/// retried by the router.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request for {action} failed: {reason}")]
    RequestFailed { action: String, reason: String },

    #[error("Upstream rejected {action} with status {status}: {body}")]
    Upstream {
        action: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response for {action}: {reason}")]
    InvalidResponse { action: String, reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

/// Dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The task's category has no registered handler. The caller must
    /// route the task to a human.
    #[error("No suitable handler for task {task_id}")]
    NoSuitableHandler { task_id: String },

    #[error("Handler {handler} has no executor attached")]
    HandlerUnavailable { handler: String },
}

/// Task record errors.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// Errors raised while a handler executes a work order.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler {handler} failed on task {task_id}: {reason}")]
    ExecutionFailed {
        handler: String,
        task_id: String,
        reason: String,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),
}

/// Result type alias for the router.
pub type Result<T> = std::result::Result<T, Error>;
