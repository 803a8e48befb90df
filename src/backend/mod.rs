//! Storage collaborator — the trait the router talks to, plus the HTTP
//! and in-memory implementations.

pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpBackend;
pub use memory::InMemoryBackend;
pub use traits::{NewProject, NewTask, TaskBackend, TaskFilter, TaskUpdate, collect_tasks};
