//! Task and project records shared by every stage of the router.

pub mod model;
pub mod workload;

pub use model::{Comment, Priority, Project, ProjectStatus, Task, TaskStatus};
pub use workload::{WorkloadMetrics, analyze_workload};
