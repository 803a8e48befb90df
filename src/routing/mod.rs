//! Routing — classify tasks, pick the automatable ones, and build work
//! orders for the handler that owns each category.

pub mod classifier;
pub mod dispatcher;
pub mod executor;
pub mod handlers;
pub mod suitability;

pub use classifier::{Category, classify, classify_task};
pub use dispatcher::{DispatchRequest, Dispatcher, WorkOrder};
pub use executor::{HandlerReport, StatusTrackingHandler, WorkHandler};
pub use handlers::{HandlerRegistry, HandlerSpec};
pub use suitability::{AutomationPlan, find_automatable};
