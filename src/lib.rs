//! Task router — classify work, pick what can be automated, hand it to
//! the right handler, and turn free text into task and project drafts.

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod routing;
pub mod tasks;

pub use coordinator::{AnalysisReport, AutomationRun, Coordinator};
pub use error::{Error, Result};
