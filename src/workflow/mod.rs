//! Fan-out / join execution over one shared input bundle.

mod definition;
mod orchestrator;
mod progress;
mod result;
mod state;
mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use definition::WorkflowDefinition;
pub use orchestrator::Orchestrator;
pub use progress::{LoadingStatus, ProgressEvent, ProgressSink, TracingSink};
pub use result::CombinedResult;
pub use state::{RunPhase, TaskResults, WorkflowState};
pub use task::{AnalysisTask, FanOutTask, PartialResult, TaskName, TaskOutcome};
