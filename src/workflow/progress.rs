use super::TaskName;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoadingStatus {
    Processing,
    Done,
}

/// One progress notification. `complete_target` names the task that just
/// settled; it is empty for the run-start and run-end events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub status: LoadingStatus,
    pub complete_target: Option<TaskName>,
}

impl ProgressEvent {
    pub fn started() -> Self {
        Self {
            status: LoadingStatus::Processing,
            complete_target: None,
        }
    }

    pub fn settled(task: TaskName) -> Self {
        Self {
            status: LoadingStatus::Done,
            complete_target: Some(task),
        }
    }

    pub fn finished() -> Self {
        Self {
            status: LoadingStatus::Done,
            complete_target: None,
        }
    }
}

/// Receives progress events in the order the orchestrator issues them.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Logs events instead of delivering them anywhere
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, event: ProgressEvent) {
        match event.complete_target {
            Some(task) => info!("progress: {} settled", task),
            None => info!("progress: {:?}", event.status),
        }
    }
}
