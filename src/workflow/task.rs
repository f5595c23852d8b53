use crate::bundle::InputBundle;
use crate::error::WorkflowError;
use crate::provider::CompletionPort;
use crate::tasks::{
    LabSummary, PrescriptionSummary, ProgressNoteSummary, RadiologyAnalysis, SurgerySummary,
    VitalsNursingSummary,
};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed identifiers for every task in the workflow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskName {
    Notes,
    VitalsNursing,
    Prescriptions,
    Labs,
    Radiology,
    Surgery,
    /// The join step; never reported by a fan-out completion
    ClinicalSummary,
}

impl TaskName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::Notes => "notes",
            TaskName::VitalsNursing => "vitals_nursing",
            TaskName::Prescriptions => "prescriptions",
            TaskName::Labs => "labs",
            TaskName::Radiology => "radiology",
            TaskName::Surgery => "surgery",
            TaskName::ClinicalSummary => "clinical_summary",
        }
    }

    /// Section title used when the task's result is quoted in a prompt
    pub fn heading(&self) -> &'static str {
        match self {
            TaskName::Notes => "Progress note summary",
            TaskName::VitalsNursing => "Vital signs and nursing summary",
            TaskName::Prescriptions => "Prescription and diagnosis analysis",
            TaskName::Labs => "Lab analysis",
            TaskName::Radiology => "Radiology analysis",
            TaskName::Surgery => "Surgical context",
            TaskName::ClinicalSummary => "Clinical summary",
        }
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a task settled. `Skipped` means its guard found nothing to analyze;
/// it is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Produced(T),
    Skipped,
}

impl<T> TaskOutcome<T> {
    pub fn is_produced(&self) -> bool {
        matches!(self, TaskOutcome::Produced(_))
    }

    pub fn produced(&self) -> Option<&T> {
        match self {
            TaskOutcome::Produced(value) => Some(value),
            TaskOutcome::Skipped => None,
        }
    }

    pub fn into_produced(self) -> Option<T> {
        match self {
            TaskOutcome::Produced(value) => Some(value),
            TaskOutcome::Skipped => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TaskOutcome<U> {
        match self {
            TaskOutcome::Produced(value) => TaskOutcome::Produced(f(value)),
            TaskOutcome::Skipped => TaskOutcome::Skipped,
        }
    }
}

/// The value a fan-out task produced, one variant per task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PartialResult {
    Notes(ProgressNoteSummary),
    VitalsNursing(VitalsNursingSummary),
    Prescriptions(PrescriptionSummary),
    Labs(LabSummary),
    Radiology(Box<RadiologyAnalysis>),
    Surgery(SurgerySummary),
}

impl PartialResult {
    pub fn task(&self) -> TaskName {
        match self {
            PartialResult::Notes(_) => TaskName::Notes,
            PartialResult::VitalsNursing(_) => TaskName::VitalsNursing,
            PartialResult::Prescriptions(_) => TaskName::Prescriptions,
            PartialResult::Labs(_) => TaskName::Labs,
            PartialResult::Radiology(_) => TaskName::Radiology,
            PartialResult::Surgery(_) => TaskName::Surgery,
        }
    }
}

impl From<ProgressNoteSummary> for PartialResult {
    fn from(value: ProgressNoteSummary) -> Self {
        PartialResult::Notes(value)
    }
}

impl From<VitalsNursingSummary> for PartialResult {
    fn from(value: VitalsNursingSummary) -> Self {
        PartialResult::VitalsNursing(value)
    }
}

impl From<PrescriptionSummary> for PartialResult {
    fn from(value: PrescriptionSummary) -> Self {
        PartialResult::Prescriptions(value)
    }
}

impl From<LabSummary> for PartialResult {
    fn from(value: LabSummary) -> Self {
        PartialResult::Labs(value)
    }
}

impl From<RadiologyAnalysis> for PartialResult {
    fn from(value: RadiologyAnalysis) -> Self {
        PartialResult::Radiology(Box::new(value))
    }
}

impl From<SurgerySummary> for PartialResult {
    fn from(value: SurgerySummary) -> Self {
        PartialResult::Surgery(value)
    }
}

/// A guarded unit of analysis over the shared bundle.
///
/// Tasks only read the bundle and return their value; the orchestrator
/// records it. Completion failures are not caught here.
#[async_trait]
pub trait AnalysisTask: Send + Sync {
    type Output: Send;

    fn name(&self) -> TaskName;

    /// Does the bundle hold anything this task can analyze?
    fn applies(&self, bundle: &InputBundle) -> bool;

    async fn analyze(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<Self::Output, WorkflowError>;

    async fn run(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<TaskOutcome<Self::Output>, WorkflowError> {
        if !self.applies(bundle) {
            debug!("{} skipped - no applicable records", self.name());
            return Ok(TaskOutcome::Skipped);
        }
        self.analyze(bundle, port).await.map(TaskOutcome::Produced)
    }
}

/// Type-erased task the orchestrator can hold in one registry.
#[async_trait]
pub trait FanOutTask: Send + Sync {
    fn id(&self) -> TaskName;

    async fn settle(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<TaskOutcome<PartialResult>, WorkflowError>;
}

#[async_trait]
impl<T> FanOutTask for T
where
    T: AnalysisTask,
    T::Output: Into<PartialResult> + 'static,
{
    fn id(&self) -> TaskName {
        self.name()
    }

    async fn settle(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<TaskOutcome<PartialResult>, WorkflowError> {
        Ok(self.run(bundle, port).await?.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_name_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskName::VitalsNursing).unwrap(),
            "\"vitals_nursing\""
        );
        assert_eq!(TaskName::ClinicalSummary.to_string(), "clinical_summary");
    }

    #[test]
    fn test_outcome_helpers() {
        let produced: TaskOutcome<u8> = TaskOutcome::Produced(3);
        assert!(produced.is_produced());
        assert_eq!(produced.clone().map(|v| v * 2), TaskOutcome::Produced(6));
        assert_eq!(produced.into_produced(), Some(3));

        let skipped: TaskOutcome<u8> = TaskOutcome::Skipped;
        assert!(skipped.produced().is_none());
    }

    #[test]
    fn test_partial_result_task() {
        let result: PartialResult = LabSummary::default().into();
        assert_eq!(result.task(), TaskName::Labs);
        assert_eq!(result.task().heading(), "Lab analysis");
    }
}
