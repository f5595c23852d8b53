use super::{PartialResult, TaskName, TaskOutcome};
use crate::bundle::InputBundle;
use crate::error::WorkflowError;
use crate::tasks::{
    LabSummary, PrescriptionSummary, ProgressNoteSummary, RadiologyAnalysis, SurgerySummary,
    VitalsNursingSummary,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    FanOutRunning,
    Joining,
    Completed,
    Failed,
}

impl RunPhase {
    fn can_move_to(self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (RunPhase::Idle, RunPhase::FanOutRunning)
                | (RunPhase::FanOutRunning, RunPhase::Joining)
                | (RunPhase::FanOutRunning, RunPhase::Failed)
                | (RunPhase::Joining, RunPhase::Completed)
                | (RunPhase::Joining, RunPhase::Failed)
        )
    }
}

/// Settled fan-out outcomes, written once per task.
#[derive(Debug, Clone, Default)]
pub struct TaskResults {
    entries: BTreeMap<TaskName, TaskOutcome<PartialResult>>,
}

impl TaskResults {
    pub fn record(
        &mut self,
        task: TaskName,
        outcome: TaskOutcome<PartialResult>,
    ) -> Result<(), WorkflowError> {
        if let TaskOutcome::Produced(value) = &outcome {
            if value.task() != task {
                return Err(WorkflowError::Internal(format!(
                    "{} produced a {} result",
                    task,
                    value.task()
                )));
            }
        }
        if self.entries.contains_key(&task) {
            return Err(WorkflowError::Internal(format!(
                "{} settled more than once",
                task
            )));
        }
        self.entries.insert(task, outcome);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared tasks with no recorded outcome yet
    pub fn missing(&self, declared: &[TaskName]) -> Vec<TaskName> {
        declared
            .iter()
            .copied()
            .filter(|task| !self.entries.contains_key(task))
            .collect()
    }

    pub fn produced_count(&self) -> usize {
        self.entries.values().filter(|o| o.is_produced()).count()
    }

    fn value(&self, task: TaskName) -> Option<&PartialResult> {
        self.entries.get(&task)?.produced()
    }

    pub fn notes(&self) -> Option<&ProgressNoteSummary> {
        match self.value(TaskName::Notes)? {
            PartialResult::Notes(v) => Some(v),
            _ => None,
        }
    }

    pub fn vitals_nursing(&self) -> Option<&VitalsNursingSummary> {
        match self.value(TaskName::VitalsNursing)? {
            PartialResult::VitalsNursing(v) => Some(v),
            _ => None,
        }
    }

    pub fn prescriptions(&self) -> Option<&PrescriptionSummary> {
        match self.value(TaskName::Prescriptions)? {
            PartialResult::Prescriptions(v) => Some(v),
            _ => None,
        }
    }

    pub fn labs(&self) -> Option<&LabSummary> {
        match self.value(TaskName::Labs)? {
            PartialResult::Labs(v) => Some(v),
            _ => None,
        }
    }

    pub fn radiology(&self) -> Option<&RadiologyAnalysis> {
        match self.value(TaskName::Radiology)? {
            PartialResult::Radiology(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn surgery(&self) -> Option<&SurgerySummary> {
        match self.value(TaskName::Surgery)? {
            PartialResult::Surgery(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_entries(self) -> BTreeMap<TaskName, TaskOutcome<PartialResult>> {
        self.entries
    }
}

/// Per-run accumulator owned by the orchestrator.
#[derive(Debug)]
pub struct WorkflowState {
    pub input: Arc<InputBundle>,
    pub results: TaskResults,
    phase: RunPhase,
}

impl WorkflowState {
    pub fn new(input: InputBundle) -> Self {
        Self {
            input: Arc::new(input),
            results: TaskResults::default(),
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn transition(&mut self, next: RunPhase) -> Result<(), WorkflowError> {
        if !self.phase.can_move_to(next) {
            return Err(WorkflowError::Internal(format!(
                "illegal phase change {:?} -> {:?}",
                self.phase, next
            )));
        }
        debug!("Workflow phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Terminal failure is reachable from any running phase
    pub fn fail(&mut self) {
        if matches!(self.phase, RunPhase::FanOutRunning | RunPhase::Joining) {
            debug!("Workflow phase {:?} -> Failed", self.phase);
            self.phase = RunPhase::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_write_once() {
        let mut results = TaskResults::default();
        results.record(TaskName::Notes, TaskOutcome::Skipped).unwrap();
        let err = results
            .record(TaskName::Notes, TaskOutcome::Skipped)
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_record_rejects_mismatched_value() {
        let mut results = TaskResults::default();
        let err = results
            .record(TaskName::Notes, TaskOutcome::Produced(LabSummary::default().into()))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Internal(_)));
    }

    #[test]
    fn test_typed_accessors_and_counts() {
        let mut results = TaskResults::default();
        results
            .record(TaskName::Labs, TaskOutcome::Produced(LabSummary::default().into()))
            .unwrap();
        results.record(TaskName::Notes, TaskOutcome::Skipped).unwrap();

        assert!(results.labs().is_some());
        assert!(results.notes().is_none());
        assert!(results.radiology().is_none());
        assert!(results.surgery().is_none());
        assert_eq!(results.produced_count(), 1);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results.missing(&[TaskName::Notes, TaskName::Labs, TaskName::Surgery]),
            vec![TaskName::Surgery]
        );
    }

    #[test]
    fn test_phase_transitions() {
        let mut state = WorkflowState::new(InputBundle::default());
        assert!(state.transition(RunPhase::Joining).is_err());
        state.transition(RunPhase::FanOutRunning).unwrap();
        state.transition(RunPhase::Joining).unwrap();
        state.fail();
        assert_eq!(state.phase(), RunPhase::Failed);
        assert!(state.transition(RunPhase::Completed).is_err());
    }
}
