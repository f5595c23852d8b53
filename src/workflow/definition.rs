use super::{FanOutTask, TaskName};
use crate::config::Config;
use crate::error::DefinitionError;
use crate::tasks::{
    ClinicalSummaryTask, LabsTask, NotesTask, PrescriptionsTask, RadiologyTask, SurgeryTask,
    VitalsNursingTask,
};
use std::collections::HashSet;
use std::sync::Arc;

/// The task graph for a run: every fan-out task feeds the single join task.
///
/// Adding an analysis means adding one entry to [`WorkflowDefinition::standard`].
pub struct WorkflowDefinition {
    fan_out: Vec<Arc<dyn FanOutTask>>,
    join: ClinicalSummaryTask,
}

impl WorkflowDefinition {
    pub fn new(
        fan_out: Vec<Arc<dyn FanOutTask>>,
        join: ClinicalSummaryTask,
    ) -> Result<Self, DefinitionError> {
        if fan_out.is_empty() {
            return Err(DefinitionError::Empty);
        }

        let mut seen = HashSet::new();
        for task in &fan_out {
            let id = task.id();
            if id == TaskName::ClinicalSummary {
                return Err(DefinitionError::ReservedName(id));
            }
            if !seen.insert(id) {
                return Err(DefinitionError::DuplicateTask(id));
            }
        }

        Ok(Self { fan_out, join })
    }

    /// The six standard analyses joined into one clinical summary
    pub fn standard(config: &Config) -> Result<Self, DefinitionError> {
        let fan_out: Vec<Arc<dyn FanOutTask>> = vec![
            Arc::new(NotesTask),
            Arc::new(VitalsNursingTask),
            Arc::new(PrescriptionsTask),
            Arc::new(LabsTask),
            Arc::new(RadiologyTask),
            Arc::new(SurgeryTask::new(&config.surgery)?),
        ];
        Self::new(fan_out, ClinicalSummaryTask)
    }

    pub fn fan_out(&self) -> &[Arc<dyn FanOutTask>] {
        &self.fan_out
    }

    pub fn task_names(&self) -> Vec<TaskName> {
        self.fan_out.iter().map(|task| task.id()).collect()
    }

    pub fn join(&self) -> &ClinicalSummaryTask {
        &self.join
    }
}
