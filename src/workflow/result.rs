use super::{PartialResult, TaskResults};
use crate::bundle::{InputBundle, VitalSign};
use crate::tasks::{
    ClinicalSummary, LabSummary, PrescriptionSummary, ProgressNoteSummary, RadiologyAnalysis,
    SurgerySummary, VitalsNursingSummary,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Final payload of a completed run. Skipped analyses are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CombinedResult {
    pub progress_notes_summary: Option<ProgressNoteSummary>,
    pub vs_ns_summary: Option<VitalsNursingSummary>,
    pub prescription_summary: Option<PrescriptionSummary>,
    pub lab_summary: Option<LabSummary>,
    pub radiology_summary: Option<RadiologyAnalysis>,
    pub surgery_summary: Option<SurgerySummary>,
    pub clinical_summary: ClinicalSummary,

    /// Raw vital-sign rows, passed through for display
    #[serde(default)]
    pub vital_sign_log: Vec<VitalSign>,
}

impl CombinedResult {
    pub fn assemble(results: TaskResults, clinical: ClinicalSummary, input: &InputBundle) -> Self {
        let mut combined = Self {
            progress_notes_summary: None,
            vs_ns_summary: None,
            prescription_summary: None,
            lab_summary: None,
            radiology_summary: None,
            surgery_summary: None,
            clinical_summary: clinical,
            vital_sign_log: input.vitals.clone(),
        };

        for outcome in results.into_entries().into_values() {
            match outcome.into_produced() {
                Some(PartialResult::Notes(v)) => combined.progress_notes_summary = Some(v),
                Some(PartialResult::VitalsNursing(v)) => combined.vs_ns_summary = Some(v),
                Some(PartialResult::Prescriptions(v)) => combined.prescription_summary = Some(v),
                Some(PartialResult::Labs(v)) => combined.lab_summary = Some(v),
                Some(PartialResult::Radiology(v)) => combined.radiology_summary = Some(*v),
                Some(PartialResult::Surgery(v)) => combined.surgery_summary = Some(v),
                None => {}
            }
        }

        combined
    }

    /// Number of fan-out analyses present in the payload
    pub fn produced_count(&self) -> usize {
        [
            self.progress_notes_summary.is_some(),
            self.vs_ns_summary.is_some(),
            self.prescription_summary.is_some(),
            self.lab_summary.is_some(),
            self.radiology_summary.is_some(),
            self.surgery_summary.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{TaskName, TaskOutcome};

    #[test]
    fn test_assemble_skipped_as_null() {
        let mut results = TaskResults::default();
        results
            .record(TaskName::Labs, TaskOutcome::Produced(LabSummary::default().into()))
            .unwrap();
        results.record(TaskName::Notes, TaskOutcome::Skipped).unwrap();

        let combined =
            CombinedResult::assemble(results, ClinicalSummary::default(), &InputBundle::default());
        assert!(combined.lab_summary.is_some());
        assert_eq!(combined.produced_count(), 1);

        let json = serde_json::to_value(&combined).unwrap();
        assert!(json["progressNotesSummary"].is_null());
        assert!(json["labSummary"].is_object());
        assert!(json["clinicalSummary"].is_object());
    }
}
