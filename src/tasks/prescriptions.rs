use super::RiskLevel;
use crate::bundle::{render, InputBundle};
use crate::error::WorkflowError;
use crate::provider::{complete_structured, CompletionPort, ModelTier};
use crate::workflow::{AnalysisTask, TaskName};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SYSTEM_PROMPT: &str = include_str!("../../prompts/prescriptions.md");
const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MajorMedication {
    pub medication_name: String,
    /// Amount per administration
    pub dose: f64,
    /// Administrations per day
    pub frequency: u32,
    pub total_days: u32,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MajorDiagnosis {
    pub diagnosis_name: String,
    #[serde(default)]
    pub icd_code: String,
    /// yyyy-MM-dd
    #[serde(default)]
    pub start_date: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InteractionSeverity {
    #[default]
    Minor,
    Moderate,
    Major,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrugInteractionAlert {
    pub drugs: Vec<String>,
    /// e.g. synergistic or antagonistic
    pub interaction_type: String,
    pub clinical_impact: String,
    pub severity: InteractionSeverity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionFinding {
    /// e.g. burden index, polypharmacy, PRN pattern
    pub category: String,
    pub finding: String,
    pub severity: RiskLevel,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionSummary {
    #[serde(default)]
    pub major_medications: Vec<MajorMedication>,
    #[serde(default)]
    pub major_diagnoses: Vec<MajorDiagnosis>,

    /// 0-100, higher means heavier burden
    #[schemars(range(min = 0, max = 100))]
    pub medication_burden_index: f64,
    pub polypharmacy_analysis: String,
    pub prn_pattern_analysis: String,

    #[serde(default)]
    pub drug_interaction_alerts: Vec<DrugInteractionAlert>,

    /// Diagnosis name to appropriateness assessment
    #[serde(default)]
    pub prescribing_appropriateness: BTreeMap<String, String>,

    /// Comorbidity or complication signals implied by the medication list
    #[serde(default)]
    pub hidden_risk_signals: Vec<String>,

    #[serde(default)]
    pub analysis_details: Vec<PrescriptionFinding>,

    pub overall_assessment: String,

    /// At most five, highest priority first
    #[serde(default)]
    #[schemars(length(max = 5))]
    pub priority_recommendations: Vec<String>,
}

/// Medications and diagnoses read against the subject profile.
pub struct PrescriptionsTask;

#[async_trait]
impl AnalysisTask for PrescriptionsTask {
    type Output = PrescriptionSummary;

    fn name(&self) -> TaskName {
        TaskName::Prescriptions
    }

    fn applies(&self, bundle: &InputBundle) -> bool {
        !bundle.medications.is_empty()
            || !bundle.diagnosis_records.is_empty()
            || bundle.subject_profile.is_some()
    }

    async fn analyze(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<PrescriptionSummary, WorkflowError> {
        let prompt = format!(
            "# Subject\n{}\n\n---\n# Medications\n{}\n\n---\n# Diagnosis records\n{}",
            render::profile(bundle.subject_profile.as_ref()),
            render::medications(&bundle.medications),
            render::diagnoses(&bundle.diagnosis_records)
        );

        let mut summary: PrescriptionSummary = complete_structured(
            port,
            TaskName::Prescriptions,
            ModelTier::Standard,
            SYSTEM_PROMPT,
            prompt,
        )
        .await?;

        summary.medication_burden_index = summary.medication_burden_index.clamp(0.0, 100.0);
        summary.priority_recommendations.truncate(MAX_RECOMMENDATIONS);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Medication, SubjectProfile};
    use crate::workflow::testing::StubCompletion;

    #[tokio::test]
    async fn test_profile_alone_is_enough() {
        let bundle = InputBundle {
            subject_profile: Some(SubjectProfile {
                name: "Lee".into(),
                age: "64".into(),
                ..SubjectProfile::default()
            }),
            ..InputBundle::default()
        };
        let port = StubCompletion::with_defaults();

        let outcome = PrescriptionsTask.run(&bundle, &port).await.unwrap();
        assert!(outcome.is_produced());

        let prompt = &port.prompts_for("PrescriptionSummary")[0];
        assert!(prompt.contains("- Age: 64"));
        assert!(prompt.contains("no diagnosis records"));
    }

    #[tokio::test]
    async fn test_burden_index_and_recommendations_are_bounded() {
        let bundle = InputBundle {
            medications: vec![Medication {
                medication_name: "Warfarin".into(),
                ..Medication::default()
            }],
            ..InputBundle::default()
        };
        let port = StubCompletion::with_defaults().respond(PrescriptionSummary {
            medication_burden_index: 140.0,
            priority_recommendations: (0..9).map(|i| format!("step {}", i)).collect(),
            ..PrescriptionSummary::default()
        });

        let summary = PrescriptionsTask
            .run(&bundle, &port)
            .await
            .unwrap()
            .into_produced()
            .unwrap();
        assert_eq!(summary.medication_burden_index, 100.0);
        assert_eq!(summary.priority_recommendations.len(), 5);
    }
}
