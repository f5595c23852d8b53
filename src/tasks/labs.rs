use super::Priority;
use crate::bundle::{render, Dated, InputBundle};
use crate::error::WorkflowError;
use crate::provider::{complete_structured, CompletionPort, ModelTier};
use crate::workflow::{AnalysisTask, TaskName};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = include_str!("../../prompts/labs.md");
const MAX_KEY_FINDINGS: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LabStatus {
    #[default]
    Normal,
    Up,
    Down,
    CriticalUp,
    CriticalDown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabDetail {
    pub test_name: String,
    #[serde(default)]
    pub sub_test_name: String,
    pub result_value: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub normal_range: String,
    pub status: LabStatus,
    /// Suggested interpretation
    #[serde(default)]
    pub ai_comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabGroupDetail {
    /// e.g. complete blood count, liver function
    pub test_group_name: String,
    #[serde(default)]
    pub labs: Vec<LabDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabGroup {
    /// yyyy-MM-dd
    pub date: String,
    #[serde(default)]
    pub group_details: Vec<LabGroupDetail>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviationSeverity {
    #[default]
    Mild,
    Moderate,
    Severe,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabAbnormalityAlert {
    pub test_name: String,
    pub result_value: String,
    #[serde(default)]
    pub normal_range: String,
    pub deviation_severity: DeviationSeverity,
    pub clinical_significance: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LabTrendDirection {
    Improving,
    Stable,
    Worsening,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabTrend {
    pub test_name: String,
    pub recent_value: String,
    pub previous_value: Option<String>,
    pub trend_direction: LabTrendDirection,
    pub trend_description: String,
    /// e.g. 150% of the upper normal limit
    pub comparison_with_normal: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Routine,
    Soon,
    Urgent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabImplication {
    /// e.g. liver, renal, glucose metabolism
    pub category: String,
    pub summary: String,
    #[serde(default)]
    #[schemars(length(max = 4))]
    pub key_findings: Vec<String>,
    pub clinical_assessment: String,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LabRiskLevel {
    #[default]
    Normal,
    Caution,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabSummary {
    /// Major labs grouped by date and test group
    #[serde(default)]
    pub major_labs: Vec<LabGroup>,
    /// Abnormal results, highest priority first
    #[serde(default)]
    pub abnormality_alerts: Vec<LabAbnormalityAlert>,
    #[serde(default)]
    pub trend_analyses: Vec<LabTrend>,
    #[serde(default)]
    pub clinical_implications: Vec<LabImplication>,
    pub overall_assessment: String,
    /// Single most important action for the care team
    pub priority_recommendation: String,
    pub lab_risk_level: LabRiskLevel,
    /// Date of the newest result in the bundle (yyyy-MM-dd)
    #[serde(default)]
    pub latest_test_date: String,
    /// Number of results in the bundle
    #[serde(default)]
    pub test_count: usize,
}

/// Lab results read against the subject's current diagnoses.
pub struct LabsTask;

#[async_trait]
impl AnalysisTask for LabsTask {
    type Output = LabSummary;

    fn name(&self) -> TaskName {
        TaskName::Labs
    }

    fn applies(&self, bundle: &InputBundle) -> bool {
        !bundle.lab_results.is_empty()
    }

    async fn analyze(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<LabSummary, WorkflowError> {
        let Some(latest) = bundle.lab_results.iter().max_by_key(|lab| lab.sort_key()) else {
            return Err(WorkflowError::GuardInconsistency {
                task: TaskName::Labs,
                detail: "no lab results to analyze".to_string(),
            });
        };
        let latest_test_date = latest.display_time();
        let test_count = bundle.lab_results.len();

        let diagnoses = bundle
            .latest_diagnoses()
            .map(render::diagnosis_list)
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| "no diagnosis records".to_string());

        let prompt = format!(
            "# Subject\n{}\n\n---\n# Current diagnoses\n{}\n\n---\n# Lab results\n{}\n\n---\n\
            Latest test date: {}\nNumber of results: {}",
            render::profile(bundle.subject_profile.as_ref()),
            diagnoses,
            render::labs(&bundle.lab_results),
            latest_test_date,
            test_count
        );

        let mut summary: LabSummary = complete_structured(
            port,
            TaskName::Labs,
            ModelTier::Standard,
            SYSTEM_PROMPT,
            prompt,
        )
        .await?;

        summary.latest_test_date = latest_test_date;
        summary.test_count = test_count;
        summary.abnormality_alerts.sort_by_key(|alert| alert.priority);
        for implication in &mut summary.clinical_implications {
            implication.key_findings.truncate(MAX_KEY_FINDINGS);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Diagnosis, DiagnosisRecord, LabResult};
    use crate::workflow::testing::StubCompletion;

    fn lab(ymd: &str, name: &str) -> LabResult {
        LabResult {
            ymd: ymd.into(),
            test_name: name.into(),
            result_value: "1.0".into(),
            ..LabResult::default()
        }
    }

    fn alert(name: &str, priority: Priority) -> LabAbnormalityAlert {
        LabAbnormalityAlert {
            test_name: name.into(),
            priority,
            ..LabAbnormalityAlert::default()
        }
    }

    #[tokio::test]
    async fn test_date_and_count_come_from_bundle() {
        let bundle = InputBundle {
            lab_results: vec![lab("20240210", "Cr"), lab("20240301", "Hb"), lab("20240115", "Plt")],
            ..InputBundle::default()
        };
        let port = StubCompletion::with_defaults().respond(LabSummary {
            latest_test_date: "1999-01-01".into(),
            test_count: 42,
            ..LabSummary::default()
        });

        let summary = LabsTask
            .run(&bundle, &port)
            .await
            .unwrap()
            .into_produced()
            .unwrap();
        assert_eq!(summary.latest_test_date, "2024-03-01");
        assert_eq!(summary.test_count, 3);
    }

    #[tokio::test]
    async fn test_alerts_sorted_by_priority() {
        let bundle = InputBundle {
            lab_results: vec![lab("20240301", "Hb")],
            ..InputBundle::default()
        };
        let port = StubCompletion::with_defaults().respond(LabSummary {
            abnormality_alerts: vec![
                alert("Plt", Priority::Low),
                alert("K", Priority::High),
                alert("Hb", Priority::Medium),
            ],
            ..LabSummary::default()
        });

        let summary = LabsTask
            .run(&bundle, &port)
            .await
            .unwrap()
            .into_produced()
            .unwrap();
        let names: Vec<_> = summary
            .abnormality_alerts
            .iter()
            .map(|a| a.test_name.as_str())
            .collect();
        assert_eq!(names, vec!["K", "Hb", "Plt"]);
    }

    #[tokio::test]
    async fn test_prompt_uses_latest_diagnoses() {
        let record = |ymd: &str, name: &str| DiagnosisRecord {
            ymd: ymd.into(),
            diagnoses: vec![Diagnosis {
                diagnosis_name: name.into(),
                icd_code: "X00".into(),
            }],
        };
        let bundle = InputBundle {
            lab_results: vec![lab("20240301", "Hb")],
            diagnosis_records: vec![record("20240301", "Anemia"), record("20230101", "Sprain")],
            ..InputBundle::default()
        };
        let port = StubCompletion::with_defaults();

        LabsTask.run(&bundle, &port).await.unwrap();
        let prompt = &port.prompts_for("LabSummary")[0];
        assert!(prompt.contains("Anemia (X00)"));
        assert!(!prompt.contains("Sprain"));
    }
}
