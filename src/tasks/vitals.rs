use super::{Confidence, Priority, RiskLevel};
use crate::bundle::{render, InputBundle};
use crate::error::WorkflowError;
use crate::provider::{complete_structured, CompletionPort, ModelTier};
use crate::workflow::{AnalysisTask, TaskName};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = include_str!("../../prompts/vitals_nursing.md");
const MAX_OBSERVATIONS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VitalTrend {
    Stable,
    Increasing,
    Decreasing,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalDetail {
    /// Vital sign name
    pub vital_sign: String,
    pub recent_value: String,
    /// Recent change described in words
    pub trend: String,
    #[serde(default)]
    pub trend_level: VitalTrend,
    /// Notable remark such as a record high or hypotension warning
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarePlan {
    /// Nursing category title, e.g. mental health or physical health
    pub ns_category: String,
    pub care_plan: String,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PredictionWindow {
    #[default]
    #[serde(rename = "24-48h")]
    Hours24To48,
    #[serde(rename = "3-7d")]
    Days3To7,
    #[serde(rename = "1-4w")]
    Weeks1To4,
    #[serde(rename = "long_term")]
    LongTerm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalPrediction {
    pub timeframe: PredictionWindow,
    /// Main expected risk, e.g. relapse, fall or infection
    pub predicted_risk: String,
    pub confidence: Confidence,
    /// Vital trends, behaviour patterns or history behind the prediction
    pub rationale: String,
    pub recommended_action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalsNursingSummary {
    /// Overall vital-sign score, 1 (critical) to 5 (stable)
    #[schemars(range(min = 1, max = 5))]
    pub vs_score: u8,
    pub vs_summary: String,
    #[serde(default)]
    pub vs_details: Vec<VitalDetail>,
    /// Notes for the physician
    #[serde(default)]
    pub vs_notes: Vec<String>,

    pub ns_summary: String,
    #[serde(default)]
    pub ns_care_plans: Vec<CarePlan>,
    /// Key nursing observations, at most five
    #[serde(default)]
    #[schemars(length(max = 5))]
    pub ns_observation_details: Vec<String>,

    #[serde(default)]
    pub clinical_predictions: Vec<ClinicalPrediction>,
    pub overall_risk_level: RiskLevel,
    /// The one recommendation the care team must see
    pub key_recommendation: String,
}

/// Vital signs and nursing records; either alone is enough to run.
pub struct VitalsNursingTask;

#[async_trait]
impl AnalysisTask for VitalsNursingTask {
    type Output = VitalsNursingSummary;

    fn name(&self) -> TaskName {
        TaskName::VitalsNursing
    }

    fn applies(&self, bundle: &InputBundle) -> bool {
        !bundle.vitals.is_empty() || !bundle.nursing_records.is_empty()
    }

    async fn analyze(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<VitalsNursingSummary, WorkflowError> {
        let prompt = format!(
            "# Vital signs\n{}\n\n---\n# Nursing records\n{}",
            render::vitals(&bundle.vitals),
            render::nursing(&bundle.nursing_records)
        );

        let mut summary: VitalsNursingSummary = complete_structured(
            port,
            TaskName::VitalsNursing,
            ModelTier::Standard,
            SYSTEM_PROMPT,
            prompt,
        )
        .await?;

        summary.vs_score = summary.vs_score.clamp(1, 5);
        summary.ns_observation_details.truncate(MAX_OBSERVATIONS);
        Ok(summary)
    }
}
