use super::RiskLevel;
use crate::bundle::{render, SubjectProfile};
use crate::error::WorkflowError;
use crate::provider::{complete_structured, CompletionPort, ModelTier};
use crate::workflow::{TaskName, TaskResults};
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SYSTEM_PROMPT: &str = include_str!("../../prompts/clinical_summary.md");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OverallCondition {
    #[default]
    Stable,
    Improving,
    Declining,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionRisk {
    #[default]
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientStatusOverview {
    pub overall_condition: OverallCondition,
    pub acuity_level: RiskLevel,
    /// Risk of admission or deterioration
    pub admission_risk: AdmissionRisk,
    /// One or two sentences
    pub key_status_summary: String,
}

/// Alert urgency, most urgent first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Urgent,
    Warning,
    Attention,
    #[default]
    Info,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    VitalSign,
    Medication,
    Lab,
    Radiology,
    #[default]
    Clinical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriorityAlert {
    pub alert_type: AlertType,
    pub category: AlertCategory,
    pub title: String,
    pub message: String,
    /// Analysis the alert comes from, e.g. vital signs or lab results
    pub source: String,
    pub recommended_action: String,
    /// e.g. immediately, within 24 hours
    pub time_sensitivity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisSummary {
    pub primary_diagnosis: String,
    pub icd_code: Option<String>,
    #[serde(default)]
    pub secondary_diagnoses: Vec<String>,
    /// Suspected conditions or complications
    #[serde(default)]
    pub suspected_conditions: Vec<String>,
    pub disease_stage: Option<String>,
    pub prognosis_outlook: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentCategory {
    Medication,
    Procedure,
    #[default]
    Monitoring,
    Consultation,
    Lifestyle,
    FollowUp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TreatmentHorizon {
    Immediate,
    #[default]
    ShortTerm,
    LongTerm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentPlanItem {
    pub category: TreatmentCategory,
    pub priority: TreatmentHorizon,
    pub description: String,
    pub rationale: String,
    pub expected_outcome: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentPlanSummary {
    pub current_treatment_summary: String,
    #[serde(default)]
    pub medication_adjustments: Vec<String>,
    #[serde(default)]
    pub planned_items: Vec<TreatmentPlanItem>,
    #[serde(default)]
    pub follow_up_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskIndicator {
    /// e.g. cardiovascular, infection, falls
    pub risk_category: String,
    pub risk_level: RiskLevel,
    /// 0-100
    pub risk_score: Option<u32>,
    #[serde(default)]
    pub contributing_factors: Vec<String>,
    pub mitigation_strategy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskDashboard {
    pub overall_risk_level: RiskLevel,
    /// 0-100
    #[schemars(range(min = 0, max = 100))]
    pub risk_score: u32,
    #[serde(default)]
    pub risk_indicators: Vec<RiskIndicator>,
    #[serde(default)]
    pub time_sensitive_risks: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParameterTrend {
    Improving,
    #[default]
    Stable,
    Declining,
    Fluctuating,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysisItem {
    /// e.g. blood pressure, renal function
    pub parameter: String,
    pub trend_direction: ParameterTrend,
    pub recent_change: String,
    pub clinical_significance: String,
    pub projection: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Trajectory {
    Improving,
    #[default]
    Stable,
    Declining,
    Mixed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalTrendSummary {
    pub overall_trajectory: Trajectory,
    #[serde(default)]
    pub key_trends: Vec<TrendAnalysisItem>,
    #[serde(default)]
    pub trend_concerns: Vec<String>,
    #[serde(default)]
    pub positive_indicators: Vec<String>,
}

/// Recommendation priority, highest first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Diagnostic,
    Therapeutic,
    #[default]
    Monitoring,
    Consultation,
    PatientEducation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalRecommendation {
    pub priority: RecommendationPriority,
    pub category: RecommendationCategory,
    pub recommendation: String,
    pub rationale: String,
    /// e.g. immediately, within 24 hours, next visit
    pub timeframe: String,
    pub expected_benefit: String,
}

/// SBAR handoff between clinicians
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HandoffSummary {
    pub situation: String,
    pub background: String,
    pub assessment: String,
    pub recommendation: String,
    #[serde(default)]
    pub watch_list: Vec<String>,
    #[serde(default)]
    pub pending_items: Vec<String>,
}

/// How many fan-out analyses fed the join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataCompleteness {
    Complete,
    Partial,
    #[default]
    Limited,
}

impl DataCompleteness {
    /// Four or more produced analyses is complete, two or three partial.
    pub fn classify(produced: usize) -> Self {
        match produced {
            0..=1 => DataCompleteness::Limited,
            2..=3 => DataCompleteness::Partial,
            _ => DataCompleteness::Complete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataCompleteness::Complete => "complete",
            DataCompleteness::Partial => "partial",
            DataCompleteness::Limited => "limited",
        }
    }
}

impl std::fmt::Display for DataCompleteness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalSummary {
    pub patient_status: PatientStatusOverview,
    /// Most urgent first
    #[serde(default)]
    pub priority_alerts: Vec<PriorityAlert>,
    pub diagnosis_summary: DiagnosisSummary,
    pub risk_dashboard: RiskDashboard,
    pub clinical_trends: ClinicalTrendSummary,
    pub treatment_plan: TreatmentPlanSummary,
    /// Highest priority first
    #[serde(default)]
    pub key_recommendations: Vec<ClinicalRecommendation>,
    pub handoff_summary: HandoffSummary,
    /// RFC 3339, set when the summary is produced
    #[serde(default)]
    pub analysis_timestamp: String,
    #[schemars(range(min = 0, max = 100))]
    pub confidence_score: u32,
    #[serde(default)]
    pub data_completeness: DataCompleteness,
    /// One line for display next to the subject's name
    pub one_liner: String,
}

fn quote<T: Serialize>(
    prompt: &mut String,
    task: TaskName,
    value: Option<&T>,
) -> Result<(), WorkflowError> {
    let Some(value) = value else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| WorkflowError::Internal(format!("failed to serialize {}: {}", task, e)))?;
    prompt.push_str(&format!("\n## {}\n```json\n{}\n```\n", task.heading(), json));
    Ok(())
}

/// The join step: one consolidated call over every produced analysis.
pub struct ClinicalSummaryTask;

impl ClinicalSummaryTask {
    pub fn name(&self) -> TaskName {
        TaskName::ClinicalSummary
    }

    /// Quote each produced analysis under its heading; skipped ones are left out.
    fn prompt(
        results: &TaskResults,
        profile: Option<&SubjectProfile>,
        completeness: DataCompleteness,
    ) -> Result<String, WorkflowError> {
        let produced = results.produced_count();
        let mut prompt = format!(
            "# Subject\n{}\n\nData completeness: {} ({} of {} analyses available)\n",
            render::profile(profile),
            completeness,
            produced,
            results.len()
        );

        if produced == 0 {
            prompt.push_str("\nNo analysis produced output. Base the summary on the profile alone.\n");
        }

        quote(&mut prompt, TaskName::Notes, results.notes())?;
        quote(&mut prompt, TaskName::VitalsNursing, results.vitals_nursing())?;
        quote(&mut prompt, TaskName::Prescriptions, results.prescriptions())?;
        quote(&mut prompt, TaskName::Labs, results.labs())?;
        quote(&mut prompt, TaskName::Radiology, results.radiology())?;
        quote(&mut prompt, TaskName::Surgery, results.surgery())?;

        Ok(prompt)
    }

    pub async fn run(
        &self,
        results: &TaskResults,
        profile: Option<&SubjectProfile>,
        port: &dyn CompletionPort,
    ) -> Result<ClinicalSummary, WorkflowError> {
        let completeness = DataCompleteness::classify(results.produced_count());
        debug!(
            "Joining {} produced analyses ({})",
            results.produced_count(),
            completeness
        );

        let prompt = Self::prompt(results, profile, completeness)?;
        let mut summary: ClinicalSummary = complete_structured(
            port,
            TaskName::ClinicalSummary,
            ModelTier::Standard,
            SYSTEM_PROMPT,
            prompt,
        )
        .await?;

        summary.data_completeness = completeness;
        summary.priority_alerts.sort_by_key(|alert| alert.alert_type);
        summary
            .key_recommendations
            .sort_by_key(|recommendation| recommendation.priority);
        summary.confidence_score = summary.confidence_score.min(100);
        summary.risk_dashboard.risk_score = summary.risk_dashboard.risk_score.min(100);
        for indicator in &mut summary.risk_dashboard.risk_indicators {
            indicator.risk_score = indicator.risk_score.map(|score| score.min(100));
        }
        summary.analysis_timestamp = Utc::now().to_rfc3339();

        Ok(summary)
    }
}
