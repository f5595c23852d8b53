use super::{Confidence, RiskLevel};
use crate::bundle::{render, InputBundle, ProgressNote};
use crate::config::SurgeryConfig;
use crate::error::WorkflowError;
use crate::provider::{complete_structured, CompletionPort, ModelTier};
use crate::workflow::{AnalysisTask, TaskName};
use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

const SYSTEM_PROMPT: &str = include_str!("../../prompts/surgery.md");
const MAX_ACTIONS: usize = 7;
const MAX_MEDICATION_NOTES: usize = 7;
const MAX_PENDING_QUESTIONS: usize = 5;

/// English perioperative terms, matched at the start of a word so that
/// "operative" does not fire on "cooperative".
const PERIOPERATIVE_WORDS: &[&str] = &[
    "surgery",
    "surgical",
    "operation",
    "operative",
    "perioperative",
    "preop",
    "pre-op",
    "postop",
    "post-op",
    "anesthesia",
    "anaesthesia",
    "incision",
    "resection",
    "excision",
    "laparoscop",
    "arthroscop",
    "suture",
    "drain",
    "NPO",
];

/// Procedure suffixes and Korean terms, matched anywhere. Korean attaches
/// particles and compounds without spaces.
const PERIOPERATIVE_FRAGMENTS: &[&str] = &[
    "ectomy",
    "otomy",
    "수술",
    "시술",
    "술전",
    "술후",
    "마취",
    "절제",
    "봉합",
    "배액",
    "금식",
];

/// Escaped alternative, anchored at a word start when it begins with an
/// ASCII letter or digit.
fn keyword_pattern(keyword: &str) -> String {
    let escaped = regex::escape(keyword);
    match keyword.chars().next() {
        Some(c) if c.is_ascii_alphanumeric() => format!(r"\b{}", escaped),
        _ => escaped,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SurgicalRiskCategory {
    Airway,
    Cardiac,
    Pulmonary,
    Bleeding,
    Infection,
    Thromboembolism,
    Medication,
    Renal,
    Glycemic,
    Neurologic,
    #[default]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurgicalRiskFlag {
    pub category: SurgicalRiskCategory,
    pub severity: RiskLevel,
    pub message: String,
    pub recommended_action: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PeriopEventType {
    PreopAssessment,
    ProcedurePlanned,
    ProcedurePerformed,
    Anesthesia,
    PostopCourse,
    Complication,
    FollowUp,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CourseTrend {
    Improving,
    Stable,
    Worsening,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurgeryTimelineItem {
    /// yyyy-MM-dd HH:mm:ss where known
    pub timestamp: String,
    pub event_type: PeriopEventType,
    pub summary: String,
    /// Record the event was taken from
    pub source: Option<String>,
    #[serde(default)]
    pub course_trend: CourseTrend,
    pub course_trend_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Planned,
    Performed,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurgeryCase {
    pub procedure_name: String,
    /// Site and laterality, e.g. right shoulder
    pub site_or_side: Option<String>,
    pub status: CaseStatus,
    pub anesthesia: Option<String>,
    pub indication: Option<String>,
    /// Planned or performed date, estimated
    pub date_estimate: Option<String>,
    pub periop_summary: Option<String>,
    /// Questions the data leaves open, at most five
    #[serde(default)]
    #[schemars(length(max = 5))]
    pub pending_questions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurgerySummary {
    pub has_surgery_related_content: bool,
    pub one_liner: String,
    /// Two to six sentences for the acute-care physician
    pub overview: String,
    #[serde(default)]
    pub cases: Vec<SurgeryCase>,
    /// Chronological perioperative events
    #[serde(default)]
    pub timeline: Vec<SurgeryTimelineItem>,
    /// Most severe first
    #[serde(default)]
    pub key_risks: Vec<SurgicalRiskFlag>,
    #[serde(default)]
    #[schemars(length(max = 7))]
    pub immediate_actions: Vec<String>,
    #[serde(default)]
    #[schemars(length(max = 7))]
    pub periop_medication_notes: Vec<String>,
    pub confidence: Confidence,
}

/// Surgical context drawn from keyword-matched notes plus the most recent
/// ones.
pub struct SurgeryTask {
    keywords: Regex,
    recent_notes: usize,
}

impl SurgeryTask {
    pub fn new(config: &SurgeryConfig) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = PERIOPERATIVE_WORDS
            .iter()
            .copied()
            .chain(config.extra_keywords.iter().map(String::as_str))
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(keyword_pattern)
            .chain(PERIOPERATIVE_FRAGMENTS.iter().map(|k| regex::escape(k)))
            .collect();

        Ok(Self {
            keywords: Regex::new(&format!("(?i){}", alternatives.join("|")))?,
            recent_notes: config.recent_notes,
        })
    }

    /// Keyword matches unioned with the `recent_notes` newest notes,
    /// deduplicated and returned oldest first.
    pub fn select_notes<'a>(&self, notes: &'a [ProgressNote]) -> Vec<&'a ProgressNote> {
        let sorted = InputBundle::chronological(notes);
        let recent_from = sorted.len().saturating_sub(self.recent_notes);

        let selected: BTreeSet<usize> = sorted
            .iter()
            .enumerate()
            .filter(|(idx, note)| *idx >= recent_from || self.keywords.is_match(&note.progress))
            .map(|(idx, _)| idx)
            .collect();

        debug!(
            "Selected {} of {} notes for surgical context",
            selected.len(),
            sorted.len()
        );
        selected.into_iter().map(|idx| sorted[idx]).collect()
    }
}

#[async_trait]
impl AnalysisTask for SurgeryTask {
    type Output = SurgerySummary;

    fn name(&self) -> TaskName {
        TaskName::Surgery
    }

    fn applies(&self, bundle: &InputBundle) -> bool {
        !bundle.notes.is_empty()
    }

    async fn analyze(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<SurgerySummary, WorkflowError> {
        let notes = self.select_notes(&bundle.notes);
        if notes.is_empty() {
            return Err(WorkflowError::GuardInconsistency {
                task: TaskName::Surgery,
                detail: "no notes selected".to_string(),
            });
        }

        let diagnoses = bundle
            .latest_diagnoses()
            .map(render::diagnosis_list)
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| "no diagnosis records".to_string());

        let prompt = format!(
            "# Subject\n{}\n\n---\n# Current diagnoses\n{}\n\n---\n# Medications\n{}\n\n---\n# Progress notes\n{}",
            render::profile(bundle.subject_profile.as_ref()),
            diagnoses,
            render::medications(&bundle.medications),
            render::notes(&notes)
        );

        let mut summary: SurgerySummary = complete_structured(
            port,
            TaskName::Surgery,
            ModelTier::Standard,
            SYSTEM_PROMPT,
            prompt,
        )
        .await?;

        summary
            .key_risks
            .sort_by_key(|risk| std::cmp::Reverse(risk.severity));
        summary.immediate_actions.truncate(MAX_ACTIONS);
        summary.periop_medication_notes.truncate(MAX_MEDICATION_NOTES);
        for case in &mut summary.cases {
            case.pending_questions.truncate(MAX_PENDING_QUESTIONS);
        }
        Ok(summary)
    }
}
