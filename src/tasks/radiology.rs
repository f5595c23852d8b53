use super::RiskLevel;
use crate::bundle::{render, Dated, ImagingReport, InputBundle};
use crate::error::WorkflowError;
use crate::provider::{complete_structured, CompletionPort, ModelTier};
use crate::workflow::{AnalysisTask, TaskName};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const FINDINGS_PROMPT: &str = include_str!("../../prompts/radiology_findings.md");
const PROGRESSION_PROMPT: &str = include_str!("../../prompts/radiology_progression.md");
const INTEGRATED_PROMPT: &str = include_str!("../../prompts/radiology_integrated.md");

/// Serial comparison needs at least this many studies
const MIN_STUDIES_FOR_PROGRESSION: usize = 2;

/// Single-exam reading of the most recent study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RadiologyFindings {
    pub main_finding: String,
    pub clinical_significance: String,
    /// Comparison with prior studies mentioned in the report
    #[serde(default)]
    pub progression_analysis: String,
    #[serde(default)]
    pub urgent_findings: Vec<String>,
    /// Recommended follow-up imaging or tests
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub follow_up_plan: String,
    pub clinical_opinion: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OverallTrend {
    Improvement,
    #[default]
    Stable,
    Progression,
}

/// Model assessment of change across serial studies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RadiologyProgression {
    pub overall_trend: OverallTrend,
    #[serde(default)]
    pub key_changes: Vec<String>,
    pub evolution_timeline: String,
    pub predicted_outcome: String,
    pub clinical_implications: String,
    #[serde(default)]
    pub recommended_follow_up: Vec<String>,
}

/// Imaging correlated with vitals, labs and medications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedRadiologyAnalysis {
    pub clinical_correlation_analysis: String,
    pub overall_clinical_picture: String,
    /// Expected course and prognosis
    pub progression_assessment: String,
    pub integrated_clinical_opinion: String,
    #[serde(default)]
    pub management_recommendations: Vec<String>,
    #[serde(default)]
    pub priority_actions: Vec<String>,
    pub risk_level: RiskLevel,
}

/// One study in a progression comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudyRef {
    pub date: String,
    pub modality: String,
    pub exam_type: String,
}

impl From<&ImagingReport> for StudyRef {
    fn from(report: &ImagingReport) -> Self {
        Self {
            date: report.display_time(),
            modality: report.modality.clone(),
            exam_type: report.exam_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionAnalysis {
    /// Compared studies, oldest first
    pub studies: Vec<StudyRef>,
    pub assessment: RadiologyProgression,
}

/// The imaging task's composite value. `progression` is present only when
/// the bundle holds two or more reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RadiologyAnalysis {
    pub summary: RadiologyFindings,
    pub progression: Option<ProgressionAnalysis>,
    pub integrated_analysis: IntegratedRadiologyAnalysis,
}

/// Three analyses over the imaging reports, counted as one fan-out unit.
pub struct RadiologyTask;

impl RadiologyTask {
    async fn findings(
        latest: &ImagingReport,
        port: &dyn CompletionPort,
    ) -> Result<RadiologyFindings, WorkflowError> {
        let prompt = format!("# Most recent study\n{}", render::imaging(&[latest]));
        Ok(complete_structured(
            port,
            TaskName::Radiology,
            ModelTier::Standard,
            FINDINGS_PROMPT,
            prompt,
        )
        .await?)
    }

    async fn progression(
        reports: &[&ImagingReport],
        port: &dyn CompletionPort,
    ) -> Result<Option<ProgressionAnalysis>, WorkflowError> {
        if reports.len() < MIN_STUDIES_FOR_PROGRESSION {
            return Ok(None);
        }
        let prompt = format!("# Studies, oldest first\n{}", render::imaging(reports));
        let assessment: RadiologyProgression = complete_structured(
            port,
            TaskName::Radiology,
            ModelTier::Standard,
            PROGRESSION_PROMPT,
            prompt,
        )
        .await?;

        Ok(Some(ProgressionAnalysis {
            studies: reports.iter().map(|r| StudyRef::from(*r)).collect(),
            assessment,
        }))
    }

    async fn integrated(
        reports: &[&ImagingReport],
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<IntegratedRadiologyAnalysis, WorkflowError> {
        let prompt = format!(
            "# Imaging\n{}\n\n---\n# Vital signs\n{}\n\n---\n# Lab results\n{}\n\n---\n# Medications\n{}",
            render::imaging(reports),
            render::vitals(&bundle.vitals),
            render::labs(&bundle.lab_results),
            render::medications(&bundle.medications)
        );
        Ok(complete_structured(
            port,
            TaskName::Radiology,
            ModelTier::Standard,
            INTEGRATED_PROMPT,
            prompt,
        )
        .await?)
    }
}

#[async_trait]
impl AnalysisTask for RadiologyTask {
    type Output = RadiologyAnalysis;

    fn name(&self) -> TaskName {
        TaskName::Radiology
    }

    fn applies(&self, bundle: &InputBundle) -> bool {
        !bundle.imaging_reports.is_empty()
    }

    async fn analyze(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<RadiologyAnalysis, WorkflowError> {
        let reports = InputBundle::chronological(&bundle.imaging_reports);
        let Some(latest) = reports.last().copied() else {
            return Err(WorkflowError::GuardInconsistency {
                task: TaskName::Radiology,
                detail: "no imaging report to read".to_string(),
            });
        };

        // One call in flight per task: each sub-analysis waits for the last.
        let summary = Self::findings(latest, port).await?;
        let progression = Self::progression(&reports, port).await?;
        let integrated_analysis = Self::integrated(&reports, bundle, port).await?;

        Ok(RadiologyAnalysis {
            summary,
            progression,
            integrated_analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompletionError;
    use crate::provider::CompletionRequest;
    use crate::workflow::testing::StubCompletion;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks how many calls overlap in time.
    struct OverlapCounter {
        inner: StubCompletion,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl CompletionPort for OverlapCounter {
        fn name(&self) -> &'static str {
            "overlap"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<Value, CompletionError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            let result = self.inner.complete(request).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn report(ymd: &str, findings: &str) -> ImagingReport {
        ImagingReport {
            ymd: ymd.into(),
            time: "1000".into(),
            modality: "CT".into(),
            exam_type: "Chest".into(),
            findings: findings.into(),
        }
    }

    #[tokio::test]
    async fn test_single_report_has_no_progression() {
        let bundle = InputBundle {
            imaging_reports: vec![report("20240301", "Small effusion")],
            ..InputBundle::default()
        };
        let port = StubCompletion::with_defaults();

        let analysis = RadiologyTask
            .run(&bundle, &port)
            .await
            .unwrap()
            .into_produced()
            .unwrap();
        assert!(analysis.progression.is_none());
        assert_eq!(port.calls_for("RadiologyProgression"), 0);
        assert_eq!(port.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_progression_follows_report_dates() {
        let bundle = InputBundle {
            imaging_reports: vec![
                report("20240310", "Effusion resolved"),
                report("20240101", "Large effusion"),
                report("20240205", "Effusion decreasing"),
            ],
            ..InputBundle::default()
        };
        let port = StubCompletion::with_defaults();

        let analysis = RadiologyTask
            .run(&bundle, &port)
            .await
            .unwrap()
            .into_produced()
            .unwrap();

        let dates: Vec<_> = analysis
            .progression
            .unwrap()
            .studies
            .into_iter()
            .map(|s| s.date)
            .collect();
        assert_eq!(
            dates,
            vec!["2024-01-01 10:00", "2024-02-05 10:00", "2024-03-10 10:00"]
        );

        let findings_prompt = &port.prompts_for("RadiologyFindings")[0];
        assert!(findings_prompt.contains("Effusion resolved"));
        assert!(!findings_prompt.contains("Large effusion"));

        let progression_prompt = &port.prompts_for("RadiologyProgression")[0];
        let large = progression_prompt.find("Large effusion").unwrap();
        let resolved = progression_prompt.find("Effusion resolved").unwrap();
        assert!(large < resolved);
    }

    #[tokio::test]
    async fn test_sub_analyses_never_overlap() {
        let bundle = InputBundle {
            imaging_reports: vec![report("20240101", "a"), report("20240201", "b")],
            ..InputBundle::default()
        };
        let port = OverlapCounter {
            inner: StubCompletion::with_defaults(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };

        let analysis = RadiologyTask
            .run(&bundle, &port)
            .await
            .unwrap()
            .into_produced()
            .unwrap();
        assert!(analysis.progression.is_some());
        assert_eq!(port.inner.total_calls(), 3);
        assert_eq!(port.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_any_failed_call_fails_the_task() {
        let bundle = InputBundle {
            imaging_reports: vec![report("20240101", "a"), report("20240201", "b")],
            ..InputBundle::default()
        };
        let port = StubCompletion::with_defaults().fail::<IntegratedRadiologyAnalysis>();
        assert!(RadiologyTask.run(&bundle, &port).await.is_err());
    }
}
