use crate::bundle::{render, Dated, InputBundle};
use crate::error::WorkflowError;
use crate::provider::{complete_structured, CompletionPort, ModelTier};
use crate::workflow::{AnalysisTask, TaskName};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = include_str!("../../prompts/notes.md");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Soap {
    /// Symptoms and complaints as reported by the subject
    pub subjective: Option<String>,
    /// Observations and exam findings
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressNoteSummary {
    /// Summary of the whole note history
    pub summary: String,
    /// Principal diagnoses or diagnosis codes
    #[serde(default)]
    pub main_diagnosis: Vec<String>,
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub soap: Soap,
    /// Cautions for the next clinician; empty when there are none
    #[serde(default)]
    pub precautions: String,
    /// Date of the oldest note summarized (yyyy-MM-dd HH:mm)
    #[serde(default)]
    pub start_date: String,
    /// Date of the newest note summarized (yyyy-MM-dd HH:mm)
    #[serde(default)]
    pub end_date: String,
}

/// Summarizes progress notes on the fast model tier.
pub struct NotesTask;

#[async_trait]
impl AnalysisTask for NotesTask {
    type Output = ProgressNoteSummary;

    fn name(&self) -> TaskName {
        TaskName::Notes
    }

    fn applies(&self, bundle: &InputBundle) -> bool {
        !bundle.notes.is_empty()
    }

    async fn analyze(
        &self,
        bundle: &InputBundle,
        port: &dyn CompletionPort,
    ) -> Result<ProgressNoteSummary, WorkflowError> {
        let notes = InputBundle::chronological(&bundle.notes);
        let (Some(first), Some(last)) = (notes.first(), notes.last()) else {
            return Err(WorkflowError::GuardInconsistency {
                task: TaskName::Notes,
                detail: "no notes to summarize".to_string(),
            });
        };
        let start_date = first.display_time();
        let end_date = last.display_time();

        let mut summary: ProgressNoteSummary = complete_structured(
            port,
            TaskName::Notes,
            ModelTier::Fast,
            SYSTEM_PROMPT,
            render::notes(&notes),
        )
        .await?;

        // The covered period comes from the records, not the model
        summary.start_date = start_date;
        summary.end_date = end_date;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ProgressNote;
    use crate::workflow::testing::StubCompletion;
    use crate::workflow::TaskOutcome;

    fn note(ymd: &str, time: &str, text: &str) -> ProgressNote {
        ProgressNote {
            ymd: ymd.into(),
            time: time.into(),
            progress: text.into(),
        }
    }

    #[tokio::test]
    async fn test_skips_without_notes() {
        let port = StubCompletion::with_defaults();
        let outcome = NotesTask.run(&InputBundle::default(), &port).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Skipped);
        assert_eq!(port.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_period_and_prompt_are_chronological() {
        let bundle = InputBundle {
            notes: vec![
                note("20240305", "1400", "Ambulating well"),
                note("20240301", "0900", "Admitted with fever"),
            ],
            ..InputBundle::default()
        };
        let port = StubCompletion::with_defaults();

        let summary = NotesTask
            .run(&bundle, &port)
            .await
            .unwrap()
            .into_produced()
            .unwrap();

        assert_eq!(summary.start_date, "2024-03-01 09:00");
        assert_eq!(summary.end_date, "2024-03-05 14:00");

        let prompt = &port.prompts_for("ProgressNoteSummary")[0];
        let admitted = prompt.find("Admitted").unwrap();
        let ambulating = prompt.find("Ambulating").unwrap();
        assert!(admitted < ambulating);
    }
}
