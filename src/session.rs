//! Request/response boundary over the orchestrator.
//!
//! Every entry point translates a failed run the same way: exactly one
//! `error` event is written and the error is returned to the caller.

use crate::bundle::InputBundle;
use crate::error::{SessionError, WorkflowError};
use crate::output::{ClientEvent, EventStream};
use crate::tasks::RadiologyAnalysis;
use crate::workflow::{CombinedResult, Orchestrator};
use std::io::Write;
use tracing::{error, info};

pub struct Session<W> {
    orchestrator: Orchestrator,
    events: EventStream<W>,
}

impl<W: Write + Send> Session<W> {
    pub fn new(orchestrator: Orchestrator, writer: W) -> Self {
        Self {
            orchestrator,
            events: EventStream::new(writer),
        }
    }

    /// Full summary: profile first, progress while running, then the result.
    pub async fn summarize(&self, bundle: InputBundle) -> Result<CombinedResult, SessionError> {
        info!("summarize: starting");
        self.events
            .send(&ClientEvent::PatientData(bundle.subject_profile.as_ref()))?;

        let result = self.analyze(bundle).await?;
        self.events.send(&ClientEvent::SummarizePatient(&result))?;
        Ok(result)
    }

    /// Runs the same workflow and reports only the imaging analysis.
    pub async fn query_radiology(
        &self,
        bundle: InputBundle,
    ) -> Result<Option<RadiologyAnalysis>, SessionError> {
        info!("query_radiology: starting");
        let result = self.analyze(bundle).await?;
        let radiology = result.radiology_summary;
        self.events
            .send(&ClientEvent::QueryRadiologyAnalysis(radiology.as_ref()))?;
        Ok(radiology)
    }

    async fn analyze(&self, bundle: InputBundle) -> Result<CombinedResult, WorkflowError> {
        match self.orchestrator.run(bundle, &self.events).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Run failed: {}", e);
                if let Err(send_err) = self.events.send(&ClientEvent::Error {
                    message: e.to_string(),
                }) {
                    error!("Failed to deliver error event: {}", send_err);
                }
                Err(e)
            }
        }
    }

    pub fn into_writer(self) -> W {
        self.events.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::tasks::LabSummary;
    use crate::workflow::testing::{full_bundle, StubCompletion};
    use crate::workflow::WorkflowDefinition;
    use serde_json::Value;
    use std::sync::Arc;

    fn session(port: StubCompletion) -> Session<Vec<u8>> {
        let definition = WorkflowDefinition::standard(&Config::default()).unwrap();
        Session::new(Orchestrator::new(definition, Arc::new(port), 6), Vec::new())
    }

    fn events(session: Session<Vec<u8>>) -> Vec<Value> {
        String::from_utf8(session.into_writer())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn names(events: &[Value]) -> Vec<&str> {
        events.iter().map(|e| e["event"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_summarize_event_sequence() {
        let session = session(StubCompletion::with_defaults());
        session.summarize(full_bundle()).await.unwrap();

        let events = events(session);
        let names = names(&events);
        assert_eq!(names.first(), Some(&"patient_data"));
        assert_eq!(names.last(), Some(&"summarize_patient"));
        assert_eq!(names.iter().filter(|n| **n == "loading").count(), 8);
        assert_eq!(events[0]["data"]["name"], "Park");
        assert!(events.last().unwrap()["data"]["clinicalSummary"].is_object());
    }

    #[tokio::test]
    async fn test_radiology_projection() {
        let session = session(StubCompletion::with_defaults());
        let radiology = session.query_radiology(full_bundle()).await.unwrap();
        assert!(radiology.is_some());

        let events = events(session);
        let last = events.last().unwrap();
        assert_eq!(last["event"], "query_radiology_analysis");
        assert!(last["data"]["progression"].is_object());
        assert!(!names(&events).contains(&"patient_data"));
    }

    #[tokio::test]
    async fn test_both_entry_points_translate_failure_alike() {
        for radiology in [false, true] {
            let session = session(StubCompletion::with_defaults().fail::<LabSummary>());
            let failed = if radiology {
                session.query_radiology(full_bundle()).await.is_err()
            } else {
                session.summarize(full_bundle()).await.is_err()
            };
            assert!(failed);

            let events = events(session);
            let names = names(&events);
            assert_eq!(names.iter().filter(|n| **n == "error").count(), 1);
            assert_eq!(names.last(), Some(&"error"));
            assert!(!names.contains(&"summarize_patient"));
            assert!(!names.contains(&"query_radiology_analysis"));
            assert!(events.last().unwrap()["data"]["message"]
                .as_str()
                .unwrap()
                .contains("stub failure for LabSummary"));
        }
    }
}
