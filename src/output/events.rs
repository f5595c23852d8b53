use crate::bundle::SubjectProfile;
use crate::error::OutputError;
use crate::tasks::RadiologyAnalysis;
use crate::workflow::{CombinedResult, ProgressEvent, ProgressSink, TracingSink};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::warn;

/// One message to the observing client, written as a JSON line:
/// `{"event": "<name>", "data": ...}`.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent<'a> {
    PatientData(Option<&'a SubjectProfile>),
    Loading(ProgressEvent),
    SummarizePatient(&'a CombinedResult),
    QueryRadiologyAnalysis(Option<&'a RadiologyAnalysis>),
    Error { message: String },
}

/// Serializes events onto a writer, one per line, in call order.
pub struct EventStream<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> EventStream<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn send(&self, event: &ClientEvent<'_>) -> Result<(), OutputError> {
        let line = serde_json::to_string(event)?;
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(writer, "{}", line).map_err(OutputError::WriteEvent)?;
        writer.flush().map_err(OutputError::WriteEvent)
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> ProgressSink for EventStream<W> {
    fn emit(&self, event: ProgressEvent) {
        TracingSink.emit(event);
        if let Err(e) = self.send(&ClientEvent::Loading(event)) {
            warn!("Failed to deliver progress event: {}", e);
        }
    }
}
