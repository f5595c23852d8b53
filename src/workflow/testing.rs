//! Deterministic doubles for the completion engine and progress sink.

use super::{ProgressEvent, ProgressSink};
use crate::bundle::{
    Diagnosis, DiagnosisRecord, ImagingReport, InputBundle, LabResult, Medication, NursingRecord,
    ProgressNote, SubjectProfile, VitalSign,
};
use crate::error::CompletionError;
use crate::provider::{CompletionPort, CompletionRequest};
use crate::tasks::{
    ClinicalSummary, IntegratedRadiologyAnalysis, LabSummary, PrescriptionSummary,
    ProgressNoteSummary, RadiologyFindings, RadiologyProgression, SurgerySummary,
    VitalsNursingSummary,
};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Answers by schema name with canned values.
#[derive(Default)]
pub(crate) struct StubCompletion {
    responses: HashMap<String, Value>,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    /// (schema name, prompt) per call, in call order
    calls: Mutex<Vec<(String, String)>>,
}

impl StubCompletion {
    /// Every result schema answered with its `Default` value
    pub fn with_defaults() -> Self {
        Self::default()
            .respond(ProgressNoteSummary::default())
            .respond(VitalsNursingSummary::default())
            .respond(PrescriptionSummary::default())
            .respond(LabSummary::default())
            .respond(RadiologyFindings::default())
            .respond(RadiologyProgression::default())
            .respond(IntegratedRadiologyAnalysis::default())
            .respond(SurgerySummary::default())
            .respond(ClinicalSummary::default())
    }

    pub fn respond<T: Serialize + JsonSchema>(mut self, value: T) -> Self {
        let value = serde_json::to_value(value).expect("stub value serializes");
        self.responses.insert(T::schema_name(), value);
        self
    }

    pub fn delay<T: JsonSchema>(mut self, delay: Duration) -> Self {
        self.delays.insert(T::schema_name(), delay);
        self
    }

    pub fn fail<T: JsonSchema>(mut self) -> Self {
        self.failures.insert(T::schema_name());
        self
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, schema: &str) -> usize {
        self.prompts_for(schema).len()
    }

    pub fn prompts_for(&self, schema: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == schema)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionPort for StubCompletion {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Value, CompletionError> {
        let schema = request.schema.name.clone();
        self.calls
            .lock()
            .unwrap()
            .push((schema.clone(), request.prompt.clone()));

        if let Some(delay) = self.delays.get(&schema) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(&schema) {
            return Err(CompletionError::Malformed(format!("stub failure for {}", schema)));
        }
        self.responses
            .get(&schema)
            .cloned()
            .ok_or_else(|| CompletionError::Malformed(format!("no stub response for {}", schema)))
    }
}

/// Keeps every event in emission order
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A bundle with every category populated
pub(crate) fn full_bundle() -> InputBundle {
    InputBundle {
        subject_profile: Some(SubjectProfile {
            name: "Park".into(),
            chart: "000123".into(),
            sex: "M".into(),
            age: "68".into(),
            last_visit_ymd: "20240310".into(),
        }),
        notes: vec![
            ProgressNote {
                ymd: "20240308".into(),
                time: "0900".into(),
                progress: "POD#2 after laparoscopic cholecystectomy, tolerating diet".into(),
            },
            ProgressNote {
                ymd: "20240306".into(),
                time: "1500".into(),
                progress: "Surgery performed under general anesthesia".into(),
            },
            ProgressNote {
                ymd: "20240305".into(),
                time: "1000".into(),
                progress: "Admitted with RUQ pain".into(),
            },
        ],
        vitals: vec![
            VitalSign {
                ymd: "20240307".into(),
                time: "0800".into(),
                high_pressure: "138".into(),
                low_pressure: "86".into(),
                pulse: "92".into(),
                temperature: "37.9".into(),
                ..VitalSign::default()
            },
            VitalSign {
                ymd: "20240308".into(),
                time: "0800".into(),
                high_pressure: "126".into(),
                low_pressure: "80".into(),
                pulse: "78".into(),
                temperature: "36.8".into(),
                ..VitalSign::default()
            },
        ],
        nursing_records: vec![NursingRecord {
            ymd: "20240307".into(),
            time: "2200".into(),
            nursing_diagnosis: "Acute pain".into(),
            nursing_intervention: "PRN analgesic given".into(),
        }],
        medications: vec![Medication {
            medication_name: "Cefazolin".into(),
            s_ymd: "20240306".into(),
            e_ymd: "20240309".into(),
            total_days: "4".into(),
            route: "IV".into(),
            dose: "1".into(),
            frequency: "3".into(),
            administration: "q8h".into(),
            note: None,
        }],
        diagnosis_records: vec![DiagnosisRecord {
            ymd: "20240305".into(),
            diagnoses: vec![Diagnosis {
                diagnosis_name: "Acute cholecystitis".into(),
                icd_code: "K81.0".into(),
            }],
        }],
        lab_results: vec![
            LabResult {
                ymd: "20240305".into(),
                test_name: "CBC".into(),
                sub_test_name: "WBC".into(),
                result_value: "14.2".into(),
                unit: "10^3/uL".into(),
                normal_range: "4-10".into(),
                note: None,
            },
            LabResult {
                ymd: "20240308".into(),
                test_name: "CBC".into(),
                sub_test_name: "WBC".into(),
                result_value: "8.1".into(),
                unit: "10^3/uL".into(),
                normal_range: "4-10".into(),
                note: None,
            },
        ],
        imaging_reports: vec![
            ImagingReport {
                ymd: "20240309".into(),
                time: "1100".into(),
                modality: "Ultrasound".into(),
                exam_type: "Abdomen".into(),
                findings: "Post-cholecystectomy state, no collection".into(),
            },
            ImagingReport {
                ymd: "20240305".into(),
                time: "1200".into(),
                modality: "Ultrasound".into(),
                exam_type: "Abdomen".into(),
                findings: "Distended gallbladder with wall thickening".into(),
            },
        ],
    }
}
