//! The immutable per-run view of a subject's records.

pub mod render;
mod types;

pub use types::*;

use crate::error::BundleError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every record category a run may look at. Each collection is optional on
/// the wire and defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InputBundle {
    #[serde(default, rename = "patientInfo", alias = "subjectProfile")]
    pub subject_profile: Option<SubjectProfile>,

    #[serde(default, rename = "progressNotes", alias = "notes")]
    pub notes: Vec<ProgressNote>,

    #[serde(default, rename = "vitalSigns", alias = "vitals")]
    pub vitals: Vec<VitalSign>,

    #[serde(default)]
    pub nursing_records: Vec<NursingRecord>,

    #[serde(default)]
    pub medications: Vec<Medication>,

    #[serde(default)]
    pub diagnosis_records: Vec<DiagnosisRecord>,

    #[serde(default, rename = "labs", alias = "labResults")]
    pub lab_results: Vec<LabResult>,

    #[serde(default, rename = "radiologyReports", alias = "imagingReports")]
    pub imaging_reports: Vec<ImagingReport>,
}

impl InputBundle {
    /// Load a bundle from a JSON file
    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let content = std::fs::read_to_string(path).map_err(|e| BundleError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, BundleError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Number of record categories with at least one entry
    pub fn populated_categories(&self) -> usize {
        [
            !self.notes.is_empty(),
            !self.vitals.is_empty(),
            !self.nursing_records.is_empty(),
            !self.medications.is_empty(),
            !self.diagnosis_records.is_empty(),
            !self.lab_results.is_empty(),
            !self.imaging_reports.is_empty(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    /// Items sorted oldest first by their date/time, ties keep input order.
    pub fn chronological<T: Dated>(items: &[T]) -> Vec<&T> {
        let mut sorted: Vec<&T> = items.iter().collect();
        sorted.sort_by_key(|item| item.sort_key());
        sorted
    }

    /// Most recent diagnosis record by date, if any.
    pub fn latest_diagnoses(&self) -> Option<&DiagnosisRecord> {
        self.diagnosis_records
            .iter()
            .max_by_key(|record| record.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_bundle() {
        let json = r#"{
            "patientInfo": {"name": "Kim", "chart": "0001", "sex": "F", "age": 71, "lastVisitYmd": "20240301"},
            "progressNotes": [{"ymd": "20240301", "time": "0930", "progress": "Stable"}],
            "vitalSigns": [{"ymd": "20240301", "time": "0800", "highPressure": 135, "lowPressure": "84", "pulse": 72}],
            "labs": [{"ymd": "20240228", "testName": "CBC", "subTestName": "Hb", "resultValue": 9.8, "unit": "g/dL", "normalRange": "12-16"}]
        }"#;

        let bundle = InputBundle::from_json(json).unwrap();
        let profile = bundle.subject_profile.as_ref().unwrap();
        assert_eq!(profile.age, "71");
        assert_eq!(bundle.notes.len(), 1);
        assert_eq!(bundle.vitals[0].high_pressure, "135");
        assert_eq!(bundle.vitals[0].spo2, "");
        assert_eq!(bundle.lab_results[0].result_value, "9.8");
        assert!(bundle.imaging_reports.is_empty());
        assert_eq!(bundle.populated_categories(), 3);
    }

    #[test]
    fn test_parse_aliases() {
        let json = r#"{
            "subjectProfile": {"name": "Lee"},
            "notes": [{"ymd": "2024-03-01", "text": "Seen"}],
            "imagingReports": [{"ymd": "20240301", "modality": "CT", "findings": "No change"}]
        }"#;

        let bundle = InputBundle::from_json(json).unwrap();
        assert_eq!(bundle.subject_profile.unwrap().name, "Lee");
        assert_eq!(bundle.notes[0].progress, "Seen");
        assert_eq!(bundle.imaging_reports.len(), 1);
    }

    #[test]
    fn test_empty_bundle() {
        let bundle = InputBundle::from_json("{}").unwrap();
        assert_eq!(bundle, InputBundle::default());
        assert_eq!(bundle.populated_categories(), 0);
    }

    #[test]
    fn test_sort_key_mixed_formats() {
        let a = ProgressNote {
            ymd: "2024-03-01".into(),
            time: "09:30".into(),
            progress: String::new(),
        };
        let b = ProgressNote {
            ymd: "20240301".into(),
            time: "0800".into(),
            progress: String::new(),
        };
        assert_eq!(a.sort_key(), "20240301093000");
        assert!(b.sort_key() < a.sort_key());
        assert_eq!(a.display_time(), "2024-03-01 09:30");
    }

    #[test]
    fn test_unpadded_times_and_dates_sort_by_clock() {
        let notes = vec![
            ProgressNote {
                ymd: "2024-03-01".into(),
                time: "14:00".into(),
                progress: "afternoon".into(),
            },
            ProgressNote {
                ymd: "2024-03-01".into(),
                time: "9:30".into(),
                progress: "morning".into(),
            },
            ProgressNote {
                ymd: "2024-3-5".into(),
                time: "8:05".into(),
                progress: "later day".into(),
            },
            ProgressNote {
                ymd: "2024-02-28".into(),
                time: String::new(),
                progress: "previous month".into(),
            },
        ];

        assert_eq!(notes[1].sort_key(), "20240301093000");
        assert_eq!(notes[2].sort_key(), "20240305080500");
        assert_eq!(notes[2].display_time(), "2024-03-05 08:05");

        let order: Vec<_> = InputBundle::chronological(&notes)
            .into_iter()
            .map(|n| n.progress.as_str())
            .collect();
        assert_eq!(
            order,
            vec!["previous month", "morning", "afternoon", "later day"]
        );
    }

    #[test]
    fn test_chronological_keeps_ties_stable() {
        let notes = vec![
            ProgressNote {
                ymd: "20240302".into(),
                time: String::new(),
                progress: "late".into(),
            },
            ProgressNote {
                ymd: "20240301".into(),
                time: String::new(),
                progress: "first".into(),
            },
            ProgressNote {
                ymd: "20240301".into(),
                time: String::new(),
                progress: "second".into(),
            },
        ];
        let sorted: Vec<_> = InputBundle::chronological(&notes)
            .into_iter()
            .map(|n| n.progress.as_str())
            .collect();
        assert_eq!(sorted, vec!["first", "second", "late"]);
    }
}
