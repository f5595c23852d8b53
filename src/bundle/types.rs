use chrono::{NaiveDate, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Accept either a JSON string or a number for free-form measurement fields.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}

const DATE_FORMATS: [&str; 4] = ["%Y%m%d", "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const TIME_FORMATS: [&str; 4] = ["%H:%M:%S", "%H:%M", "%H%M%S", "%H%M"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Records that carry a `ymd` date and optional `time` of day.
pub trait Dated {
    fn ymd(&self) -> &str;

    fn time(&self) -> &str {
        ""
    }

    /// Lexically sortable `YYYYMMDDHHMMSS` key. Unparseable values fall back
    /// to their raw digits so they still sort deterministically.
    fn sort_key(&self) -> String {
        let date = parse_date(self.ymd())
            .map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_else(|| format!("{:0<8}", digits(self.ymd())));
        let time = if self.time().trim().is_empty() {
            "000000".to_string()
        } else {
            parse_time(self.time())
                .map(|t| t.format("%H%M%S").to_string())
                .unwrap_or_else(|| format!("{:0<6}", digits(self.time())))
        };
        format!("{}{}", date, time)
    }

    /// Human readable `yyyy-MM-dd HH:mm`, or the raw values when unparseable.
    fn display_time(&self) -> String {
        let date = parse_date(self.ymd())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| self.ymd().to_string());

        if self.time().trim().is_empty() {
            return date;
        }
        let time = parse_time(self.time())
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| self.time().to_string());

        format!("{} {}", date, time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProfile {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub chart: String,

    #[serde(default)]
    pub sex: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub age: String,

    #[serde(default)]
    pub last_visit_ymd: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressNote {
    pub ymd: String,

    #[serde(default)]
    pub time: String,

    #[serde(alias = "text")]
    pub progress: String,
}

impl Dated for ProgressNote {
    fn ymd(&self) -> &str {
        &self.ymd
    }

    fn time(&self) -> &str {
        &self.time
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalSign {
    pub ymd: String,

    #[serde(default)]
    pub time: String,

    /// Systolic
    #[serde(default, deserialize_with = "lenient_string")]
    pub high_pressure: String,

    /// Diastolic
    #[serde(default, deserialize_with = "lenient_string")]
    pub low_pressure: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub pulse: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub weight: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub temperature: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub respiration: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub spo2: String,
}

impl Dated for VitalSign {
    fn ymd(&self) -> &str {
        &self.ymd
    }

    fn time(&self) -> &str {
        &self.time
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NursingRecord {
    pub ymd: String,

    #[serde(default)]
    pub time: String,

    #[serde(default)]
    pub nursing_diagnosis: String,

    #[serde(default)]
    pub nursing_intervention: String,
}

impl Dated for NursingRecord {
    fn ymd(&self) -> &str {
        &self.ymd
    }

    fn time(&self) -> &str {
        &self.time
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub medication_name: String,

    #[serde(default)]
    pub s_ymd: String,

    #[serde(default)]
    pub e_ymd: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub total_days: String,

    #[serde(default)]
    pub route: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub dose: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub frequency: String,

    #[serde(default)]
    pub administration: String,

    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub diagnosis_name: String,

    #[serde(default)]
    pub icd_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRecord {
    pub ymd: String,

    #[serde(default)]
    pub diagnoses: Vec<Diagnosis>,
}

impl Dated for DiagnosisRecord {
    fn ymd(&self) -> &str {
        &self.ymd
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    pub ymd: String,

    pub test_name: String,

    #[serde(default)]
    pub sub_test_name: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub result_value: String,

    #[serde(default)]
    pub unit: String,

    #[serde(default)]
    pub normal_range: String,

    #[serde(default)]
    pub note: Option<String>,
}

impl Dated for LabResult {
    fn ymd(&self) -> &str {
        &self.ymd
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagingReport {
    pub ymd: String,

    #[serde(default)]
    pub time: String,

    /// X-ray, CT, MRI, ultrasound, PET, ...
    #[serde(default)]
    pub modality: String,

    /// Body region
    #[serde(default)]
    pub exam_type: String,

    pub findings: String,
}

impl Dated for ImagingReport {
    fn ymd(&self) -> &str {
        &self.ymd
    }

    fn time(&self) -> &str {
        &self.time
    }
}
