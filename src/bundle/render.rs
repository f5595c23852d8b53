//! Deterministic markdown projections of bundle slices used in prompts.

use super::{
    Dated, DiagnosisRecord, ImagingReport, InputBundle, LabResult, Medication, NursingRecord,
    ProgressNote, SubjectProfile, VitalSign,
};

const NONE: &str = "none";

fn cell(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "-".to_string()
    } else {
        trimmed.replace('|', "\\|").replace('\n', " ")
    }
}

fn markdown_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut table = format!("| {} |\n", headers.join(" | "));
    table.push_str(&format!(
        "|{}|\n",
        headers.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    ));
    for row in rows {
        table.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    table
}

pub fn profile(profile: Option<&SubjectProfile>) -> String {
    let default = SubjectProfile::default();
    let p = profile.unwrap_or(&default);
    format!(
        "- Name: {}\n- Sex: {}\n- Age: {}\n- Last visit: {}",
        p.name, p.sex, p.age, p.last_visit_ymd
    )
}

pub fn notes(notes: &[&ProgressNote]) -> String {
    notes
        .iter()
        .map(|n| format!("**Date**: {}\n**Note**: {}", n.display_time(), n.progress.trim()))
        .collect::<Vec<_>>()
        .join("\n\n---\n")
}

/// Vital signs, most recent first
pub fn vitals(vitals: &[VitalSign]) -> String {
    if vitals.is_empty() {
        return NONE.to_string();
    }
    let mut sorted = InputBundle::chronological(vitals);
    sorted.reverse();
    let rows = sorted
        .into_iter()
        .map(|v| {
            vec![
                v.display_time(),
                format!("{}/{}", cell(&v.high_pressure), cell(&v.low_pressure)),
                cell(&v.pulse),
                cell(&v.temperature),
                cell(&v.respiration),
                cell(&v.spo2),
                cell(&v.weight),
            ]
        })
        .collect();
    markdown_table(
        &["Date", "BP", "Pulse", "Temp", "Resp", "SpO2", "Weight"],
        rows,
    )
}

/// Nursing records, most recent first
pub fn nursing(records: &[NursingRecord]) -> String {
    if records.is_empty() {
        return NONE.to_string();
    }
    let mut sorted = InputBundle::chronological(records);
    sorted.reverse();
    let rows = sorted
        .into_iter()
        .map(|r| {
            vec![
                r.display_time(),
                cell(&r.nursing_diagnosis),
                cell(&r.nursing_intervention),
            ]
        })
        .collect();
    markdown_table(&["Date", "Nursing problem", "Intervention"], rows)
}

pub fn medications(medications: &[Medication]) -> String {
    if medications.is_empty() {
        return NONE.to_string();
    }
    medications
        .iter()
        .map(|m| {
            format!(
                "### {}\n- Period: {} ~ {} ({} days)\n- Route: {}\n- Dose: {} per administration, {} times/day\n- Administration: {}\n- Note: {}",
                m.medication_name,
                m.s_ymd,
                m.e_ymd,
                m.total_days,
                m.route,
                m.dose,
                m.frequency,
                m.administration,
                m.note.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(NONE)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn diagnoses(records: &[DiagnosisRecord]) -> String {
    if records.is_empty() {
        return "no diagnosis records".to_string();
    }
    InputBundle::chronological(records)
        .into_iter()
        .map(|record| format!("**{}**: {}", record.display_time(), diagnosis_list(record)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn diagnosis_list(record: &DiagnosisRecord) -> String {
    record
        .diagnoses
        .iter()
        .map(|d| format!("{} ({})", d.diagnosis_name, d.icd_code))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn labs(labs: &[LabResult]) -> String {
    if labs.is_empty() {
        return NONE.to_string();
    }
    let rows = InputBundle::chronological(labs)
        .into_iter()
        .map(|l| {
            vec![
                l.display_time(),
                cell(&l.test_name),
                cell(&l.sub_test_name),
                cell(&l.result_value),
                cell(&l.unit),
                cell(&l.normal_range),
                cell(l.note.as_deref().unwrap_or("")),
            ]
        })
        .collect();
    markdown_table(
        &["Date", "Test", "Item", "Result", "Unit", "Normal range", "Note"],
        rows,
    )
}

pub fn imaging(reports: &[&ImagingReport]) -> String {
    reports
        .iter()
        .enumerate()
        .map(|(idx, r)| {
            format!(
                "### Study {} - {}\n- Modality: {}\n- Region: {}\n- Findings: {}",
                idx + 1,
                r.display_time(),
                r.modality,
                r.exam_type,
                r.findings.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
