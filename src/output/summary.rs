use crate::error::OutputError;
use crate::tasks::AlertType;
use crate::workflow::CombinedResult;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub timestamp: String,
    pub bundle: String,
    pub duration_sec: f64,
    /// Fan-out task name to `produced` or `skipped`
    pub analyses: BTreeMap<&'static str, &'static str>,
    pub result: &'a CombinedResult,
}

/// Write `summary.json` and `summary.md` for a completed run
pub fn write_summary(
    report_dir: &Path,
    result: &CombinedResult,
    bundle: &Path,
    duration: Duration,
) -> Result<(), OutputError> {
    fs::create_dir_all(report_dir).map_err(OutputError::CreateDir)?;

    let summary = build_summary(result, bundle, duration);

    let json_path = report_dir.join("summary.json");
    let json = serde_json::to_string_pretty(&summary)?;
    fs::write(&json_path, json).map_err(OutputError::WriteReport)?;

    let md_path = report_dir.join("summary.md");
    fs::write(&md_path, build_summary_markdown(&summary)).map_err(OutputError::WriteReport)?;

    Ok(())
}

fn build_summary<'a>(
    result: &'a CombinedResult,
    bundle: &Path,
    duration: Duration,
) -> SummaryReport<'a> {
    let status = |present: bool| if present { "produced" } else { "skipped" };
    let analyses = BTreeMap::from([
        ("notes", status(result.progress_notes_summary.is_some())),
        ("vitals_nursing", status(result.vs_ns_summary.is_some())),
        ("prescriptions", status(result.prescription_summary.is_some())),
        ("labs", status(result.lab_summary.is_some())),
        ("radiology", status(result.radiology_summary.is_some())),
        ("surgery", status(result.surgery_summary.is_some())),
    ]);

    SummaryReport {
        timestamp: Utc::now().to_rfc3339(),
        bundle: bundle.display().to_string(),
        duration_sec: duration.as_secs_f64(),
        analyses,
        result,
    }
}

fn build_summary_markdown(summary: &SummaryReport<'_>) -> String {
    let clinical = &summary.result.clinical_summary;
    let mut md = String::new();

    md.push_str("# medsum Summary\n\n");
    md.push_str(&format!("**Generated:** {}\n", summary.timestamp));
    md.push_str(&format!("**Bundle:** {}\n", summary.bundle));
    md.push_str(&format!("**Duration:** {:.1}s\n", summary.duration_sec));
    md.push_str(&format!(
        "**Data completeness:** {} (confidence {}/100)\n\n",
        clinical.data_completeness, clinical.confidence_score
    ));

    if !clinical.one_liner.is_empty() {
        md.push_str(&format!("> {}\n\n", clinical.one_liner));
    }

    md.push_str("## Analyses\n\n");
    md.push_str("| Analysis | Status |\n");
    md.push_str("|----------|--------|\n");
    for (name, status) in &summary.analyses {
        let icon = if *status == "produced" { "✅" } else { "⏭️" };
        md.push_str(&format!("| {} | {} {} |\n", name, icon, status));
    }

    if !clinical.priority_alerts.is_empty() {
        md.push_str("\n## Priority Alerts\n\n");
        for alert in &clinical.priority_alerts {
            let icon = match alert.alert_type {
                AlertType::Urgent => "🔴",
                AlertType::Warning => "🟠",
                AlertType::Attention => "🟡",
                AlertType::Info => "🔵",
            };
            md.push_str(&format!(
                "- {} **{}**: {} _{}_\n",
                icon, alert.title, alert.message, alert.recommended_action
            ));
        }
    }

    if !clinical.key_recommendations.is_empty() {
        md.push_str("\n## Recommendations\n\n");
        for (idx, rec) in clinical.key_recommendations.iter().enumerate() {
            md.push_str(&format!(
                "{}. [{:?}] {} ({})\n",
                idx + 1,
                rec.priority,
                rec.recommendation,
                rec.timeframe
            ));
        }
    }

    let handoff = &clinical.handoff_summary;
    md.push_str("\n## Handoff (SBAR)\n\n");
    md.push_str(&format!("- **Situation:** {}\n", handoff.situation));
    md.push_str(&format!("- **Background:** {}\n", handoff.background));
    md.push_str(&format!("- **Assessment:** {}\n", handoff.assessment));
    md.push_str(&format!("- **Recommendation:** {}\n", handoff.recommendation));

    md
}
