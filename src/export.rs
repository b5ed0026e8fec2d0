use crate::aggregate::{self, day_rank, hour_minute};
use crate::data::{ConstraintViolation, Score, TimetableResponse, UnassignedSummary};
use crate::error::ExportError;
use chrono::{DateTime, Utc};
use csv::{QuoteStyle, WriterBuilder};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

pub const CSV_HEADER: &str = "Class,Day,Time,Subject,Teacher,Duration";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnassignedReport<'a> {
    total_unassigned_periods: u32,
    affected_classes: usize,
    affected_grades: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend_summary: Option<&'a UnassignedSummary>,
}

/// Feasibility report written by [`export_json`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeasibilityReport<'a> {
    generated_at: DateTime<Utc>,
    score: Option<&'a Score>,
    feasible: bool,
    summary: Option<&'a str>,
    total_hard_violations: u32,
    total_soft_violations: u32,
    violations: Vec<&'a ConstraintViolation>,
    recommendations: Vec<&'a str>,
    teacher_workload: BTreeMap<&'a str, u32>,
    unassigned_summary: UnassignedReport<'a>,
}

/// The whole result as a JSON report, regardless of which class is on screen.
pub fn export_json(
    response: &TimetableResponse,
    generated_at: DateTime<Utc>,
) -> Result<String, ExportError> {
    let analysis = response.feasibility_analysis.as_ref();
    let rollup = aggregate::unassigned_rollup(response);

    let report = FeasibilityReport {
        generated_at,
        score: response.score.as_ref(),
        feasible: analysis.map(|a| a.feasible).unwrap_or(response.feasible),
        summary: analysis.and_then(|a| a.summary.as_deref()),
        total_hard_violations: analysis.map(|a| a.total_hard_violations).unwrap_or(0),
        total_soft_violations: analysis.map(|a| a.total_soft_violations).unwrap_or(0),
        violations: analysis
            .map(|a| a.hard_constraint_violations.iter().collect())
            .unwrap_or_default(),
        recommendations: analysis
            .map(|a| a.recommended_actions.iter().map(String::as_str).collect())
            .unwrap_or_default(),
        teacher_workload: response
            .teacher_workload_summary
            .iter()
            .map(|(t, n)| (t.as_str(), *n))
            .collect(),
        unassigned_summary: UnassignedReport {
            total_unassigned_periods: rollup.total_periods,
            affected_classes: rollup.affected_classes,
            affected_grades: rollup.grades,
            backend_summary: response.unassigned_summary.as_ref(),
        },
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// One quoted row per scheduled lesson under a fixed header.
pub fn export_csv(response: &TimetableResponse) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(CSV_HEADER.as_bytes());
    buffer.push(b'\n');

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(buffer);

    let rows = response
        .lessons()
        .sorted_by_key(|(class, day, time, _)| (*class, day_rank(day), *day, hour_minute(*time)));
    for (class, day, time, lesson) in rows {
        let duration = format!(
            "{}-{}",
            hour_minute(&lesson.start_time),
            hour_minute(&lesson.end_time)
        );
        writer.write_record([
            class.as_str(),
            day.as_str(),
            hour_minute(time),
            lesson.subject.as_str(),
            lesson.teacher.as_str(),
            duration.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}

/// `2026-10-16T09-41-07` style suffix that is safe in file names.
pub fn timestamp_suffix(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S").to_string()
}

pub fn json_filename(at: DateTime<Utc>) -> String {
    format!("feasibility-report-{}.json", timestamp_suffix(at))
}

pub fn csv_filename(at: DateTime<Utc>) -> String {
    format!("timetable-{}.csv", timestamp_suffix(at))
}
