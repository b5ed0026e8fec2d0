//! HTML fragments for the timetable page.
//!
//! Renders are stateless: each fragment is a function of the aggregates it
//! is handed. Anything that came from the user or the solver goes through
//! `html_escape` before it reaches markup.

use crate::aggregate::{self, GridAxes, Severity, TeacherLoad, UnassignedRollup, PALETTE_SIZE};
use crate::data::{ConstraintViolation, FeasibilityAnalysis, TimetableResponse, WeekSchedule};
use crate::state::Session;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// Milliseconds before success and error banners remove themselves.
pub const BANNER_CLEAR_MS: u32 = 5000;

const PALETTE: [&str; PALETTE_SIZE] = [
    "#e3f2fd", "#fce4ec", "#e8f5e9", "#fff3e0", "#f3e5f5", "#e0f7fa", "#fffde7", "#efebe9",
    "#e8eaf6", "#f1f8e9",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Warning,
    Danger,
}

impl BannerKind {
    fn css(self) -> &'static str {
        match self {
            BannerKind::Info => "info",
            BannerKind::Success => "success",
            BannerKind::Warning => "warning",
            BannerKind::Danger => "danger",
        }
    }

    fn transient(self) -> bool {
        matches!(self, BannerKind::Success | BannerKind::Danger)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn new(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything one page render needs.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub input: &'a str,
    pub input_error: Option<String>,
    pub banner: Option<Banner>,
    pub session: Option<&'a Session>,
    pub selected_class: Option<&'a str>,
    pub fallback_cap: u32,
}

pub fn render_page(view: &PageView<'_>) -> String {
    let results = match view.session {
        Some(session) => render_results(session, view.selected_class, view.fallback_cap),
        None => r#"<div id="welcomeMessage" class="text-muted">Submit a configuration to generate a timetable.</div>"#
            .to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>School Timetable Generator</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        <h1>School Timetable Generator</h1>
        <div id="apiStatus">{banner}</div>
        {input}
        {results}
    </div>
    <script>{js}</script>
</body>
</html>"#,
        css = inline_css(),
        js = inline_javascript(),
        banner = view.banner.as_ref().map(render_banner).unwrap_or_default(),
        input = render_input(view.input, view.input_error.as_deref()),
        results = results,
    )
}

pub fn render_banner(banner: &Banner) -> String {
    let clear = if banner.kind.transient() {
        format!(r#" data-autoclear-ms="{}""#, BANNER_CLEAR_MS)
    } else {
        String::new()
    };
    format!(
        r#"<div class="alert alert-{kind}" role="alert"{clear}>{msg}</div>"#,
        kind = banner.kind.css(),
        clear = clear,
        msg = text(&banner.message),
    )
}

fn render_input(input: &str, error: Option<&str>) -> String {
    let invalid = if error.is_some() { " is-invalid" } else { "" };
    format!(
        r#"<form method="post" action="/solve" class="config-form">
            <label for="jsonInput">JSON configuration</label>
            <textarea id="jsonInput" name="config" rows="20" class="form-control{invalid}">{input}</textarea>
            <div id="jsonError" class="invalid-feedback">{error}</div>
            <button id="processBtn" type="submit" class="btn btn-primary">Generate Timetable</button>
            <a href="/sample" class="btn btn-secondary">Load Sample</a>
        </form>"#,
        invalid = invalid,
        input = text(input),
        error = text(error.unwrap_or("")),
    )
}

/// Results panel for the current session.
pub fn render_results(session: &Session, selected: Option<&str>, fallback_cap: u32) -> String {
    let response = &session.response;
    let config = session.config.as_ref();

    let subjects = aggregate::subjects_of(response);
    let colors = aggregate::color_assignment(&subjects);
    let loads = aggregate::workload(response, aggregate::teacher_cap(config, fallback_cap));
    let rollup = aggregate::unassigned_rollup(response);
    let classes = aggregate::class_names(response);
    let selected = selected
        .filter(|c| response.student_group_schedules.contains_key(*c))
        .or_else(|| classes.first().map(String::as_str));

    let timetable = match selected {
        Some(class) => {
            let week = response
                .student_group_schedules
                .get(class)
                .and_then(|g| g.week_schedule.as_ref());
            match week {
                Some(week) => {
                    let axes = aggregate::grid_axes(config, Some(week));
                    render_timetable(class, week, &axes, &colors)
                }
                None => r#"<p class="text-muted">No schedule available for this class.</p>"#
                    .to_string(),
            }
        }
        None => r#"<p class="text-muted">No class schedules in this result.</p>"#.to_string(),
    };

    let solver_message = response
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(|m| format!(r#"<p id="solverMessage" class="solver-message">{}</p>"#, text(m)))
        .unwrap_or_default();

    format!(
        r#"<div id="resultsPanel">
            {solver_message}
            <div class="summary-row">{score}{unassigned}</div>
            {selector}
            <div id="timetableDisplay">{timetable}</div>
            <h2>Teacher Workload</h2>
            <div id="teacherWorkload">{workload}</div>
            <h2>Feasibility Analysis</h2>
            <div id="feasibilityAnalysis">{violations}</div>
            {exports}
        </div>"#,
        solver_message = solver_message,
        score = render_score(response),
        unassigned = render_unassigned(&rollup),
        selector = render_class_selector(&classes, selected),
        timetable = timetable,
        workload = render_workload(&loads),
        violations = render_violations(response.feasibility_analysis.as_ref()),
        exports = render_export_buttons(),
    )
}

pub fn render_score(response: &TimetableResponse) -> String {
    let score = response
        .score
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let (score_class, badge) = if response.feasible {
        ("score-good", r#"<span class="badge bg-success">Feasible</span>"#)
    } else {
        ("score-danger", r#"<span class="badge bg-danger">Not Feasible</span>"#)
    };
    format!(
        r#"<div class="card score-card">
            <div class="card-title">Score</div>
            <div id="scoreDisplay" class="h3 {score_class}">{score}</div>
            <div id="feasibilityBadge">{badge}</div>
        </div>"#,
        score_class = score_class,
        score = text(&score),
        badge = badge,
    )
}

pub fn render_unassigned(rollup: &UnassignedRollup) -> String {
    if rollup.is_clear() {
        return r#"<div class="card unassigned-card">
            <div class="card-title">Unassigned Periods</div>
            <div id="unassignedCount" class="h3 score-good">0</div>
            <div id="unassignedMessage">All periods assigned successfully</div>
        </div>"#
            .to_string();
    }

    let mut rows = String::new();
    for (grade, subjects) in &rollup.breakdown {
        for subject in subjects {
            let _ = write!(
                rows,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                text(grade),
                text(&subject.subject),
                subject.periods,
                text(&subject.classes.join(", ")),
            );
        }
    }

    format!(
        r#"<div class="card unassigned-card">
            <div class="card-title">Unassigned Periods</div>
            <div id="unassignedCount" class="h3 score-warning">{total}</div>
            <div id="unassignedMessage">{classes} classes affected across {grades} grades</div>
            <table class="table unassigned-table">
                <thead><tr><th>Grade</th><th>Subject</th><th>Periods</th><th>Classes</th></tr></thead>
                <tbody>{rows}</tbody>
            </table>
        </div>"#,
        total = rollup.total_periods,
        classes = rollup.affected_classes,
        grades = rollup.grades,
        rows = rows,
    )
}

fn render_class_selector(classes: &[String], selected: Option<&str>) -> String {
    let links: String = classes
        .iter()
        .map(|class| {
            let active = if Some(class.as_str()) == selected {
                " active"
            } else {
                ""
            };
            format!(
                r#"<a class="class-link{active}" href="/?class={href}">{name}</a>"#,
                active = active,
                href = attr(&urlencoding::encode(class)),
                name = text(class),
            )
        })
        .collect();
    format!(r#"<nav id="classSelect" class="class-selector">{}</nav>"#, links)
}

/// Weekly grid for one class. Empty cells read "Free Period".
pub fn render_timetable(
    class_name: &str,
    week: &WeekSchedule,
    axes: &GridAxes,
    colors: &HashMap<String, usize>,
) -> String {
    let mut html = format!(
        r#"<div class="class-header">Class {} - Weekly Timetable</div>
        <table class="timetable-table"><thead><tr><th class="time-col">Time</th>"#,
        text(class_name)
    );
    for day in &axes.days {
        let _ = write!(html, r#"<th class="day-header">{}</th>"#, text(day));
    }
    html.push_str("</tr></thead><tbody>");

    for time in &axes.times {
        let _ = write!(html, r#"<tr><td class="time-slot">{}</td>"#, text(time));
        for day in &axes.days {
            match aggregate::lesson_at(week, day, time) {
                Some(lesson) => {
                    let color = colors
                        .get(&lesson.subject)
                        .map(|i| PALETTE[*i])
                        .unwrap_or(PALETTE[0]);
                    let _ = write!(
                        html,
                        r#"<td><div class="lesson-card" style="background-color: {color}">
                            <div class="subject-name">{subject}</div>
                            <div class="teacher-name">{teacher}</div>
                            <div class="time-display">{start} - {end}</div>
                        </div></td>"#,
                        color = color,
                        subject = text(&lesson.subject),
                        teacher = text(&lesson.teacher),
                        start = text(aggregate::hour_minute(&lesson.start_time)),
                        end = text(aggregate::hour_minute(&lesson.end_time)),
                    );
                }
                None => html.push_str(r#"<td class="empty-slot">Free Period</td>"#),
            }
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

pub fn render_workload(loads: &[TeacherLoad]) -> String {
    if loads.is_empty() {
        return r#"<p class="text-muted">No teacher workload data available.</p>"#.to_string();
    }
    let cards: String = loads
        .iter()
        .map(|load| {
            format!(
                r#"<div class="card workload-card">
                    <h6 class="card-title">{teacher}</h6>
                    <div class="workload-bar">
                        <div class="workload-fill bg-{css}" style="width: {percent:.0}%"></div>
                        <div class="workload-text">{assigned}/{cap}</div>
                    </div>
                    <small class="tier-{css}">{label}</small>
                </div>"#,
                teacher = text(&load.teacher),
                css = load.tier.css(),
                percent = load.percent,
                assigned = load.assigned,
                cap = load.cap,
                label = load.tier.label(),
            )
        })
        .collect();
    format!(r#"<div class="workload-grid">{}</div>"#, cards)
}

fn render_violation(violation: &ConstraintViolation) -> String {
    let fix = violation
        .suggested_fix
        .as_deref()
        .map(|f| format!(r#"<p class="suggested-fix"><strong>Suggested fix:</strong> {}</p>"#, text(f)))
        .unwrap_or_default();
    let entities = if violation.affected_entities.is_empty() {
        String::new()
    } else {
        let items: String = violation
            .affected_entities
            .iter()
            .map(|e| format!("<li>{}</li>", text(e)))
            .collect();
        format!(r#"<ul class="affected-entities">{}</ul>"#, items)
    };
    format!(
        r#"<details class="violation">
            <summary>{name} <span class="badge">{count}</span></summary>
            <p>{description}</p>
            {fix}
            {entities}
        </details>"#,
        name = text(&violation.constraint_name),
        count = violation.violation_count,
        description = text(&violation.description),
        fix = fix,
        entities = entities,
    )
}

fn severity_css(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "danger",
        Severity::Medium => "warning",
        Severity::Low => "info",
        Severity::Unknown => "secondary",
    }
}

/// Violation accordion grouped by severity, then recommended actions.
pub fn render_violations(analysis: Option<&FeasibilityAnalysis>) -> String {
    let Some(analysis) = analysis else {
        return r#"<p class="text-muted">No feasibility analysis available.</p>"#.to_string();
    };

    let groups: BTreeMap<Severity, Vec<&ConstraintViolation>> =
        aggregate::violations_by_severity(Some(analysis));

    let mut html = format!(
        r#"<div class="feasibility-summary">
            <span class="badge bg-{badge_css}">{badge}</span>
            <span>Hard violations: {hard}</span>
            <span>Soft violations: {soft}</span>
            <p>{summary}</p>
        </div>"#,
        badge_css = if analysis.feasible { "success" } else { "danger" },
        badge = if analysis.feasible { "Feasible" } else { "Not Feasible" },
        hard = analysis.total_hard_violations,
        soft = analysis.total_soft_violations,
        summary = text(analysis.summary.as_deref().unwrap_or("")),
    );

    for (severity, violations) in &groups {
        let _ = write!(
            html,
            r#"<div class="severity-group severity-{css}"><h3>{severity} ({n})</h3>"#,
            css = severity_css(*severity),
            severity = severity,
            n = violations.len(),
        );
        for violation in violations {
            html.push_str(&render_violation(violation));
        }
        html.push_str("</div>");
    }

    if !analysis.recommended_actions.is_empty() {
        html.push_str(r#"<h3>Recommended Actions</h3><ol class="recommendations">"#);
        for action in &analysis.recommended_actions {
            let _ = write!(html, "<li>{}</li>", text(action));
        }
        html.push_str("</ol>");
    }
    html
}

fn render_export_buttons() -> String {
    r#"<div class="export-buttons">
        <a class="btn btn-outline" href="/export/json" download>Export Feasibility Report (JSON)</a>
        <a class="btn btn-outline" href="/export/csv" download>Export Timetable (CSV)</a>
    </div>"#
        .to_string()
}

fn inline_css() -> &'static str {
    r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 0; background: #f5f6fa; color: #222; }
.container { max-width: 1200px; margin: 0 auto; padding: 24px; }
.form-control { width: 100%; font-family: monospace; }
.is-invalid { border: 2px solid #dc3545; }
.invalid-feedback { color: #dc3545; min-height: 1.2em; }
.btn { display: inline-block; padding: 6px 14px; margin: 8px 8px 8px 0; border-radius: 4px; text-decoration: none; border: 1px solid #888; background: #fff; color: #222; cursor: pointer; }
.btn-primary { background: #0d6efd; color: #fff; border-color: #0d6efd; }
.alert { padding: 10px 14px; border-radius: 4px; margin-bottom: 12px; }
.alert-info { background: #cff4fc; } .alert-success { background: #d1e7dd; }
.alert-warning { background: #fff3cd; } .alert-danger { background: #f8d7da; }
.summary-row { display: flex; gap: 16px; margin: 16px 0; }
.card { background: #fff; border-radius: 6px; padding: 12px 16px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
.score-good { color: #198754; } .score-danger { color: #dc3545; } .score-warning { color: #fd7e14; }
.badge { display: inline-block; padding: 2px 8px; border-radius: 10px; background: #6c757d; color: #fff; font-size: .8em; }
.bg-success { background: #198754; } .bg-danger { background: #dc3545; } .bg-warning { background: #ffc107; }
.class-selector { margin: 12px 0; } .class-link { margin-right: 8px; } .class-link.active { font-weight: bold; }
.timetable-table { border-collapse: collapse; width: 100%; background: #fff; }
.timetable-table th, .timetable-table td { border: 1px solid #ddd; padding: 6px; vertical-align: top; }
.lesson-card { border-radius: 4px; padding: 4px 6px; }
.subject-name { font-weight: bold; } .teacher-name, .time-display { font-size: .85em; }
.empty-slot { color: #aaa; text-align: center; }
.workload-grid { display: grid; grid-template-columns: repeat(2, 1fr); gap: 12px; }
.workload-bar { position: relative; height: 20px; background: #e9ecef; border-radius: 4px; overflow: hidden; }
.workload-fill { height: 100%; }
.workload-text { position: absolute; top: 0; width: 100%; text-align: center; font-size: .8em; line-height: 20px; }
.violation { background: #fff; margin: 6px 0; padding: 6px 10px; border-radius: 4px; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
document.querySelectorAll('[data-autoclear-ms]').forEach(function (el) {
    setTimeout(function () { el.remove(); }, parseInt(el.dataset.autoclearMs, 10));
});
var input = document.getElementById('jsonInput');
if (input) {
    input.addEventListener('keydown', function (e) {
        if (e.ctrlKey && e.key === 'Enter') { input.form.submit(); }
    });
    input.form.addEventListener('submit', function () {
        document.getElementById('processBtn').disabled = true;
    });
}
"#
}
