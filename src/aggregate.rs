//! Display-ready summaries derived from a solver response.
//!
//! Every function here is pure and tolerates missing optional data: an
//! absent section yields an empty or zero result.

use crate::data::{
    ClassName, ConstraintViolation, FeasibilityAnalysis, Grade, Lesson, Subject, TeacherName,
    TimetableRequest, TimetableResponse, WeekSchedule,
};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Number of distinct lesson colors before they repeat.
pub const PALETTE_SIZE: usize = 10;

/// Weekly cap assumed when the request does not carry one.
pub const DEFAULT_TEACHER_CAP: u32 = 20;

const HEAVY_PERCENT: f64 = 75.0;
const OVERLOADED_PERCENT: f64 = 100.0;

const WEEKDAYS: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

/// Distinct subject names across all lessons, sorted.
pub fn subjects_of(response: &TimetableResponse) -> Vec<Subject> {
    response
        .lessons()
        .map(|(_, _, _, lesson)| lesson.subject.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Maps the i-th subject to palette index `i % PALETTE_SIZE`.
pub fn color_assignment(subjects: &[Subject]) -> HashMap<Subject, usize> {
    subjects
        .iter()
        .enumerate()
        .map(|(i, s)| (s.clone(), i % PALETTE_SIZE))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTier {
    Normal,
    Heavy,
    Overloaded,
}

impl LoadTier {
    pub fn label(self) -> &'static str {
        match self {
            LoadTier::Normal => "Normal Load",
            LoadTier::Heavy => "Heavy Load",
            LoadTier::Overloaded => "Overloaded",
        }
    }

    pub fn css(self) -> &'static str {
        match self {
            LoadTier::Normal => "success",
            LoadTier::Heavy => "warning",
            LoadTier::Overloaded => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherLoad {
    pub teacher: TeacherName,
    pub assigned: u32,
    pub cap: u32,
    /// Share of the cap, clamped to [0, 100].
    pub percent: f64,
    pub tier: LoadTier,
}

/// Effective weekly cap: the request's own limit when positive, else `fallback`.
pub fn teacher_cap(request: Option<&TimetableRequest>, fallback: u32) -> u32 {
    request
        .map(|r| r.teacher_workload_config.max_periods_per_teacher_per_week)
        .filter(|cap| *cap > 0)
        .unwrap_or(fallback)
}

/// Per-teacher load against `teacher_cap`, sorted by teacher name.
pub fn workload(response: &TimetableResponse, teacher_cap: u32) -> Vec<TeacherLoad> {
    let cap = teacher_cap.max(1);
    response
        .teacher_workload_summary
        .iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(teacher, assigned)| {
            let raw = f64::from(*assigned) / f64::from(cap) * 100.0;
            let tier = if raw >= OVERLOADED_PERCENT {
                LoadTier::Overloaded
            } else if raw >= HEAVY_PERCENT {
                LoadTier::Heavy
            } else {
                LoadTier::Normal
            };
            TeacherLoad {
                teacher: teacher.clone(),
                assigned: *assigned,
                cap,
                percent: raw.clamp(0.0, 100.0),
                tier,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnassignedSubject {
    pub subject: Subject,
    pub periods: u32,
    pub classes: Vec<ClassName>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnassignedRollup {
    pub total_periods: u32,
    pub affected_classes: usize,
    pub grades: usize,
    /// grade -> subjects, both sorted
    pub breakdown: BTreeMap<Grade, Vec<UnassignedSubject>>,
}

impl UnassignedRollup {
    pub fn is_clear(&self) -> bool {
        self.total_periods == 0
    }
}

/// Totals come from `unassignedPeriods`; affected classes from
/// `detailedUnassignedPeriods`.
pub fn unassigned_rollup(response: &TimetableResponse) -> UnassignedRollup {
    let total_periods = response
        .unassigned_periods
        .values()
        .flat_map(|subjects| subjects.values())
        .sum();

    let affected_classes = response
        .detailed_unassigned_periods
        .iter()
        .flat_map(|(grade, subjects)| {
            subjects
                .values()
                .flat_map(move |classes| classes.keys().map(move |class| (grade, class)))
        })
        .unique()
        .count();

    let breakdown = response
        .unassigned_periods
        .iter()
        .map(|(grade, subjects)| {
            let rows = subjects
                .iter()
                .sorted_by(|a, b| a.0.cmp(b.0))
                .map(|(subject, periods)| UnassignedSubject {
                    subject: subject.clone(),
                    periods: *periods,
                    classes: response
                        .detailed_unassigned_periods
                        .get(grade)
                        .and_then(|s| s.get(subject))
                        .map(|classes| classes.keys().sorted().cloned().collect())
                        .unwrap_or_default(),
                })
                .collect();
            (grade.clone(), rows)
        })
        .collect();

    UnassignedRollup {
        total_periods,
        affected_classes,
        grades: response.unassigned_periods.len(),
        breakdown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("HIGH") => Severity::High,
            Some("MEDIUM") => Severity::Medium,
            Some("LOW") => Severity::Low,
            _ => Severity::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Hard violations grouped by severity tier, tiers ordered HIGH first.
/// Backend order is kept within a tier.
pub fn violations_by_severity(
    analysis: Option<&FeasibilityAnalysis>,
) -> BTreeMap<Severity, Vec<&ConstraintViolation>> {
    let mut groups: BTreeMap<Severity, Vec<&ConstraintViolation>> = BTreeMap::new();
    for violation in analysis.into_iter().flat_map(|a| a.hard_constraint_violations.iter()) {
        groups
            .entry(Severity::parse(violation.severity.as_deref()))
            .or_default()
            .push(violation);
    }
    groups
}

/// `07:50:00` and `07:50` both display as `07:50`.
pub fn hour_minute(time: &str) -> &str {
    match time.char_indices().filter(|(_, c)| *c == ':').nth(1) {
        Some((i, _)) => &time[..i],
        None => time,
    }
}

/// Finds the lesson at `time` on `day`, whether the schedule keys carry
/// seconds or not.
pub fn lesson_at<'a>(week: &'a WeekSchedule, day: &str, time: &str) -> Option<&'a Lesson> {
    let slots = week.get(day)?;
    slots.get(time).or_else(|| {
        let wanted = hour_minute(time);
        slots
            .iter()
            .find(|(key, _)| hour_minute(key) == wanted)
            .map(|(_, lesson)| lesson)
    })
}

/// Calendar position of `day`; unknown names sort after SUNDAY.
pub(crate) fn day_rank(day: &str) -> usize {
    WEEKDAYS
        .iter()
        .position(|d| d.eq_ignore_ascii_case(day))
        .unwrap_or(WEEKDAYS.len())
}

/// Columns (days) and rows (HH:MM start times) of the timetable grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridAxes {
    pub days: Vec<String>,
    pub times: Vec<String>,
}

/// Union of the request's timeslots and the times actually scheduled for
/// `week`. Days follow the calendar, unknown names last.
pub fn grid_axes(request: Option<&TimetableRequest>, week: Option<&WeekSchedule>) -> GridAxes {
    let mut days: BTreeSet<(usize, String)> = BTreeSet::new();
    let mut times: BTreeSet<String> = BTreeSet::new();

    for slot in request.iter().flat_map(|r| &r.timeslot_list) {
        days.insert((day_rank(&slot.day_of_week), slot.day_of_week.clone()));
        times.insert(hour_minute(&slot.start_time).to_string());
    }
    for (day, slots) in week.into_iter().flatten() {
        days.insert((day_rank(day), day.clone()));
        times.extend(slots.keys().map(|t| hour_minute(t).to_string()));
    }

    GridAxes {
        days: days.into_iter().map(|(_, d)| d).collect(),
        times: times.into_iter().collect(),
    }
}

/// Class names in display order.
pub fn class_names(response: &TimetableResponse) -> Vec<ClassName> {
    response.student_group_schedules.keys().sorted().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StudentGroupSchedule;

    fn lesson(subject: &str, teacher: &str, start: &str, end: &str) -> Lesson {
        Lesson {
            subject: subject.to_string(),
            teacher: teacher.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    fn response_with(lessons: &[(&str, &str, &str, Lesson)]) -> TimetableResponse {
        let mut response = TimetableResponse::default();
        for (class, day, time, l) in lessons {
            response
                .student_group_schedules
                .entry(class.to_string())
                .or_insert_with(|| StudentGroupSchedule {
                    week_schedule: Some(WeekSchedule::new()),
                })
                .week_schedule
                .as_mut()
                .unwrap()
                .entry(day.to_string())
                .or_default()
                .insert(time.to_string(), l.clone());
        }
        response
    }

    #[test]
    fn subjects_are_sorted_and_unique_regardless_of_order() {
        let a = response_with(&[
            ("9thA", "MONDAY", "07:50", lesson("Physics", "T1", "07:50", "08:30")),
            ("9thA", "MONDAY", "08:30", lesson("Math", "T2", "08:30", "09:10")),
            ("9thB", "TUESDAY", "07:50", lesson("Physics", "T1", "07:50", "08:30")),
        ]);
        let b = response_with(&[
            ("9thB", "TUESDAY", "07:50", lesson("Physics", "T1", "07:50", "08:30")),
            ("9thA", "MONDAY", "08:30", lesson("Math", "T2", "08:30", "09:10")),
        ]);
        assert_eq!(subjects_of(&a), vec!["Math", "Physics"]);
        assert_eq!(subjects_of(&a), subjects_of(&a));
        assert_eq!(subjects_of(&a), subjects_of(&b));
    }

    #[test]
    fn colors_wrap_around_the_palette() {
        let subjects: Vec<Subject> = (0..12).map(|i| format!("S{:02}", i)).collect();
        let colors = color_assignment(&subjects);
        assert_eq!(colors["S00"], 0);
        assert_eq!(colors["S09"], 9);
        assert_eq!(colors["S10"], 0);
        assert_eq!(colors["S11"], 1);
    }

    #[test]
    fn teacher_at_cap_is_full_and_overloaded_every_time() {
        let mut response = TimetableResponse::default();
        response
            .teacher_workload_summary
            .insert("Marie Curie".to_string(), 20);
        let first = workload(&response, 20);
        let second = workload(&response, 20);
        assert_eq!(first, second);
        assert_eq!(first[0].percent, 100.0);
        assert_eq!(first[0].tier, LoadTier::Overloaded);
    }

    #[test]
    fn workload_tiers_and_clamping() {
        let mut response = TimetableResponse::default();
        response.teacher_workload_summary.insert("A".to_string(), 5);
        response.teacher_workload_summary.insert("B".to_string(), 15);
        response.teacher_workload_summary.insert("C".to_string(), 30);
        let loads = workload(&response, 20);
        assert_eq!(loads[0].tier, LoadTier::Normal);
        assert_eq!(loads[0].percent, 25.0);
        assert_eq!(loads[1].tier, LoadTier::Heavy);
        assert_eq!(loads[2].tier, LoadTier::Overloaded);
        assert_eq!(loads[2].percent, 100.0);
    }

    #[test]
    fn workload_without_data_is_empty() {
        assert!(workload(&TimetableResponse::default(), 20).is_empty());
    }

    #[test]
    fn cap_prefers_request_value() {
        let mut request = TimetableRequest::default();
        assert_eq!(teacher_cap(Some(&request), 20), 20);
        request.teacher_workload_config.max_periods_per_teacher_per_week = 12;
        assert_eq!(teacher_cap(Some(&request), 20), 12);
        assert_eq!(teacher_cap(None, 18), 18);
    }

    #[test]
    fn rollup_of_empty_response_is_clear() {
        let rollup = unassigned_rollup(&TimetableResponse::default());
        assert!(rollup.is_clear());
        assert_eq!(rollup, UnassignedRollup::default());
    }

    #[test]
    fn rollup_counts_periods_classes_and_grades() {
        let response: TimetableResponse = serde_json::from_str(
            r#"{
                "feasible": false,
                "unassignedPeriods": {
                    "9th": {"Math": 14, "English": 5},
                    "10th": {"Math": 8}
                },
                "detailedUnassignedPeriods": {
                    "9th": {"Math": {"A": 7, "B": 7}, "English": {"A": 5}},
                    "10th": {"Math": {"A": 8}}
                }
            }"#,
        )
        .unwrap();
        let rollup = unassigned_rollup(&response);
        assert_eq!(rollup.total_periods, 27);
        // 9th A, 9th B, 10th A
        assert_eq!(rollup.affected_classes, 3);
        assert_eq!(rollup.grades, 2);
        let ninth = &rollup.breakdown["9th"];
        assert_eq!(ninth[0].subject, "English");
        assert_eq!(ninth[1].classes, vec!["A", "B"]);
    }

    #[test]
    fn violations_group_by_tier_and_keep_order() {
        let analysis: FeasibilityAnalysis = serde_json::from_str(
            r#"{
                "hardConstraintViolations": [
                    {"constraintName": "c1", "severity": "MEDIUM"},
                    {"constraintName": "c2", "severity": "HIGH"},
                    {"constraintName": "c3"},
                    {"constraintName": "c4", "severity": "HIGH"},
                    {"constraintName": "c5", "severity": "low"}
                ]
            }"#,
        )
        .unwrap();
        let groups = violations_by_severity(Some(&analysis));
        let order: Vec<Severity> = groups.keys().copied().collect();
        assert_eq!(
            order,
            vec![Severity::High, Severity::Medium, Severity::Low, Severity::Unknown]
        );
        let high: Vec<&str> = groups[&Severity::High]
            .iter()
            .map(|v| v.constraint_name.as_str())
            .collect();
        assert_eq!(high, vec!["c2", "c4"]);
        assert_eq!(groups[&Severity::Unknown][0].constraint_name, "c3");
    }

    #[test]
    fn no_analysis_means_no_groups() {
        assert!(violations_by_severity(None).is_empty());
    }

    #[test]
    fn lookup_matches_with_or_without_seconds() {
        let response = response_with(&[(
            "9thA",
            "MONDAY",
            "07:50:00",
            lesson("Math", "T1", "07:50:00", "08:30:00"),
        )]);
        let week = response.student_group_schedules["9thA"]
            .week_schedule
            .as_ref()
            .unwrap();
        assert!(lesson_at(week, "MONDAY", "07:50").is_some());
        assert!(lesson_at(week, "MONDAY", "07:50:00").is_some());
        assert!(lesson_at(week, "MONDAY", "08:30").is_none());
        assert!(lesson_at(week, "TUESDAY", "07:50").is_none());
        assert_eq!(hour_minute("07:50:00"), "07:50");
        assert_eq!(hour_minute("07:50"), "07:50");
    }

    #[test]
    fn axes_merge_request_and_schedule() {
        let request: TimetableRequest = serde_json::from_str(
            r#"{"timeslotList": [
                {"id": 2, "dayOfWeek": "TUESDAY", "startTime": "08:30:00", "endTime": "09:10:00"},
                {"id": 1, "dayOfWeek": "MONDAY", "startTime": "07:50:00", "endTime": "08:30:00"}
            ]}"#,
        )
        .unwrap();
        let response = response_with(&[(
            "9thA",
            "FRIDAY",
            "10:50",
            lesson("Math", "T1", "10:50", "11:30"),
        )]);
        let week = response.student_group_schedules["9thA"].week_schedule.as_ref();
        let axes = grid_axes(Some(&request), week);
        assert_eq!(axes.days, vec!["MONDAY", "TUESDAY", "FRIDAY"]);
        assert_eq!(axes.times, vec!["07:50", "08:30", "10:50"]);
    }
}
