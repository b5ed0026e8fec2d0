use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

// Type aliases for clarity
pub type ClassName = String;
pub type DayName = String;
pub type TimeKey = String;
pub type TeacherName = String;
pub type Grade = String;
pub type Subject = String;

/// Backends built on nullable DTOs send `null` for empty collections.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A fixed (day, start, end) period in the weekly grid.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeslot {
    #[serde(default)]
    pub id: i64,
    pub day_of_week: DayName,
    pub start_time: TimeKey,
    pub end_time: TimeKey,
}

/// A grade and its section labels, e.g. "9th" with ["A", "B"].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassInfo {
    pub grade: Grade,
    #[serde(default, deserialize_with = "null_as_default")]
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherWorkloadConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_timeslots_per_week: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub free_periods_per_teacher_per_week: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_periods_per_teacher_per_week: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonAssignment {
    pub subject: Subject,
    pub grade: Grade,
    #[serde(default, deserialize_with = "null_as_default")]
    pub possible_teachers: Vec<TeacherName>,
    pub periods_per_week: u32,
    pub max_periods_per_day: u32,
}

/// The request posted to the solver.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub timeslot_list: Vec<Timeslot>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub class_list: Vec<ClassInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub teacher_workload_config: TeacherWorkloadConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject_list: Vec<Subject>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lesson_assignment_list: Vec<LessonAssignment>,
}

/// Solver-defined score: either a plain number or a textual form such as
/// `0hard/-12soft`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Score {
    Numeric(serde_json::Number),
    Text(String),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Numeric(n) => write!(f, "{}", n),
            Score::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One scheduled lesson.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub subject: Subject,
    #[serde(default, deserialize_with = "null_as_default")]
    pub teacher: TeacherName,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_time: TimeKey,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_time: TimeKey,
}

/// day -> start time -> lesson
pub type WeekSchedule = HashMap<DayName, HashMap<TimeKey, Lesson>>;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGroupSchedule {
    #[serde(default)]
    pub week_schedule: Option<WeekSchedule>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_unassigned_periods: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_unassigned_classes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_breakdown: Option<serde_json::Value>,
}

/// A backend-reported rule breach.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintViolation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub constraint_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub violation_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub affected_entities: Vec<String>,
    #[serde(default)]
    pub suggested_fix: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub feasible: bool,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_hard_violations: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_soft_violations: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hard_constraint_violations: Vec<ConstraintViolation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_actions: Vec<String>,
}

/// The solver's answer. Every field besides `feasible` may be absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableResponse {
    #[serde(default)]
    pub score: Option<Score>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub feasible: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub student_group_schedules: HashMap<ClassName, StudentGroupSchedule>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub teacher_workload_summary: HashMap<TeacherName, u32>,
    #[serde(default)]
    pub unassigned_summary: Option<UnassignedSummary>,
    /// grade -> subject -> periods
    #[serde(default, deserialize_with = "null_as_default")]
    pub unassigned_periods: HashMap<Grade, HashMap<Subject, u32>>,
    /// grade -> subject -> class -> periods
    #[serde(default, deserialize_with = "null_as_default")]
    pub detailed_unassigned_periods: HashMap<Grade, HashMap<Subject, HashMap<ClassName, u32>>>,
    #[serde(default)]
    pub feasibility_analysis: Option<FeasibilityAnalysis>,
}

impl TimetableResponse {
    /// The solver reports internal failures as a normal reply whose score
    /// reads `Error: ...`. Returns the best description of such a failure.
    pub fn solver_failure(&self) -> Option<&str> {
        let Some(Score::Text(score)) = &self.score else {
            return None;
        };
        if !score.trim_start().starts_with("Error:") {
            return None;
        }
        Some(
            self.message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(score.as_str()),
        )
    }

    /// Iterates every (class, day, time, lesson) in the response.
    pub fn lessons(&self) -> impl Iterator<Item = (&ClassName, &DayName, &TimeKey, &Lesson)> {
        self.student_group_schedules
            .iter()
            .filter_map(|(class, group)| group.week_schedule.as_ref().map(|w| (class, w)))
            .flat_map(|(class, week)| {
                week.iter().flat_map(move |(day, slots)| {
                    slots.iter().map(move |(time, lesson)| (class, day, time, lesson))
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_accepts_numbers_and_text() {
        let n: Score = serde_json::from_str("-12").unwrap();
        assert_eq!(n.to_string(), "-12");
        let t: Score = serde_json::from_str("\"0hard/-5soft\"").unwrap();
        assert_eq!(t.to_string(), "0hard/-5soft");
    }

    #[test]
    fn minimal_response_deserializes_with_empty_defaults() {
        let resp: TimetableResponse = serde_json::from_str(r#"{"feasible": true}"#).unwrap();
        assert!(resp.feasible);
        assert!(resp.score.is_none());
        assert!(resp.student_group_schedules.is_empty());
        assert!(resp.feasibility_analysis.is_none());
        assert_eq!(resp.lessons().count(), 0);
    }

    #[test]
    fn null_collections_read_as_empty() {
        let resp: TimetableResponse = serde_json::from_str(
            r#"{"feasible": false, "unassignedPeriods": null, "teacherWorkloadSummary": null}"#,
        )
        .unwrap();
        assert!(resp.unassigned_periods.is_empty());
        assert!(resp.teacher_workload_summary.is_empty());
    }

    #[test]
    fn error_score_is_a_solver_failure() {
        let failed: TimetableResponse = serde_json::from_str(
            r#"{"feasible": false, "score": "Error: NPE", "message": "Failed to solve timetable: NPE"}"#,
        )
        .unwrap();
        assert_eq!(failed.solver_failure(), Some("Failed to solve timetable: NPE"));

        let bare: TimetableResponse =
            serde_json::from_str(r#"{"feasible": false, "score": "Error: NPE"}"#).unwrap();
        assert_eq!(bare.solver_failure(), Some("Error: NPE"));

        let infeasible: TimetableResponse =
            serde_json::from_str(r#"{"feasible": false, "score": "-3hard/0soft"}"#).unwrap();
        assert_eq!(infeasible.solver_failure(), None);
    }

    #[test]
    fn lessons_walks_nested_schedule() {
        let resp: TimetableResponse = serde_json::from_str(
            r#"{
                "feasible": true,
                "studentGroupSchedules": {
                    "9thA": {"weekSchedule": {"MONDAY": {
                        "07:50": {"subject": "Math", "teacher": "T1", "startTime": "07:50", "endTime": "08:30"},
                        "08:30": {"subject": "Math", "teacher": "T1", "startTime": "08:30", "endTime": "09:10"}
                    }}},
                    "9thB": {}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(resp.lessons().count(), 2);
        assert!(resp.lessons().all(|(class, day, _, _)| class == "9thA" && day == "MONDAY"));
    }
}
