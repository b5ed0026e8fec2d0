use crate::data::TimetableResponse;
use crate::error::TransportError;
use crate::request::ParsedRequest;
use log::{info, trace, warn};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Instant;

/// Talks to the remote timetable solver. One POST per submission, no retry.
#[derive(Debug, Clone)]
pub struct SolverClient {
    client: Client,
    base_url: String,
}

impl SolverClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn solve_url(&self) -> String {
        format!("{}/solve", self.base_url)
    }

    /// Posts the request text as-is and decodes the solver's answer.
    pub async fn solve(&self, request: &ParsedRequest) -> Result<TimetableResponse, TransportError> {
        let start_time = Instant::now();
        let url = self.solve_url();
        trace!("POST {} ({} bytes)", url, request.text().len());

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(request.text().to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Solver answered {} after {:.2?}", status, start_time.elapsed());
            return Err(TransportError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: TimetableResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        info!(
            "Solver answered in {:.2?}: feasible={}, {} classes",
            start_time.elapsed(),
            parsed.feasible,
            parsed.student_group_schedules.len()
        );
        Ok(parsed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::request::validate;
    use axum::http::StatusCode;
    use axum::{Router, routing::post};

    /// Serves `router` on an ephemeral local port and returns its base URL.
    pub(crate) async fn spawn_mock(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/timetable", addr)
    }

    pub(crate) const TWO_PERIOD_RESPONSE: &str = r#"{
        "score": "0hard/0soft",
        "feasible": true,
        "studentGroupSchedules": {
            "9thA": {"weekSchedule": {"MONDAY": {
                "07:50:00": {"subject": "Math", "teacher": "Tharindu Silva", "startTime": "07:50:00", "endTime": "08:30:00"},
                "08:30:00": {"subject": "Math", "teacher": "Tharindu Silva", "startTime": "08:30:00", "endTime": "09:10:00"}
            }}}
        },
        "teacherWorkloadSummary": {"Tharindu Silva": 2},
        "unassignedSummary": {"totalUnassignedPeriods": 0, "totalUnassignedClasses": 0},
        "unassignedPeriods": {}
    }"#;

    #[tokio::test]
    async fn solve_decodes_successful_reply() {
        let router = Router::new().route(
            "/api/timetable/solve",
            post(|body: String| async move {
                assert!(body.contains("subjectList"));
                ([(CONTENT_TYPE, "application/json")], TWO_PERIOD_RESPONSE)
            }),
        );
        let client = SolverClient::new(spawn_mock(router).await);
        let request = validate(r#"{"subjectList": ["Math"]}"#).unwrap();

        let response = client.solve(&request).await.unwrap();
        assert!(response.feasible);
        assert_eq!(response.teacher_workload_summary["Tharindu Silva"], 2);
    }

    #[tokio::test]
    async fn non_success_status_becomes_transport_error() {
        let router = Router::new().route(
            "/api/timetable/solve",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let client = SolverClient::new(spawn_mock(router).await);
        let request = validate("{}").unwrap();

        let err = client.solve(&request).await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                code: 503,
                reason: "Service Unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unparseable_body_is_a_decode_error() {
        let router = Router::new().route("/api/timetable/solve", post(|| async { "not json" }));
        let client = SolverClient::new(spawn_mock(router).await);
        let request = validate("{}").unwrap();

        let err = client.solve(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_solver_is_a_request_error() {
        // port 9 (discard) is never served in the test environment
        let client = SolverClient::new("http://127.0.0.1:9/api/timetable");
        let request = validate("{}").unwrap();

        let err = client.solve(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let client = SolverClient::new("http://localhost:8080/api/timetable/");
        assert_eq!(client.solve_url(), "http://localhost:8080/api/timetable/solve");
    }
}
