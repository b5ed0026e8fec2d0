use crate::error::AppError;
use crate::export;
use crate::render::{self, Banner, BannerKind, PageView};
use crate::request::{self, SAMPLE_REQUEST};
use crate::state::{AppState, Session};
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Utc;
use log::{error, info, warn};
use serde::Deserialize;

const SUCCESS_MESSAGE: &str = "Timetable generated successfully!";

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    class: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SolveForm {
    #[serde(default)]
    config: String,
}

fn page(
    state: &AppState,
    input: &str,
    input_error: Option<String>,
    banner: Option<Banner>,
    session: Option<&Session>,
    selected_class: Option<&str>,
) -> Html<String> {
    Html(render::render_page(&PageView {
        input,
        input_error,
        banner,
        session,
        selected_class,
        fallback_cap: state.fallback_cap,
    }))
}

async fn index_handler(State(state): State<AppState>, Query(view): Query<ViewQuery>) -> Html<String> {
    let current = state.current().await;
    let input = current
        .as_ref()
        .map(|s| s.request.text().to_string())
        .unwrap_or_else(|| state.initial_request.to_string());
    page(&state, &input, None, None, current.as_deref(), view.class.as_deref())
}

async fn sample_handler(State(state): State<AppState>) -> Html<String> {
    let current = state.current().await;
    let banner = Banner::new(BannerKind::Info, "Sample configuration loaded.");
    page(&state, SAMPLE_REQUEST, None, Some(banner), current.as_deref(), None)
}

async fn solve_handler(State(state): State<AppState>, Form(form): Form<SolveForm>) -> Html<String> {
    let parsed = match request::validate(&form.config) {
        Ok(parsed) => parsed,
        Err(e) => {
            info!("Rejected submission: {}", e);
            let current = state.current().await;
            return page(&state, &form.config, Some(e.to_string()), None, current.as_deref(), None);
        }
    };

    let Some(_guard) = state.try_begin_submission() else {
        warn!("Submission refused: another one is still being processed");
        let current = state.current().await;
        let banner = Banner::new(
            BannerKind::Warning,
            "A timetable request is already being processed. Please wait for it to finish.",
        );
        return page(&state, &form.config, None, Some(banner), current.as_deref(), None);
    };

    info!("Submitting timetable request to {}", state.solver.solve_url());
    match state.solver.solve(&parsed).await {
        Ok(response) => match response.solver_failure() {
            Some(reason) => {
                error!("Solver reported a failure: {}", reason);
                let current = state.current().await;
                let banner = Banner::new(BannerKind::Danger, reason);
                page(&state, parsed.text(), None, Some(banner), current.as_deref(), None)
            }
            None => {
                let session = state.replace(Session::new(parsed, response)).await;
                let banner = Banner::new(BannerKind::Success, SUCCESS_MESSAGE);
                page(&state, session.request.text(), None, Some(banner), Some(session.as_ref()), None)
            }
        },
        Err(e) => {
            error!("Error processing timetable: {}", e);
            let current = state.current().await;
            let banner = Banner::new(BannerKind::Danger, format!("Error: {}", e));
            page(&state, parsed.text(), None, Some(banner), current.as_deref(), None)
        }
    }
}

fn attachment(content_type: &str, filename: String, body: String) -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
}

async fn export_json_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.current().await.ok_or(AppError::NoResult)?;
    let now = Utc::now();
    let body = export::export_json(&session.response, now)?;
    let filename = export::json_filename(now);
    info!("Exported feasibility report {}", filename);
    Ok(attachment("application/json", filename, body))
}

async fn export_csv_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.current().await.ok_or(AppError::NoResult)?;
    let now = Utc::now();
    let body = export::export_csv(&session.response)?;
    let filename = export::csv_filename(now);
    info!("Exported timetable {}", filename);
    Ok(attachment("text/csv; charset=utf-8", filename, body))
}

async fn health_handler() -> &'static str {
    "Timetable console is running"
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/sample", get(sample_handler))
        .route("/solve", post(solve_handler))
        .route("/export/json", get(export_json_handler))
        .route("/export/csv", get(export_csv_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn run_server(bind: &str, state: AppState) -> std::io::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
