// Web view - REST API + instructor summary page with Axum
//
// The repository is loaded once and injected into the router state; handlers
// only read from it.

use crate::entities::InstructorSummaryRow;
use crate::render::INSTRUCTOR_FIELDS;
use crate::repository::Repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<Repository>,
}

impl AppState {
    pub fn new(repository: Repository) -> Self {
        AppState {
            repository: Arc::new(repository),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/instructors", get(get_instructors))
        .route("/students", get(get_students))
        .route("/students/:cwid", get(get_student))
        .route("/majors", get(get_majors))
        .route("/report", get(get_load_report))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_index))
        .route("/instructor_summary", get(instructor_summary_page))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/instructors - One row per (instructor, course)
async fn get_instructors(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.repository.instructor_summary()))
}

/// GET /api/students - Student summaries with remaining courses
async fn get_students(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.repository.student_summary()))
}

/// GET /api/students/:cwid - A single student summary
async fn get_student(
    State(state): State<AppState>,
    Path(cwid): Path<String>,
) -> impl IntoResponse {
    match state.repository.student(&cwid) {
        Ok(student) => (
            StatusCode::OK,
            Json(ApiResponse::ok(state.repository.summarize_student(student))),
        )
            .into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::err(e.to_string())),
        )
            .into_response(),
    }
}

/// GET /api/majors - Required and elective courses per major
async fn get_majors(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.repository.major_summary()))
}

/// GET /api/report - What happened while loading
async fn get_load_report(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.repository.load_report().clone()))
}

// ============================================================================
// Pages
// ============================================================================

/// GET / - Homepage
async fn serve_index(State(state): State<AppState>) -> impl IntoResponse {
    Html(page(
        &format!("{} Repository", state.repository.name()),
        "<p><a href=\"/instructor_summary\">Instructor Summary</a></p>",
    ))
}

/// GET /instructor_summary - Instructor summary table
async fn instructor_summary_page(State(state): State<AppState>) -> impl IntoResponse {
    let rows = state.repository.instructor_summary();
    Html(page(
        &format!("{} Instructor Summary", state.repository.name()),
        &instructor_table_html(&rows),
    ))
}

pub fn instructor_table_html(rows: &[InstructorSummaryRow]) -> String {
    let header: String = INSTRUCTOR_FIELDS
        .iter()
        .map(|field| format!("<th>{}</th>", field))
        .collect();

    let body: String = rows
        .iter()
        .map(|row| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&row.cwid),
                escape_html(&row.name),
                escape_html(&row.department),
                escape_html(&row.course),
                row.students
            )
        })
        .collect();

    format!(
        "<h2>Summary:</h2>\n<table>\n<thead><tr>{}</tr></thead>\n<tbody>{}</tbody>\n</table>",
        header, body
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
        body = body
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
