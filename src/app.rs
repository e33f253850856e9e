use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::dashboard::{Command, Dashboard, DashboardError, Reply, View};
use crate::store::StoreError;

/// Interactions are handled one at a time; the mutex is the queue.
pub struct AppState {
    dashboard: Mutex<Dashboard>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        AppState {
            dashboard: Mutex::new(dashboard),
        }
    }
}

#[derive(Serialize)]
struct CommandResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    view: View,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/view", get(get_view))
        .route("/api/command", post(run_command))
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(Dashboard::new(config.data.clone())));
    let app = router(state);

    let listener = TcpListener::bind(config.bind).await?;
    log::info!(
        "serving {} on http://{}",
        config.data.display(),
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn get_view(State(state): State<Arc<AppState>>) -> Response {
    let reply = match state.dashboard.lock() {
        Ok(mut dashboard) => dashboard.render(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };
    respond(reply)
}

async fn run_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<Command>,
) -> Response {
    let reply = match state.dashboard.lock() {
        Ok(mut dashboard) => dashboard.handle(command),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };
    respond(reply)
}

fn respond(reply: Reply) -> Response {
    let (status, body) = match reply.outcome {
        None => (
            StatusCode::OK,
            CommandResponse {
                status: "ok",
                kind: None,
                message: None,
                view: reply.view,
            },
        ),
        Some(Ok(success)) => {
            let message = success.message();
            (
                StatusCode::OK,
                CommandResponse {
                    status: "ok",
                    kind: None,
                    message: (!message.is_empty()).then_some(message),
                    view: reply.view,
                },
            )
        }
        Some(Err(e)) => (
            status_for(&e),
            CommandResponse {
                status: "error",
                kind: Some(e.kind()),
                message: Some(e.to_string()),
                view: reply.view,
            },
        ),
    };

    (status, Json(body)).into_response()
}

fn status_for(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::StudentNotFound(_) | DashboardError::UnknownSheet(_) => {
            StatusCode::NOT_FOUND
        }
        DashboardError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        DashboardError::Store(StoreError::PermissionDenied { .. }) => StatusCode::CONFLICT,
        DashboardError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        e if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_REQUEST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;
    use crate::table::{CellValue, MEMBERS_SHEET, NAME, POINTS, STUDENT_ID, Sheet, Workbook};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn seeded_router(dir: &std::path::Path) -> Router {
        let path = dir.join("members.xlsx");
        let mut members = Sheet::with_columns([STUDENT_ID, NAME, POINTS]);
        members.push_record([
            (STUDENT_ID, CellValue::text("1")),
            (NAME, CellValue::text("Ana")),
            (POINTS, CellValue::Int(10)),
        ]);
        store::save(Workbook::new().with_sheet(MEMBERS_SHEET, members), &path).unwrap();
        router(Arc::new(AppState::new(Dashboard::new(path))))
    }

    async fn post_command(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/command")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn view_defaults_to_overview() {
        let dir = tempdir().unwrap();
        let app = seeded_router(dir.path());

        let response = app
            .oneshot(Request::builder().uri("/api/view").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["view"]["view"], "overview");
        assert_eq!(body["view"]["selected"], "members");
        assert_eq!(body["view"]["table"]["rows"][0][1], "Ana");
    }

    #[tokio::test]
    async fn logging_points_reports_success() {
        let dir = tempdir().unwrap();
        let app = seeded_router(dir.path());

        let (status, body) = post_command(
            app,
            r#"{"command":"log_points","student_id":"1","points":5}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["view"]["table"]["rows"][0][2], 15);
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let dir = tempdir().unwrap();
        let app = seeded_router(dir.path());

        let (status, body) = post_command(
            app,
            r#"{"command":"log_points","student_id":"9","points":5}"#,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "student_not_found");
    }

    #[tokio::test]
    async fn validation_failures_are_unprocessable() {
        let dir = tempdir().unwrap();
        let app = seeded_router(dir.path());

        let (status, body) = post_command(
            app,
            r#"{"command":"create_event","event_name":"Kickoff","attendees":[]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "no_attendees_selected");
    }
}
