use crate::server::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mission_core::activity_api::{self, ActivityFilter};
use mission_core::error::AppError;
use mission_core::model::{NewActivity, ScheduledTask};
use mission_core::search::{self, DEFAULT_SEARCH_LIMIT};
use mission_core::{dashboard_api, schedule_api};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;

/// HTTP face of [`AppError`]: validation problems are 400, the rest 500.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self(AppError::invalid_input(value.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidData(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0.message(), "request failed");
        }
        let body = json!({
            "error": self.0.message(),
            "code": self.0.code(),
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Runs store I/O on the blocking pool.
async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError(AppError::io(format!("worker task failed: {err}"))))
}

/// Empty query values count as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn parse_param<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, AppError> {
    match present(raw) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::invalid_input(format!("{name} must be a number"))),
        None => Ok(None),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivitiesQuery {
    limit: Option<String>,
    category: Option<String>,
    project: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivitiesQuery>,
) -> ApiResult<Response> {
    let filter = ActivityFilter {
        limit: parse_param("limit", query.limit)?,
        category: present(query.category),
        project: present(query.project),
        kind: present(query.kind),
    };
    let path = state.settings.activities_path();
    let page = blocking(move || activity_api::list_activities(&path, &filter)).await?;
    Ok(Json(page).into_response())
}

pub async fn record_activity(
    State(state): State<AppState>,
    payload: Result<Json<NewActivity>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload?;
    let path = state.settings.activities_path();
    let activity = blocking(move || activity_api::record_activity(&path, input)).await??;
    Ok(Json(json!({ "success": true, "activity": activity })).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksQuery {
    week_start_ms: Option<String>,
    enabled_only: Option<String>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TasksQuery>,
) -> ApiResult<Response> {
    let path = state.settings.tasks_path();
    let enabled_only = query.enabled_only.as_deref() == Some("true");

    match parse_param::<i64>("weekStartMs", query.week_start_ms)? {
        Some(week_start_ms) => {
            let week = blocking(move || schedule_api::occurrences_for_week(&path, week_start_ms)).await?;
            Ok(Json(week).into_response())
        }
        None => {
            let tasks = blocking(move || schedule_api::list_tasks(&path, enabled_only)).await?;
            Ok(Json(tasks).into_response())
        }
    }
}

pub async fn upsert_task(
    State(state): State<AppState>,
    payload: Result<Json<ScheduledTask>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(task) = payload?;
    let path = state.settings.tasks_path();
    let task = blocking(move || schedule_api::upsert_task(&path, task)).await??;
    Ok(Json(json!({ "success": true, "task": task })).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveTaskQuery {
    cron_id: Option<String>,
}

pub async fn remove_task(
    State(state): State<AppState>,
    Query(query): Query<RemoveTaskQuery>,
) -> ApiResult<Response> {
    let cron_id = present(query.cron_id).ok_or_else(|| AppError::invalid_input("cronId required"))?;
    let path = state.settings.tasks_path();
    blocking(move || schedule_api::remove_task(&path, &cron_id)).await??;
    Ok(Json(json!({ "success": true })).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    limit: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    let q = search::validate_query(query.q.as_deref())?;
    let limit = parse_param("limit", query.limit)?.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let results = search::search_all(&state.settings.search_sources(), &q, limit).await?;
    Ok(Json(results).into_response())
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Response> {
    let dashboard_path = state.settings.dashboard_path();
    let activities_path = state.settings.activities_path();
    let view = blocking(move || dashboard_api::load_dashboard(&dashboard_path, &activities_path)).await?;
    Ok(Json(view).into_response())
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
