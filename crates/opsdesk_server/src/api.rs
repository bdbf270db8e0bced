//! REST binding over the record stores.
//!
//! # Responsibility
//! - Map `/api/v1/incidents` and `/api/v1/runbooks` requests onto
//!   [`IncidentStore`] / [`RunbookStore`] calls.
//! - Validate and normalize request input before any store call.
//!
//! # Invariants
//! - Handlers hold no record state; every request reads through the store.
//! - `DELETE` answers `204` whether or not the record existed.
//! - Ids that do not parse as UUIDs are reported as not found.
//! - Store calls block on SQLite or HTTP, so they run on the blocking pool.

use crate::error::ApiError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use opsdesk_core::{
    parse_choice, EmbeddedStores, Incident, IncidentFilter, IncidentPatch, IncidentStore,
    NewIncident, NewNote, NewRunbook, RecordKind, Runbook, RunbookFilter, RunbookPatch,
    RunbookStore, StateRepository, StoreError,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/v1";

type ApiResult<T> = Result<T, ApiError>;

/// Stores shared by all handlers.
#[derive(Clone)]
pub struct ApiState {
    incidents: Arc<dyn IncidentStore + Send + Sync>,
    runbooks: Arc<dyn RunbookStore + Send + Sync>,
}

impl ApiState {
    pub fn new(
        incidents: impl IncidentStore + Send + Sync + 'static,
        runbooks: impl RunbookStore + Send + Sync + 'static,
    ) -> Self {
        Self {
            incidents: Arc::new(incidents),
            runbooks: Arc::new(runbooks),
        }
    }

    pub fn embedded<R: StateRepository + 'static>(stores: EmbeddedStores<R>) -> Self {
        let EmbeddedStores {
            incidents,
            runbooks,
        } = stores;
        Self::new(incidents, runbooks)
    }
}

/// Builds the full application router.
pub fn router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/incidents", get(list_incidents).post(create_incident))
        .route(
            "/incidents/:id",
            get(get_incident).put(update_incident).delete(delete_incident),
        )
        .route("/incidents/:id/notes", post(add_note))
        .route("/incidents/:id/close", post(close_incident))
        .route("/incidents/:id/reopen", post(reopen_incident))
        .route("/runbooks", get(list_runbooks).post(create_runbook))
        .route(
            "/runbooks/:id",
            get(get_runbook).put(update_runbook).delete(delete_runbook),
        );

    Router::new()
        .route("/healthz", get(healthz))
        .nest(API_PREFIX, api)
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `?q=&status=&severity=&service=`; `All` or blank disables a filter.
#[derive(Debug, Default, Deserialize)]
pub struct IncidentQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub service: Option<String>,
}

impl IncidentQuery {
    fn into_filter(self) -> ApiResult<IncidentFilter> {
        Ok(IncidentFilter {
            term: self.q,
            status: parse_choice(self.status.as_deref())?,
            severity: parse_choice(self.severity.as_deref())?,
            service: non_blank(self.service),
        })
    }
}

/// `?q=&tag=`
#[derive(Debug, Default, Deserialize)]
pub struct RunbookQuery {
    pub q: Option<String>,
    pub tag: Option<String>,
}

impl RunbookQuery {
    fn into_filter(self) -> RunbookFilter {
        RunbookFilter {
            term: self.q,
            tag: non_blank(self.tag),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_id(raw: &str, kind: RecordKind) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::NotFound(kind))
}

/// Runs a synchronous store call on tokio's blocking pool.
async fn run_blocking<T, F>(call: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(call).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(err) => Err(ApiError::TaskFailed(err.to_string())),
    }
}

impl ApiState {
    async fn with_incidents<T, F>(&self, call: F) -> ApiResult<T>
    where
        F: FnOnce(&dyn IncidentStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let incidents = Arc::clone(&self.incidents);
        run_blocking(move || call(incidents.as_ref())).await
    }

    async fn with_runbooks<T, F>(&self, call: F) -> ApiResult<T>
    where
        F: FnOnce(&dyn RunbookStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let runbooks = Arc::clone(&self.runbooks);
        run_blocking(move || call(runbooks.as_ref())).await
    }
}

async fn list_incidents(
    State(state): State<ApiState>,
    query: Result<Query<IncidentQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Incident>>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let found = state
        .with_incidents(move |store| store.search(&filter))
        .await?;
    Ok(Json(found))
}

async fn get_incident(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Incident>> {
    let id = parse_id(&raw_id, RecordKind::Incident)?;
    Ok(Json(state.with_incidents(move |store| store.get(id)).await?))
}

async fn create_incident(
    State(state): State<ApiState>,
    body: Result<Json<NewIncident>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let input = input.normalized();
    input.validate()?;
    let created = state
        .with_incidents(move |store| store.create(input))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_incident(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
    body: Result<Json<IncidentPatch>, JsonRejection>,
) -> ApiResult<Json<Incident>> {
    let id = parse_id(&raw_id, RecordKind::Incident)?;
    let Json(patch) = body?;
    let patch = patch.normalized();
    patch.validate()?;
    let updated = state
        .with_incidents(move |store| store.update(id, patch))
        .await?;
    Ok(Json(updated))
}

async fn add_note(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
    body: Result<Json<NewNote>, JsonRejection>,
) -> ApiResult<Json<Incident>> {
    let id = parse_id(&raw_id, RecordKind::Incident)?;
    let Json(note) = body?;
    let note = note.normalized();
    note.validate()?;
    let noted = state
        .with_incidents(move |store| store.add_note(id, note))
        .await?;
    Ok(Json(noted))
}

async fn close_incident(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Incident>> {
    let id = parse_id(&raw_id, RecordKind::Incident)?;
    Ok(Json(state.with_incidents(move |store| store.close(id)).await?))
}

async fn reopen_incident(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Incident>> {
    let id = parse_id(&raw_id, RecordKind::Incident)?;
    Ok(Json(state.with_incidents(move |store| store.reopen(id)).await?))
}

async fn delete_incident(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> ApiResult<StatusCode> {
    if let Ok(id) = parse_id(&raw_id, RecordKind::Incident) {
        state.with_incidents(move |store| store.delete(id)).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_runbooks(
    State(state): State<ApiState>,
    query: Result<Query<RunbookQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Runbook>>> {
    let Query(query) = query?;
    let filter = query.into_filter();
    let found = state
        .with_runbooks(move |store| store.search(&filter))
        .await?;
    Ok(Json(found))
}

async fn get_runbook(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Runbook>> {
    let id = parse_id(&raw_id, RecordKind::Runbook)?;
    Ok(Json(state.with_runbooks(move |store| store.get(id)).await?))
}

async fn create_runbook(
    State(state): State<ApiState>,
    body: Result<Json<NewRunbook>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let input = input.normalized();
    input.validate()?;
    let created = state
        .with_runbooks(move |store| store.create(input))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_runbook(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
    body: Result<Json<RunbookPatch>, JsonRejection>,
) -> ApiResult<Json<Runbook>> {
    let id = parse_id(&raw_id, RecordKind::Runbook)?;
    let Json(patch) = body?;
    let patch = patch.normalized();
    patch.validate()?;
    let updated = state
        .with_runbooks(move |store| store.update(id, patch))
        .await?;
    Ok(Json(updated))
}

async fn delete_runbook(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> ApiResult<StatusCode> {
    if let Ok(id) = parse_id(&raw_id, RecordKind::Runbook) {
        state.with_runbooks(move |store| store.delete(id)).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
