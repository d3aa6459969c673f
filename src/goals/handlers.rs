use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::error::OkrError;
use super::models::{
    Checkin, CheckinFields, KeyResult, KeyResultFields, Objective, ObjectiveFields,
    ObjectiveFilter, Review, ReviewComments,
};
use super::progress::TypeSummary;
use super::service::{CheckinView, ObjectiveDetail, ObjectiveView, OkrService};
use crate::auth::AuthenticatedUser;
use crate::core::shared::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitCheckinRequest {
    #[serde(flatten)]
    pub fields: CheckinFields,
    #[serde(default)]
    pub as_draft: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub objective_id: Uuid,
    #[serde(flatten)]
    pub comments: ReviewComments,
}

async fn run<T, F>(state: &AppState, f: F) -> Result<Json<T>, OkrError>
where
    F: FnOnce(OkrService) -> Result<T, OkrError> + Send + 'static,
    T: Send + 'static,
{
    let service = state.okr.clone();
    tokio::task::spawn_blocking(move || f(service))
        .await
        .map_err(|e| OkrError::Database(e.to_string()))?
        .map(Json)
}

pub async fn list_objectives(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Query(filter): Query<ObjectiveFilter>,
) -> Result<Json<Vec<ObjectiveView>>, OkrError> {
    run(&state, move |okr| okr.list_objectives(&filter)).await
}

pub async fn create_objective(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(mut req): Json<ObjectiveFields>,
) -> Result<Json<Objective>, OkrError> {
    req.id = None;
    run(&state, move |okr| okr.create_or_update_objective(&principal, req)).await
}

pub async fn get_objective(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(objective_id): Path<Uuid>,
) -> Result<Json<ObjectiveDetail>, OkrError> {
    run(&state, move |okr| okr.get_objective(objective_id)).await
}

pub async fn update_objective(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(objective_id): Path<Uuid>,
    Json(mut req): Json<ObjectiveFields>,
) -> Result<Json<Objective>, OkrError> {
    req.id = Some(objective_id);
    run(&state, move |okr| okr.create_or_update_objective(&principal, req)).await
}

pub async fn list_children(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(objective_id): Path<Uuid>,
) -> Result<Json<Vec<ObjectiveView>>, OkrError> {
    run(&state, move |okr| okr.list_children(objective_id)).await
}

pub async fn list_ancestors(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(objective_id): Path<Uuid>,
) -> Result<Json<Vec<Objective>>, OkrError> {
    run(&state, move |okr| okr.list_ancestors(objective_id)).await
}

pub async fn list_key_results(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(objective_id): Path<Uuid>,
) -> Result<Json<Vec<KeyResult>>, OkrError> {
    run(&state, move |okr| okr.list_key_results(objective_id)).await
}

pub async fn create_key_result(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(objective_id): Path<Uuid>,
    Json(req): Json<KeyResultFields>,
) -> Result<Json<KeyResult>, OkrError> {
    run(&state, move |okr| okr.add_key_result(&principal, objective_id, req)).await
}

pub async fn list_checkins(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(objective_id): Path<Uuid>,
) -> Result<Json<Vec<Checkin>>, OkrError> {
    run(&state, move |okr| okr.list_checkin_history(objective_id)).await
}

pub async fn submit_checkin(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(objective_id): Path<Uuid>,
    Json(req): Json<SubmitCheckinRequest>,
) -> Result<Json<Checkin>, OkrError> {
    run(&state, move |okr| {
        okr.submit_checkin(&principal, objective_id, req.fields, req.as_draft)
    })
    .await
}

pub async fn get_checkin(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(checkin_id): Path<Uuid>,
) -> Result<Json<CheckinView>, OkrError> {
    run(&state, move |okr| okr.get_checkin(checkin_id)).await
}

pub async fn get_review(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(checkin_id): Path<Uuid>,
) -> Result<Json<Option<Review>>, OkrError> {
    run(&state, move |okr| okr.get_review(checkin_id)).await
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(checkin_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<Json<Review>, OkrError> {
    run(&state, move |okr| {
        okr.create_review(&principal, checkin_id, req.objective_id, req.comments)
    })
    .await
}

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Query(filter): Query<ObjectiveFilter>,
) -> Result<Json<Vec<TypeSummary>>, OkrError> {
    run(&state, move |okr| okr.summarize_objectives(&filter)).await
}

pub fn configure_okr_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/okr/objectives", get(list_objectives).post(create_objective))
        .route("/api/okr/objectives/:id", get(get_objective).put(update_objective))
        .route("/api/okr/objectives/:id/children", get(list_children))
        .route("/api/okr/objectives/:id/ancestors", get(list_ancestors))
        .route(
            "/api/okr/objectives/:id/key-results",
            get(list_key_results).post(create_key_result),
        )
        .route(
            "/api/okr/objectives/:id/checkins",
            get(list_checkins).post(submit_checkin),
        )
        .route("/api/okr/checkins/:id", get(get_checkin))
        .route("/api/okr/checkins/:id/review", get(get_review).post(create_review))
        .route("/api/okr/summary", get(get_summary))
}
