//! HTTP handlers for training programs and their phases

use axum::{
    extract::{Path, State},
    routing::{get, patch, post, put},
    Router,
};
use serde::Deserialize;

use super::{ok, ApiJson, ApiResult, SharedState};
use crate::models::{NewProgram, PhaseUpdate, ProgramUpdate, TrainingProgram};
use crate::phases::PhaseInput;
use crate::programs::{
    activate_program, add_phase, advance_week, create_program, deactivate_programs,
    delete_program, load_active_program, load_all_programs, load_program, remove_phase,
    reorder_phases, set_current_week, update_phase, update_program,
};

#[derive(Debug, Deserialize)]
pub struct CurrentWeekRequest {
    pub current_week: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub phase_ids: Vec<String>,
}

/// GET /api/programs
pub async fn list_programs(State(state): State<SharedState>) -> ApiResult<Vec<TrainingProgram>> {
    ok(load_all_programs(&state.db).await?)
}

/// POST /api/programs
pub async fn create(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<NewProgram>,
) -> ApiResult<TrainingProgram> {
    ok(create_program(&state.db, payload).await?)
}

/// GET /api/programs/{id}
pub async fn get_program(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<TrainingProgram> {
    ok(load_program(&state.db, id).await?)
}

/// PATCH /api/programs/{id}
pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ProgramUpdate>,
) -> ApiResult<TrainingProgram> {
    ok(update_program(&state.db, id, payload).await?)
}

/// DELETE /api/programs/{id}
pub async fn remove(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<()> {
    ok(delete_program(&state.db, id).await?)
}

/// GET /api/programs/active
/// `data` is null when no program is active
pub async fn get_active(
    State(state): State<SharedState>,
) -> ApiResult<Option<TrainingProgram>> {
    ok(load_active_program(&state.db).await?)
}

/// DELETE /api/programs/active
pub async fn clear_active(State(state): State<SharedState>) -> ApiResult<()> {
    ok(deactivate_programs(&state.db).await?)
}

/// POST /api/programs/{id}/activate
pub async fn activate(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<TrainingProgram> {
    ok(activate_program(&state.db, id).await?)
}

/// PUT /api/programs/{id}/current-week
pub async fn put_current_week(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<CurrentWeekRequest>,
) -> ApiResult<TrainingProgram> {
    ok(set_current_week(&state.db, id, payload.current_week).await?)
}

/// POST /api/programs/{id}/advance-week
pub async fn post_advance_week(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<TrainingProgram> {
    ok(advance_week(&state.db, id).await?)
}

/// POST /api/programs/{id}/phases
pub async fn post_phase(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<PhaseInput>,
) -> ApiResult<TrainingProgram> {
    ok(add_phase(&state.db, id, payload).await?)
}

/// PATCH /api/programs/{id}/phases/{phase_id}
pub async fn patch_phase(
    State(state): State<SharedState>,
    Path((id, phase_id)): Path<(i64, String)>,
    ApiJson(payload): ApiJson<PhaseUpdate>,
) -> ApiResult<TrainingProgram> {
    ok(update_phase(&state.db, id, &phase_id, payload).await?)
}

/// DELETE /api/programs/{id}/phases/{phase_id}
pub async fn delete_phase(
    State(state): State<SharedState>,
    Path((id, phase_id)): Path<(i64, String)>,
) -> ApiResult<TrainingProgram> {
    ok(remove_phase(&state.db, id, &phase_id).await?)
}

/// PUT /api/programs/{id}/phases
/// Replaces the phase order; `phase_ids` must list every phase once
pub async fn put_phase_order(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ReorderRequest>,
) -> ApiResult<TrainingProgram> {
    ok(reorder_phases(&state.db, id, &payload.phase_ids).await?)
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/programs", get(list_programs).post(create))
        .route("/programs/active", get(get_active).delete(clear_active))
        .route("/programs/{id}", get(get_program).patch(update).delete(remove))
        .route("/programs/{id}/activate", post(activate))
        .route("/programs/{id}/current-week", put(put_current_week))
        .route("/programs/{id}/advance-week", post(post_advance_week))
        .route("/programs/{id}/phases", post(post_phase).put(put_phase_order))
        .route(
            "/programs/{id}/phases/{phase_id}",
            patch(patch_phase).delete(delete_phase),
        )
}
