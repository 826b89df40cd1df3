use super::{ok, ApiJson, ApiResult, SharedState};
use crate::events::{
  cancel_registration, create_event, delete_event, list_events, list_registrations, load_event,
  register_for_event, update_event,
};
use crate::models::{EventUpdate, EventView, NewEvent, NewRegistration, Registration};
use axum::{
  extract::{Path, Query, State},
  routing::{delete, get},
  Router,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct EventListQuery {
  #[serde(default)]
  pub upcoming: bool,
}

/// ---------------------------------------------------------------------------
/// Events
/// ---------------------------------------------------------------------------

/// GET /api/events?upcoming=true
pub async fn get_events(
  State(state): State<SharedState>,
  Query(query): Query<EventListQuery>,
) -> ApiResult<Vec<EventView>> {
  let events = list_events(&state.db, query.upcoming).await?;
  ok(events.into_iter().map(EventView::from).collect())
}

pub async fn post_event(
  State(state): State<SharedState>,
  ApiJson(payload): ApiJson<NewEvent>,
) -> ApiResult<EventView> {
  ok(create_event(&state.db, payload).await?.into())
}

pub async fn get_event(
  State(state): State<SharedState>,
  Path(id): Path<i64>,
) -> ApiResult<EventView> {
  ok(load_event(&state.db, id).await?.into())
}

pub async fn patch_event(
  State(state): State<SharedState>,
  Path(id): Path<i64>,
  ApiJson(payload): ApiJson<EventUpdate>,
) -> ApiResult<EventView> {
  ok(update_event(&state.db, id, payload).await?.into())
}

pub async fn remove_event(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<()> {
  ok(delete_event(&state.db, id).await?)
}

/// ---------------------------------------------------------------------------
/// Registrations
/// ---------------------------------------------------------------------------

pub async fn get_registrations(
  State(state): State<SharedState>,
  Path(id): Path<i64>,
) -> ApiResult<Vec<Registration>> {
  ok(list_registrations(&state.db, id).await?)
}

pub async fn post_registration(
  State(state): State<SharedState>,
  Path(id): Path<i64>,
  ApiJson(payload): ApiJson<NewRegistration>,
) -> ApiResult<Registration> {
  ok(register_for_event(&state.db, id, payload).await?)
}

pub async fn remove_registration(
  State(state): State<SharedState>,
  Path((id, registration_id)): Path<(i64, i64)>,
) -> ApiResult<()> {
  ok(cancel_registration(&state.db, id, registration_id).await?)
}

pub fn router() -> Router<SharedState> {
  Router::new()
    .route("/events", get(get_events).post(post_event))
    .route("/events/{id}", get(get_event).patch(patch_event).delete(remove_event))
    .route(
      "/events/{id}/registrations",
      get(get_registrations).post(post_registration),
    )
    .route(
      "/events/{id}/registrations/{registration_id}",
      delete(remove_registration),
    )
}
