//! Handlers for inbox and notification-flag endpoints.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use herald_core::{notification::Notification, store::InboxQuery};
use herald_notify::NotifyStore;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Query parameters accepted by `GET /inbox`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub partner_id:   Uuid,
  #[serde(default)]
  pub unread_only:  bool,
  #[serde(default)]
  pub starred_only: bool,
  pub limit:        Option<usize>,
}

/// `GET /inbox?partner_id=...` — newest notifications first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: NotifyStore,
  <S as NotifyStore>::Err: Into<herald_core::Error>,
{
  let query = InboxQuery {
    partner_id:   params.partner_id,
    unread_only:  params.unread_only,
    starred_only: params.starred_only,
    limit:        params.limit,
  };
  let notifications =
    state.store.inbox(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(notifications))
}

#[derive(Debug, Deserialize)]
pub struct ReadBody {
  pub is_read: bool,
}

/// `POST /notifications/:id/read`
pub async fn set_read<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ReadBody>,
) -> Result<StatusCode, ApiError>
where
  S: NotifyStore,
  <S as NotifyStore>::Err: Into<herald_core::Error>,
{
  state
    .store
    .set_read(id, body.is_read)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StarBody {
  pub starred: bool,
}

/// `POST /notifications/:id/star`
pub async fn set_starred<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StarBody>,
) -> Result<StatusCode, ApiError>
where
  S: NotifyStore,
  <S as NotifyStore>::Err: Into<herald_core::Error>,
{
  state
    .store
    .set_starred(id, body.starred)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
